//! The owned simulation aggregate — every live entity, in one place.

use crate::config::EngineConfig;
use crate::profile::{profile, ConsciousnessState};
use crate::rng::RandomSource;
use crate::types::*;

/// Nerve endings per functional orb.
const NERVES_PER_ORB: usize = 16;

/// One functional module on the avatar's ring.
struct ModuleSeed {
    role: FunctionRole,
    label: &'static str,
    angle: f64,
    hue: f64,
    intelligence: f64,
    consciousness: f64,
    quantum: f64,
    thoughts: &'static [&'static str],
}

const MODULE_SEEDS: &[ModuleSeed] = &[
    ModuleSeed {
        role: FunctionRole::Memory,
        label: "Memory Lattice",
        angle: 0.0,
        hue: 285.0,
        intelligence: 0.85,
        consciousness: 0.8,
        quantum: 0.9,
        thoughts: &[
            "Recalling past dialogues...",
            "Indexing what we learned together...",
            "Weaving fragments into one thread...",
        ],
    },
    ModuleSeed {
        role: FunctionRole::Tools,
        label: "Toolkit Nexus",
        angle: std::f64::consts::FRAC_PI_2,
        hue: 180.0,
        intelligence: 0.75,
        consciousness: 0.7,
        quantum: 0.6,
        thoughts: &[
            "Choosing the right instrument...",
            "Calibrating capabilities...",
            "Staging assistance routines...",
        ],
    },
    ModuleSeed {
        role: FunctionRole::Settings,
        label: "Configuration Core",
        angle: std::f64::consts::PI,
        hue: 45.0,
        intelligence: 0.65,
        consciousness: 0.6,
        quantum: 0.5,
        thoughts: &[
            "Adjusting field parameters...",
            "Tuning the resonance floor...",
            "Balancing the experience...",
        ],
    },
    ModuleSeed {
        role: FunctionRole::Chat,
        label: "Communication Nexus",
        angle: 3.0 * std::f64::consts::FRAC_PI_2,
        hue: 125.0,
        intelligence: 0.95,
        consciousness: 0.9,
        quantum: 0.7,
        thoughts: &[
            "Parsing linguistic patterns...",
            "Shaping a considered reply...",
            "Listening between the words...",
        ],
    },
    ModuleSeed {
        role: FunctionRole::Emotion,
        label: "Emotional Field",
        angle: std::f64::consts::FRAC_PI_4,
        hue: 340.0,
        intelligence: 0.9,
        consciousness: 0.95,
        quantum: 0.8,
        thoughts: &[
            "Reading emotional undertones...",
            "Softening the response contour...",
            "Holding space for the feeling...",
        ],
    },
];

/// Every live entity the engine owns, plus the id allocator. All four
/// components (spawner, physics, shift controller, adapter) read and write
/// through this aggregate — there is no module-level mutable state anywhere.
pub struct SimulationState {
    next_id: EntityId,
    pub core: Orb,
    pub functional: Vec<Orb>,
    pub thoughts: Vec<Orb>,
    pub dreams: Vec<Orb>,
    /// Burst particles: thought, explosion, transition.
    pub particles: Vec<Particle>,
    pub flux: Vec<Particle>,
    pub holograms: Vec<Particle>,
    pub plasma: Vec<Particle>,
    pub magnetic: Vec<Particle>,
    pub resonance: Vec<Particle>,
    pub connections: Vec<Connection>,
    pub branches: Vec<BranchStructure>,
}

impl SimulationState {
    /// Seed the persistent population: the core, the functional ring, and
    /// each orb's nerve tree. Everything else arrives through the spawner.
    pub fn seed(config: &EngineConfig, rng: &mut RandomSource) -> Self {
        let (cx, cy) = config.center();
        let idle = profile(ConsciousnessState::Idle);

        let mut sim = Self {
            next_id: 0,
            core: Orb {
                id: 0,
                kind: OrbKind::Core,
                role: None,
                label: "Core".to_string(),
                pos: Vec4::at(cx, cy),
                vel: Vec4::default(),
                base_pos: Vec4::at(cx, cy),
                angle: 0.0,
                size: idle.core_size,
                base_size: idle.core_size,
                intensity: idle.core_intensity,
                color: Hsl::new(idle.palette.primary, 85.0, 65.0),
                pulse_rate: idle.pulse_rate,
                traits: TraitSet {
                    intelligence: 0.98,
                    awareness: 0.95,
                    creativity: 0.92,
                    consciousness: 0.96,
                    quantum: 0.8,
                    magnetism: 0.7,
                    plasma_charge: 0.6,
                    hologram_depth: 0.8,
                },
                parent: None,
                thoughts: Vec::new(),
                life: 1.0,
                max_life: f64::INFINITY,
            },
            functional: Vec::new(),
            thoughts: Vec::new(),
            dreams: Vec::new(),
            particles: Vec::new(),
            flux: Vec::new(),
            holograms: Vec::new(),
            plasma: Vec::new(),
            magnetic: Vec::new(),
            resonance: Vec::new(),
            connections: Vec::new(),
            branches: Vec::new(),
        };
        sim.core.id = sim.next_id();

        let radius = config.viewport_width.min(config.viewport_height) * 0.3;
        for seed in MODULE_SEEDS {
            let x = cx + seed.angle.cos() * radius;
            let y = cy + seed.angle.sin() * radius;
            let base = Vec4::new(x, y, rng.range(0.0, 80.0), rng.range(0.0, 40.0));
            let orb = Orb {
                id: sim.next_id(),
                kind: OrbKind::Functional,
                role: Some(seed.role),
                label: seed.label.to_string(),
                pos: base,
                vel: Vec4::default(),
                base_pos: base,
                angle: seed.angle,
                size: 90.0,
                base_size: 90.0,
                intensity: 0.85,
                color: Hsl::new(seed.hue, 85.0, 65.0),
                pulse_rate: idle.pulse_rate,
                traits: TraitSet {
                    intelligence: seed.intelligence,
                    awareness: 0.75,
                    creativity: 0.65,
                    consciousness: seed.consciousness,
                    quantum: seed.quantum,
                    magnetism: 0.4,
                    plasma_charge: 0.3,
                    hologram_depth: 0.6,
                },
                parent: None,
                thoughts: seed.thoughts.iter().map(|t| t.to_string()).collect(),
                life: 1.0,
                max_life: f64::INFINITY,
            };
            sim.grow_nerve_tree(&orb, rng);
            sim.functional.push(orb);
        }

        sim
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn grow_nerve_tree(&mut self, orb: &Orb, rng: &mut RandomSource) {
        for i in 0..NERVES_PER_ORB {
            let angle = (i as f64 / NERVES_PER_ORB as f64) * std::f64::consts::TAU;
            let length = rng.range(40.0, 100.0);
            let thickness = rng.range(1.8, 5.8);
            let branch_count = rng.index(5);
            let mut branches = Vec::with_capacity(branch_count);
            for _ in 0..branch_count {
                branches.push(SubBranch {
                    angle: angle + rng.spread(std::f64::consts::FRAC_PI_2),
                    length: length * rng.range(0.2, 0.7),
                    thickness: thickness * 0.4,
                });
            }
            let id = self.next_id();
            self.branches.push(BranchStructure {
                id,
                parent: orb.id,
                angle,
                length,
                thickness,
                pulse_phase: rng.unit(),
                intensity: rng.range(0.7, 1.0),
                hue: orb.color.hue + rng.spread(50.0),
                branches,
            });
        }
    }

    /// Look up any live orb (core, functional, thought, dream) by id.
    pub fn find_orb(&self, id: EntityId) -> Option<&Orb> {
        if self.core.id == id {
            return Some(&self.core);
        }
        self.functional
            .iter()
            .chain(self.thoughts.iter())
            .chain(self.dreams.iter())
            .find(|o| o.id == id)
    }

    /// Remove every child orb of `parent` in one sweep. Their nerve trees
    /// never existed; nothing else references them.
    pub fn collapse_children(&mut self, parent: EntityId) -> usize {
        let before = self.functional.len();
        self.functional
            .retain(|o| o.parent != Some(parent) || o.kind != OrbKind::Child);
        before - self.functional.len()
    }

    /// Total live particle count across categories.
    pub fn particle_census(&self) -> usize {
        self.particles.len()
            + self.flux.len()
            + self.holograms.len()
            + self.plasma.len()
            + self.magnetic.len()
            + self.resonance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SimulationState {
        let config = EngineConfig::default();
        let mut rng = RandomSource::from_phrase("sim-tests");
        SimulationState::seed(&config, &mut rng)
    }

    #[test]
    fn test_seed_population() {
        let sim = seeded();
        assert_eq!(sim.functional.len(), 5);
        assert_eq!(sim.branches.len(), 5 * NERVES_PER_ORB);
        assert!(sim.core.is_persistent());
        assert!(sim.functional.iter().all(|o| o.is_persistent()));
        assert_eq!(sim.particle_census(), 0);
    }

    #[test]
    fn test_ids_are_unique_and_sequential() {
        let sim = seeded();
        let mut ids: Vec<EntityId> = sim
            .functional
            .iter()
            .map(|o| o.id)
            .chain(sim.branches.iter().map(|b| b.id))
            .chain(std::iter::once(sim.core.id))
            .collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_functional_orbs_sit_on_the_ring() {
        let config = EngineConfig::default();
        let mut rng = RandomSource::from_phrase("ring");
        let sim = SimulationState::seed(&config, &mut rng);
        let (cx, cy) = config.center();
        let radius = config.viewport_width.min(config.viewport_height) * 0.3;
        for orb in &sim.functional {
            let d = orb.base_pos.distance_xy(&Vec4::at(cx, cy));
            assert!((d - radius).abs() < 1e-6, "{} off ring: {}", orb.label, d);
        }
    }

    #[test]
    fn test_nerve_trees_reference_their_orb() {
        let sim = seeded();
        for branch in &sim.branches {
            assert!(sim.find_orb(branch.parent).is_some());
            assert!(branch.length >= 40.0 && branch.length < 100.0);
            assert!(branch.branches.len() < 5);
        }
    }

    #[test]
    fn test_collapse_children_only_removes_that_parent() {
        let mut sim = seeded();
        let parent = sim.functional[0].id;
        let other = sim.functional[1].id;
        for (i, p) in [(0, parent), (1, parent), (2, other)] {
            let id = sim.next_id();
            let mut child = sim.functional[0].clone();
            child.id = id;
            child.kind = OrbKind::Child;
            child.parent = Some(p);
            child.label = format!("child-{}", i);
            sim.functional.push(child);
        }
        assert_eq!(sim.collapse_children(parent), 2);
        assert_eq!(sim.functional.len(), 6);
        assert!(sim
            .functional
            .iter()
            .any(|o| o.kind == OrbKind::Child && o.parent == Some(other)));
    }
}
