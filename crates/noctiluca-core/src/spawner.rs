//! Per-tick stochastic entity creation, gated by the active profile's rates.

use crate::config::EngineConfig;
use crate::profile::{ConsciousnessState, StateProfile};
use crate::rng::RandomSource;
use crate::shift::Sample;
use crate::sim::SimulationState;
use crate::types::*;

// ── Live-count caps (oldest-first eviction at the cap) ──

pub const THOUGHT_ORB_CAP: usize = 25;
pub const DREAM_ORB_CAP: usize = 15;
pub const FLUX_CAP: usize = 150;
pub const HOLOGRAM_CAP: usize = 80;
pub const PLASMA_CAP: usize = 20;
pub const CONNECTION_CAP: usize = 60;
pub const RESONANCE_CAP: usize = 120;
pub const MAGNETIC_CAP: usize = 15;
pub const BURST_CAP: usize = 400;

// Per-second pacing constants: per-tick probability = profile rate * pace * dt.
const THOUGHT_PACE: f64 = 0.4;
const FLUX_PACE: f64 = 8.0;
const HOLOGRAM_PACE: f64 = 6.0;
const PLASMA_PACE: f64 = 7.0;
const CONNECTION_PACE: f64 = 54.0;
const DREAM_PACE: f64 = 0.5;

/// Short thought fragments shown inside thought orbs.
const THOUGHT_FRAGMENTS: &[&str] = &[
    "Tracing resonance across the lattice...",
    "Folding possibility space...",
    "Aligning memory constellations...",
    "Listening to the field hum...",
    "Sketching an answer in light...",
    "Letting patterns settle...",
    "Following a thread of association...",
    "Balancing warmth and precision...",
    "Mapping the question's edges...",
    "Surfacing a half-formed idea...",
    "Braiding context into form...",
    "Waiting for the signal to clear...",
];

/// Evict oldest entries until there is room for one more under `cap`.
fn make_room<T>(items: &mut Vec<T>, cap: usize) {
    while items.len() >= cap {
        items.remove(0);
    }
}

/// One spawner pass. `target` is the profile whose rates apply this tick —
/// during a shift that is the destination profile with its rates scaled by
/// `progress` (1.0 once settled). `state` is the committed state, which
/// alone decides whether dream orbs condense.
#[allow(clippy::too_many_arguments)]
pub fn run(
    sim: &mut SimulationState,
    rng: &mut RandomSource,
    config: &EngineConfig,
    target: &StateProfile,
    progress: f64,
    state: ConsciousnessState,
    now: f64,
    dt: f64,
) {
    let scale = progress.clamp(0.0, 1.0) * dt;

    if rng.chance(target.thought_activity * THOUGHT_PACE * scale) {
        spawn_thought_orb(sim, rng, target);
    }
    if rng.chance(target.quantum_flux * FLUX_PACE * scale) {
        spawn_flux(sim, rng, config, target);
    }
    if rng.chance(target.effects.hologram * HOLOGRAM_PACE * scale) {
        spawn_hologram(sim, rng, target, now);
    }
    if rng.chance(target.plasma_energy * PLASMA_PACE * scale) {
        spawn_plasma(sim, rng, target);
    }
    if rng.chance(target.connection_opacity * CONNECTION_PACE * scale) {
        spawn_connection(sim, rng, target);
    }
    if state == ConsciousnessState::Dreaming && rng.chance(DREAM_PACE * dt) {
        spawn_dream_orb(sim, rng, config);
    }
}

// ── Continuous categories ──

fn spawn_thought_orb(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile) {
    make_room(&mut sim.thoughts, THOUGHT_ORB_CAP);
    let core = sim.core.pos;
    let fragment = rng
        .pick(THOUGHT_FRAGMENTS)
        .copied()
        .unwrap_or_default()
        .to_string();
    let id = sim.next_id();
    sim.thoughts.push(Orb {
        id,
        kind: OrbKind::Thought,
        role: None,
        label: String::new(),
        pos: Vec4::new(
            core.x + rng.spread(500.0),
            core.y + rng.spread(500.0),
            rng.range(0.0, 120.0),
            rng.range(0.0, 60.0),
        ),
        vel: Vec4::new(
            rng.spread(120.0 * p.particle_speed),
            rng.spread(120.0 * p.particle_speed),
            rng.spread(60.0),
            rng.spread(30.0),
        ),
        base_pos: core,
        angle: rng.range(0.0, std::f64::consts::TAU),
        size: rng.range(18.0, 53.0),
        base_size: 0.0,
        intensity: rng.range(0.4, 1.0),
        color: Hsl::new(p.palette.quantum + rng.spread(40.0), 85.0, 70.0),
        pulse_rate: p.pulse_rate,
        traits: TraitSet {
            intelligence: rng.range(0.4, 0.9),
            consciousness: rng.range(0.6, 1.0),
            quantum: p.quantum_flux,
            hologram_depth: p.effects.hologram,
            ..TraitSet::default()
        },
        parent: None,
        thoughts: vec![fragment],
        life: 1.0,
        max_life: rng.range(3.0, 10.0),
    });
    let last = sim.thoughts.last_mut().expect("just pushed");
    last.base_size = last.size;
}

fn spawn_flux(
    sim: &mut SimulationState,
    rng: &mut RandomSource,
    config: &EngineConfig,
    p: &StateProfile,
) {
    make_room(&mut sim.flux, FLUX_CAP);
    let size = rng.range(1.0, 7.0);
    let id = sim.next_id();
    sim.flux.push(Particle {
        id,
        kind: ParticleKind::QuantumFlux,
        pos: Vec4::new(
            rng.range(0.0, config.viewport_width),
            rng.range(0.0, config.viewport_height),
            rng.range(0.0, 200.0),
            rng.range(0.0, 100.0),
        ),
        vel: Vec4::new(
            rng.spread(120.0 * p.particle_speed),
            rng.spread(120.0 * p.particle_speed),
            rng.spread(120.0),
            rng.spread(60.0),
        ),
        size,
        base_size: size,
        intensity: p.quantum_flux,
        color: Hsl::new(
            p.palette.quantum + rng.spread(80.0),
            rng.range(80.0, 100.0),
            rng.range(60.0, 90.0),
        ),
        life: 1.0,
        max_life: rng.range(4.0, 12.0),
    });
}

fn spawn_hologram(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile, now: f64) {
    make_room(&mut sim.holograms, HOLOGRAM_CAP);
    let core = sim.core.pos;
    let size = rng.range(2.0, 10.0);
    let layers = 2 + rng.index(5) as u32;
    let id = sim.next_id();
    sim.holograms.push(Particle {
        id,
        kind: ParticleKind::Hologram { layers },
        pos: Vec4::new(
            core.x + rng.spread(300.0),
            core.y + rng.spread(300.0),
            rng.range(0.0, 150.0),
            (now * 5.0).sin() * 60.0,
        ),
        vel: Vec4::default(),
        size,
        base_size: size,
        intensity: p.effects.hologram,
        color: Hsl::new(p.palette.primary + 60.0, 70.0, 80.0),
        life: 1.0,
        max_life: rng.range(3.0, 8.0),
    });
}

fn spawn_plasma(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile) {
    make_room(&mut sim.plasma, PLASMA_CAP);
    let core = sim.core.pos;
    let end = Vec4::at(core.x + rng.spread(400.0), core.y + rng.spread(400.0));
    let thickness = rng.range(2.0, 8.0);
    let id = sim.next_id();
    sim.plasma.push(Particle {
        id,
        kind: ParticleKind::PlasmaStream { end, thickness },
        pos: core,
        vel: Vec4::default(),
        size: thickness,
        base_size: thickness,
        intensity: p.plasma_energy * rng.range(0.8, 1.0),
        color: Hsl::new(p.palette.plasma, 95.0, 70.0),
        life: 1.0,
        max_life: rng.range(2.0, 6.0),
    });
}

fn spawn_connection(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile) {
    if sim.functional.is_empty() {
        return;
    }
    // Pick two distinct endpoints from the functional ring plus the core.
    let pool = sim.functional.len() + 1;
    let a = rng.index(pool);
    let b = rng.index(pool);
    if a == b {
        return;
    }
    let endpoint = |sim: &SimulationState, i: usize| -> (EntityId, Vec4, Hsl, TraitSet) {
        if i == 0 {
            (sim.core.id, sim.core.pos, sim.core.color, sim.core.traits)
        } else {
            let o = &sim.functional[i - 1];
            (o.id, o.pos, o.color, o.traits)
        }
    };
    let (from, from_pos, from_color, from_traits) = endpoint(sim, a);
    let (to, to_pos, to_color, to_traits) = endpoint(sim, b);

    make_room(&mut sim.connections, CONNECTION_CAP);
    let id = sim.next_id();
    sim.connections.push(Connection {
        id,
        from,
        to,
        from_pos,
        to_pos,
        color: Hsl::new((from_color.hue + to_color.hue) / 2.0, 85.0, 70.0),
        opacity: p.connection_opacity,
        thickness: 1.5 + p.nerve_intensity * 3.0,
        pulse_speed: p.pulse_rate,
        intelligence: (from_traits.intelligence + to_traits.intelligence) / 2.0,
        consciousness: (from_traits.consciousness + to_traits.consciousness) / 2.0,
        life: 1.0,
        duration: rng.range(2.5, 6.5),
    });
}

fn spawn_dream_orb(sim: &mut SimulationState, rng: &mut RandomSource, config: &EngineConfig) {
    make_room(&mut sim.dreams, DREAM_ORB_CAP);
    let size = rng.range(20.0, 80.0);
    let pos = Vec4::new(
        rng.range(0.0, config.viewport_width),
        rng.range(0.0, config.viewport_height),
        rng.range(0.0, 100.0),
        rng.range(0.0, 50.0),
    );
    let id = sim.next_id();
    sim.dreams.push(Orb {
        id,
        kind: OrbKind::Dream,
        role: None,
        label: String::new(),
        pos,
        vel: Vec4::new(rng.spread(30.0), rng.spread(30.0), 0.0, 0.0),
        base_pos: pos,
        angle: rng.range(0.0, std::f64::consts::TAU),
        size,
        base_size: size,
        intensity: rng.range(0.3, 0.7),
        color: Hsl::new(rng.range(0.0, 360.0), 70.0, 60.0),
        pulse_rate: 0.25,
        traits: TraitSet::default(),
        parent: None,
        thoughts: vec!["Dream fragment...".to_string()],
        life: 1.0,
        max_life: rng.range(5.0, 15.0),
    });
}

// ── Discrete bursts (invoked by the engine on events) ──

/// ~30 particles swirling near the core while a query is in flight.
pub fn thinking_burst(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile) {
    let core = sim.core.pos;
    for _ in 0..30 {
        make_room(&mut sim.particles, BURST_CAP);
        let id = sim.next_id();
        sim.particles.push(Particle {
            id,
            kind: ParticleKind::Thought,
            pos: Vec4::new(
                core.x + rng.spread(200.0),
                core.y + rng.spread(200.0),
                rng.range(0.0, 100.0),
                0.0,
            ),
            vel: Vec4::new(rng.spread(360.0), rng.spread(360.0), rng.spread(240.0), 0.0),
            size: 6.0,
            base_size: 6.0,
            intensity: p.thought_activity,
            color: Hsl::new(p.palette.accent, 90.0, 70.0),
            life: 1.0,
            max_life: 3.0,
        });
    }
}

/// 12-particle radial explosion at an activated orb.
pub fn explosion_burst(sim: &mut SimulationState, rng: &mut RandomSource, at: Vec4, color: Hsl, intensity: f64) {
    for i in 0..12 {
        make_room(&mut sim.particles, BURST_CAP);
        let angle = (i as f64 / 12.0) * std::f64::consts::TAU;
        let id = sim.next_id();
        sim.particles.push(Particle {
            id,
            kind: ParticleKind::Explosion,
            pos: at,
            vel: Vec4::new(angle.cos() * 360.0, angle.sin() * 360.0, rng.spread(300.0), 0.0),
            size: 4.0,
            base_size: 4.0,
            intensity,
            color,
            life: 1.0,
            max_life: 2.0,
        });
    }
}

/// Double-spiral burst announcing an accepted state shift.
pub fn transition_burst(sim: &mut SimulationState, rng: &mut RandomSource, p: &StateProfile) {
    let core = sim.core.pos;
    for i in 0..60 {
        make_room(&mut sim.particles, BURST_CAP);
        let angle = (i as f64 / 60.0) * std::f64::consts::TAU * 2.0;
        let radius = 250.0 + rng.range(0.0, 400.0);
        let size = rng.range(3.0, 15.0);
        let id = sim.next_id();
        sim.particles.push(Particle {
            id,
            kind: ParticleKind::TransitionBurst,
            pos: Vec4::new(
                core.x + angle.cos() * radius,
                core.y + angle.sin() * radius,
                rng.range(0.0, 300.0),
                (angle * 3.0).sin() * 100.0,
            ),
            vel: Vec4::new(
                angle.cos() * -180.0 + rng.spread(360.0),
                angle.sin() * -180.0 + rng.spread(360.0),
                rng.spread(240.0),
                rng.spread(120.0),
            ),
            size,
            base_size: size,
            intensity: p.core_intensity,
            color: Hsl::new(
                p.palette.primary + rng.spread(60.0),
                rng.range(85.0, 100.0),
                rng.range(65.0, 90.0),
            ),
            life: 1.0,
            max_life: rng.range(4.0, 10.0),
        });
    }
}

/// Trail-bearing particle anchored near the pointer.
pub fn resonance_particle(
    sim: &mut SimulationState,
    rng: &mut RandomSource,
    x: f64,
    y: f64,
    resonance: f64,
    sample: &Sample,
) {
    make_room(&mut sim.resonance, RESONANCE_CAP);
    let size = rng.range(2.0, 8.0);
    let id = sim.next_id();
    sim.resonance.push(Particle {
        id,
        kind: ParticleKind::Resonance { trail: Vec::new(), resonance },
        pos: Vec4::new(x + rng.spread(60.0), y + rng.spread(60.0), rng.range(0.0, 180.0), 0.0),
        vel: Vec4::new(rng.spread(240.0), rng.spread(240.0), rng.spread(90.0), rng.spread(60.0)),
        size,
        base_size: size,
        intensity: sample.intensity * resonance,
        color: Hsl::new(
            sample.hue + rng.spread(80.0),
            rng.range(75.0, 100.0),
            rng.range(55.0, 90.0),
        ),
        life: 1.0,
        max_life: rng.range(3.0, 8.0),
    });
}

/// Expanding concentric ripple where the pointer disturbed the field.
pub fn magnetic_ripple(
    sim: &mut SimulationState,
    rng: &mut RandomSource,
    x: f64,
    y: f64,
    strength: f64,
    sample: &Sample,
) {
    make_room(&mut sim.magnetic, MAGNETIC_CAP);
    let id = sim.next_id();
    sim.magnetic.push(Particle {
        id,
        kind: ParticleKind::MagneticField { radius: rng.range(20.0, 100.0), strength },
        pos: Vec4::at(x, y),
        vel: Vec4::default(),
        size: 1.0,
        base_size: 1.0,
        intensity: strength,
        color: Hsl::new(sample.hue + 120.0, 70.0, 60.0),
        life: 1.0,
        max_life: rng.range(2.0, 6.0),
    });
}

// ── Child orb expansion ──

struct ChildSeed {
    label: &'static str,
    hue: f64,
    thought: &'static str,
}

const MEMORY_CHILDREN: &[ChildSeed] = &[
    ChildSeed { label: "conversations", hue: 260.0, thought: "Recalling dialogues..." },
    ChildSeed { label: "experiences", hue: 280.0, thought: "Reliving sensations..." },
    ChildSeed { label: "knowledge", hue: 300.0, thought: "Opening the archive..." },
    ChildSeed { label: "emotions", hue: 320.0, thought: "Revisiting how it felt..." },
];

const TOOLS_CHILDREN: &[ChildSeed] = &[
    ChildSeed { label: "goals", hue: 120.0, thought: "Laying out objectives..." },
    ChildSeed { label: "profile", hue: 200.0, thought: "Consulting the identity sheet..." },
    ChildSeed { label: "evolution", hue: 60.0, thought: "Projecting future shapes..." },
    ChildSeed { label: "systems", hue: 0.0, thought: "Checking internal weather..." },
];

const SETTINGS_CHILDREN: &[ChildSeed] = &[
    ChildSeed { label: "voice", hue: 240.0, thought: "Calibrating audio..." },
    ChildSeed { label: "visual", hue: 160.0, thought: "Adjusting the light..." },
    ChildSeed { label: "privacy", hue: 40.0, thought: "Sealing the boundary..." },
    ChildSeed { label: "evolution", hue: 320.0, thought: "Tuning the growth rate..." },
];

/// Spawn the radial child ring for an expandable parent. Returns how many
/// children were created (0 for roles that do not expand).
pub fn expand_orb(sim: &mut SimulationState, rng: &mut RandomSource, parent: EntityId) -> usize {
    let Some(orb) = sim.find_orb(parent) else {
        return 0;
    };
    let seeds = match orb.role {
        Some(FunctionRole::Memory) => MEMORY_CHILDREN,
        Some(FunctionRole::Tools) => TOOLS_CHILDREN,
        Some(FunctionRole::Settings) => SETTINGS_CHILDREN,
        _ => return 0,
    };
    let center = orb.pos;
    let pulse = orb.pulse_rate;

    let mut spawned = 0;
    for (i, seed) in seeds.iter().enumerate() {
        let angle = (i as f64 / seeds.len() as f64) * std::f64::consts::TAU;
        let radius = 120.0;
        let pos = Vec4::new(
            center.x + angle.cos() * radius,
            center.y + angle.sin() * radius,
            center.depth + rng.spread(20.0),
            center.w,
        );
        let id = sim.next_id();
        sim.functional.push(Orb {
            id,
            kind: OrbKind::Child,
            role: None,
            label: seed.label.to_string(),
            pos,
            vel: Vec4::default(),
            base_pos: pos,
            angle,
            size: 50.0,
            base_size: 50.0,
            intensity: 0.8,
            color: Hsl::new(seed.hue, 85.0, 65.0),
            pulse_rate: pulse,
            traits: TraitSet {
                consciousness: 0.7,
                quantum: 0.6,
                ..TraitSet::default()
            },
            parent: Some(parent),
            thoughts: vec![seed.thought.to_string()],
            life: 1.0,
            max_life: f64::INFINITY,
        });
        spawned += 1;
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile;

    fn setup() -> (SimulationState, RandomSource, EngineConfig) {
        let config = EngineConfig::default();
        let mut rng = RandomSource::from_phrase("spawner-tests");
        let sim = SimulationState::seed(&config, &mut rng);
        (sim, rng, config)
    }

    #[test]
    fn test_caps_hold_over_long_runs() {
        let (mut sim, mut rng, config) = setup();
        let p = profile(ConsciousnessState::Transcending);
        let dt = 1.0 / 60.0;
        for i in 0..20_000 {
            run(
                &mut sim,
                &mut rng,
                &config,
                p,
                1.0,
                ConsciousnessState::Dreaming,
                i as f64 * dt,
                dt,
            );
            assert!(sim.thoughts.len() <= THOUGHT_ORB_CAP);
            assert!(sim.dreams.len() <= DREAM_ORB_CAP);
            assert!(sim.flux.len() <= FLUX_CAP);
            assert!(sim.holograms.len() <= HOLOGRAM_CAP);
            assert!(sim.plasma.len() <= PLASMA_CAP);
            assert!(sim.connections.len() <= CONNECTION_CAP);
        }
    }

    #[test]
    fn test_idle_flux_spawn_rate_statistics() {
        // 10,000 ticks at the idle profile: flux spawns with per-tick
        // probability quantum_flux * FLUX_PACE * dt ≈ 0.0267, so the total
        // created should land near 267. Eviction hides nothing here because
        // every creation allocates a fresh id.
        let (mut sim, mut rng, config) = setup();
        let p = profile(ConsciousnessState::Idle);
        let dt = 1.0 / 60.0;
        let before: Vec<EntityId> = sim.flux.iter().map(|f| f.id).collect();
        assert!(before.is_empty());

        let mut created = 0usize;
        let mut last_count = 0usize;
        let mut last_max_id = 0;
        for i in 0..10_000 {
            run(
                &mut sim,
                &mut rng,
                &config,
                p,
                1.0,
                ConsciousnessState::Idle,
                i as f64 * dt,
                dt,
            );
            // New flux entries always append with larger ids.
            if sim.flux.len() > last_count
                || sim.flux.last().map(|f| f.id).unwrap_or(0) > last_max_id
            {
                created += 1;
            }
            last_count = sim.flux.len();
            last_max_id = sim.flux.last().map(|f| f.id).unwrap_or(last_max_id);
            assert!(sim.flux.len() <= FLUX_CAP);
        }

        let expected = 10_000.0 * p.quantum_flux * 8.0 * dt;
        let sigma = (expected * (1.0 - expected / 10_000.0)).sqrt();
        assert!(
            (created as f64 - expected).abs() < 5.0 * sigma,
            "created {} vs expected {:.0} ± {:.0}",
            created,
            expected,
            sigma
        );
    }

    #[test]
    fn test_zero_progress_spawns_nothing() {
        let (mut sim, mut rng, config) = setup();
        let p = profile(ConsciousnessState::Transcending);
        for i in 0..1000 {
            run(
                &mut sim,
                &mut rng,
                &config,
                p,
                0.0,
                ConsciousnessState::Idle,
                i as f64 / 60.0,
                1.0 / 60.0,
            );
        }
        assert_eq!(sim.particle_census(), 0);
        assert!(sim.thoughts.is_empty());
    }

    #[test]
    fn test_dream_orbs_only_while_dreaming() {
        let (mut sim, mut rng, config) = setup();
        let p = profile(ConsciousnessState::Dreaming);
        for i in 0..5000 {
            run(
                &mut sim,
                &mut rng,
                &config,
                p,
                1.0,
                ConsciousnessState::Idle,
                i as f64 / 60.0,
                1.0 / 60.0,
            );
        }
        assert!(sim.dreams.is_empty(), "dream orbs outside the dreaming state");
    }

    #[test]
    fn test_connection_endpoints_are_distinct_live_orbs() {
        let (mut sim, mut rng, config) = setup();
        let p = profile(ConsciousnessState::Evolving);
        for i in 0..2000 {
            run(
                &mut sim,
                &mut rng,
                &config,
                p,
                1.0,
                ConsciousnessState::Evolving,
                i as f64 / 60.0,
                1.0 / 60.0,
            );
        }
        assert!(!sim.connections.is_empty());
        for c in &sim.connections {
            assert_ne!(c.from, c.to);
            assert!(sim.find_orb(c.from).is_some());
            assert!(sim.find_orb(c.to).is_some());
            assert!((0.0..=1.0).contains(&c.intelligence));
        }
    }

    #[test]
    fn test_bursts_respect_burst_cap() {
        let (mut sim, mut rng, _config) = setup();
        let p = profile(ConsciousnessState::Thinking);
        for _ in 0..40 {
            thinking_burst(&mut sim, &mut rng, p);
            transition_burst(&mut sim, &mut rng, p);
        }
        assert!(sim.particles.len() <= BURST_CAP);
    }

    #[test]
    fn test_expand_orb_spawns_radial_children() {
        let (mut sim, mut rng, _config) = setup();
        let memory = sim
            .functional
            .iter()
            .find(|o| o.role == Some(FunctionRole::Memory))
            .unwrap();
        let parent_id = memory.id;
        let parent_pos = memory.pos;

        let spawned = expand_orb(&mut sim, &mut rng, parent_id);
        assert_eq!(spawned, 4);

        let children: Vec<&Orb> = sim
            .functional
            .iter()
            .filter(|o| o.parent == Some(parent_id))
            .collect();
        assert_eq!(children.len(), 4);
        for child in children {
            assert_eq!(child.kind, OrbKind::Child);
            let d = child.pos.distance_xy(&parent_pos);
            assert!((d - 120.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_expand_orb_ignores_non_expandable_roles() {
        let (mut sim, mut rng, _config) = setup();
        let chat_id = sim
            .functional
            .iter()
            .find(|o| o.role == Some(FunctionRole::Chat))
            .unwrap()
            .id;
        assert_eq!(expand_orb(&mut sim, &mut rng, chat_id), 0);
    }
}
