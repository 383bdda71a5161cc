//! Core entity types — Vec4, Orb, Particle, Connection, BranchStructure.

use serde::{Deserialize, Serialize};

/// Sequential entity identity. Ids are issued in creation order so that
/// id-derived motion phases replay identically for the same spawn sequence.
pub type EntityId = u64;

// ── 4-component space ──

/// Position or velocity in the avatar's 4-component space: screen x/y,
/// a depth channel, and a fourth "w" modulation channel that renderers
/// map to rotation, parallax, or layer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub w: f64,
}

impl Vec4 {
    pub fn new(x: f64, y: f64, depth: f64, w: f64) -> Self {
        Self { x, y, depth, w }
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, depth: 0.0, w: 0.0 }
    }

    /// Planar (screen) distance — depth and w do not affect proximity.
    pub fn distance_xy(&self, other: &Vec4) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.depth.is_finite() && self.w.is_finite()
    }
}

// ── Color ──

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self { hue, saturation, lightness }
    }
}

// ── Orbs ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbKind {
    Core,
    Functional,
    Child,
    Thought,
    Dream,
}

impl std::fmt::Display for OrbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbKind::Core => write!(f, "core"),
            OrbKind::Functional => write!(f, "functional"),
            OrbKind::Child => write!(f, "child"),
            OrbKind::Thought => write!(f, "thought"),
            OrbKind::Dream => write!(f, "dream"),
        }
    }
}

/// What a functional orb does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionRole {
    Memory,
    Tools,
    Settings,
    Chat,
    Emotion,
}

impl std::fmt::Display for FunctionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionRole::Memory => write!(f, "memory"),
            FunctionRole::Tools => write!(f, "tools"),
            FunctionRole::Settings => write!(f, "settings"),
            FunctionRole::Chat => write!(f, "chat"),
            FunctionRole::Emotion => write!(f, "emotion"),
        }
    }
}

/// Bounded [0, 1] scalars that modulate visual intensity only — never
/// behavior logic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraitSet {
    pub intelligence: f64,
    pub awareness: f64,
    pub creativity: f64,
    pub consciousness: f64,
    pub quantum: f64,
    pub magnetism: f64,
    pub plasma_charge: f64,
    pub hologram_depth: f64,
}

impl TraitSet {
    /// Growth during a state shift: each scalar is nudged upward in
    /// proportion to shift progress, never downward, saturating at 1.0.
    pub fn grow(&mut self, progress: f64) {
        let p = progress.clamp(0.0, 1.0);
        self.intelligence = (self.intelligence + p * 0.01).min(1.0);
        self.awareness = (self.awareness + p * 0.008).min(1.0);
        self.creativity = (self.creativity + p * 0.006).min(1.0);
        self.consciousness = (self.consciousness + p * 0.005).min(1.0);
    }

    /// Slow ambient growth applied every tick to live orbs.
    pub fn drift(&mut self, dt: f64) {
        self.quantum = (self.quantum + 0.06 * dt).min(1.0);
        self.consciousness = (self.consciousness + 0.048 * dt).min(1.0);
    }
}

/// A persistent or semi-persistent visual agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub id: EntityId,
    pub kind: OrbKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<FunctionRole>,
    pub label: String,
    pub pos: Vec4,
    pub vel: Vec4,
    /// Rest point the orb oscillates around.
    pub base_pos: Vec4,
    /// Ring placement angle, also the phase seed for per-orb motion.
    pub angle: f64,
    pub size: f64,
    pub base_size: f64,
    pub intensity: f64,
    pub color: Hsl,
    pub pulse_rate: f64,
    pub traits: TraitSet,
    /// Weak reference — the parent does not own this orb's lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    pub thoughts: Vec<String>,
    /// Remaining life as a [0, 1] fraction of `max_life`.
    pub life: f64,
    /// Seconds of life at spawn; `f64::INFINITY` for persistent orbs.
    pub max_life: f64,
}

impl Orb {
    pub fn is_persistent(&self) -> bool {
        self.max_life.is_infinite()
    }
}

// ── Particles ──

/// Particle category plus its type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticleKind {
    /// Generic burst particle emitted while a query is being processed.
    Thought,
    /// Background field particle with deterministic sinusoidal drift.
    QuantumFlux,
    /// Layered, slowly-bobbing particle near the core.
    Hologram { layers: u32 },
    /// A bright stream from the core to a nearby endpoint.
    PlasmaStream { end: Vec4, thickness: f64 },
    /// Concentric ripple anchored where the pointer disturbed the field.
    MagneticField { radius: f64, strength: f64 },
    /// Radial burst on orb activation.
    Explosion,
    /// Pointer-proximity particle carrying a bounded position trail.
    Resonance { trail: Vec<Vec4>, resonance: f64 },
    /// Spiral burst emitted when a state shift is accepted.
    TransitionBurst,
}

/// A fully transient point entity. Removed the tick its life reaches zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: EntityId,
    pub kind: ParticleKind,
    pub pos: Vec4,
    pub vel: Vec4,
    pub size: f64,
    pub base_size: f64,
    pub intensity: f64,
    pub color: Hsl,
    /// Remaining life as a [0, 1] fraction of `max_life`.
    pub life: f64,
    /// Seconds of life at spawn.
    pub max_life: f64,
}

// ── Connections ──

/// An ephemeral edge between two orbs (or core and orb). Endpoint ids are
/// weak references: if an endpoint disappears mid-life the connection keeps
/// decaying on its own — it is never dereferenced for behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: EntityId,
    pub from: EntityId,
    pub to: EntityId,
    pub from_pos: Vec4,
    pub to_pos: Vec4,
    pub color: Hsl,
    pub opacity: f64,
    pub thickness: f64,
    pub pulse_speed: f64,
    /// Averaged from the endpoints at creation.
    pub intelligence: f64,
    pub consciousness: f64,
    pub life: f64,
    /// Seconds from full life to removal.
    pub duration: f64,
}

// ── Branch structures ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubBranch {
    pub angle: f64,
    pub length: f64,
    pub thickness: f64,
}

/// A decorative nerve tree rooted at a functional orb. Created once at
/// initialization and exempt from the per-tick decay model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchStructure {
    pub id: EntityId,
    pub parent: EntityId,
    pub angle: f64,
    pub length: f64,
    pub thickness: f64,
    pub pulse_phase: f64,
    pub intensity: f64,
    pub hue: f64,
    pub branches: Vec<SubBranch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_depth_and_w() {
        let a = Vec4::new(0.0, 0.0, 100.0, 50.0);
        let b = Vec4::new(3.0, 4.0, 0.0, 0.0);
        assert!((a.distance_xy(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_trait_growth_saturates() {
        let mut t = TraitSet {
            intelligence: 0.999,
            ..TraitSet::default()
        };
        for _ in 0..100 {
            t.grow(1.0);
        }
        assert_eq!(t.intelligence, 1.0);
        assert!(t.awareness <= 1.0);
    }

    #[test]
    fn test_trait_growth_never_shrinks() {
        let mut t = TraitSet {
            intelligence: 0.4,
            awareness: 0.3,
            creativity: 0.2,
            consciousness: 0.5,
            ..TraitSet::default()
        };
        let before = t;
        t.grow(0.5);
        assert!(t.intelligence >= before.intelligence);
        assert!(t.awareness >= before.awareness);
        assert!(t.creativity >= before.creativity);
        assert!(t.consciousness >= before.consciousness);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut p = Vec4::at(1.0, 2.0);
        assert!(p.is_finite());
        p.w = f64::NAN;
        assert!(!p.is_finite());
    }

    #[test]
    fn test_particle_kind_serializes_with_tag() {
        let kind = ParticleKind::Hologram { layers: 3 };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "hologram");
        assert_eq!(json["layers"], 3);
    }
}
