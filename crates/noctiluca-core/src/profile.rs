//! Consciousness states and their immutable parameter bundles.

use serde::{Deserialize, Serialize};

// ── Consciousness states ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsciousnessState {
    Idle,
    Thinking,
    Responding,
    Evolving,
    Dreaming,
    Processing,
    Creating,
    Learning,
    Transcending,
    Meditating,
}

impl std::fmt::Display for ConsciousnessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsciousnessState::Idle => "idle",
            ConsciousnessState::Thinking => "thinking",
            ConsciousnessState::Responding => "responding",
            ConsciousnessState::Evolving => "evolving",
            ConsciousnessState::Dreaming => "dreaming",
            ConsciousnessState::Processing => "processing",
            ConsciousnessState::Creating => "creating",
            ConsciousnessState::Learning => "learning",
            ConsciousnessState::Transcending => "transcending",
            ConsciousnessState::Meditating => "meditating",
        };
        write!(f, "{}", name)
    }
}

impl ConsciousnessState {
    pub const ALL: [ConsciousnessState; 10] = [
        ConsciousnessState::Idle,
        ConsciousnessState::Thinking,
        ConsciousnessState::Responding,
        ConsciousnessState::Evolving,
        ConsciousnessState::Dreaming,
        ConsciousnessState::Processing,
        ConsciousnessState::Creating,
        ConsciousnessState::Learning,
        ConsciousnessState::Transcending,
        ConsciousnessState::Meditating,
    ];
}

// ── Profiles ──

/// Base hues (degrees) for the different entity families of one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: f64,
    pub secondary: f64,
    pub accent: f64,
    pub quantum: f64,
    pub plasma: f64,
    pub neural: f64,
}

/// Per-effect intensity levels, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub hologram: f64,
    pub crystalline: f64,
    pub ethereal: f64,
    pub magnetic: f64,
}

/// The immutable parameter bundle for one consciousness state. Looked up by
/// the current/target state; never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateProfile {
    pub core_size: f64,
    pub pulse_rate: f64,
    pub core_intensity: f64,
    pub orb_drift: f64,
    pub particle_speed: f64,
    pub connection_opacity: f64,
    /// Seconds a shift into this state takes.
    pub transition_secs: f64,
    pub nerve_intensity: f64,
    pub thought_activity: f64,
    pub quantum_flux: f64,
    pub plasma_energy: f64,
    pub dimensional_depth: f64,
    pub palette: Palette,
    pub effects: Effects,
}

const IDLE: StateProfile = StateProfile {
    core_size: 160.0,
    pulse_rate: 0.6,
    core_intensity: 0.8,
    orb_drift: 0.3,
    particle_speed: 1.0,
    connection_opacity: 0.5,
    transition_secs: 4.0,
    nerve_intensity: 0.6,
    thought_activity: 0.4,
    quantum_flux: 0.2,
    plasma_energy: 0.3,
    dimensional_depth: 0.4,
    palette: Palette { primary: 195.0, secondary: 220.0, accent: 170.0, quantum: 240.0, plasma: 160.0, neural: 185.0 },
    effects: Effects { hologram: 0.3, crystalline: 0.4, ethereal: 0.5, magnetic: 0.2 },
};

const THINKING: StateProfile = StateProfile {
    core_size: 190.0,
    pulse_rate: 3.2,
    core_intensity: 1.1,
    orb_drift: 2.8,
    particle_speed: 5.5,
    connection_opacity: 0.9,
    transition_secs: 1.0,
    nerve_intensity: 0.95,
    thought_activity: 0.9,
    quantum_flux: 0.8,
    plasma_energy: 0.9,
    dimensional_depth: 0.8,
    palette: Palette { primary: 50.0, secondary: 35.0, accent: 65.0, quantum: 80.0, plasma: 25.0, neural: 45.0 },
    effects: Effects { hologram: 0.8, crystalline: 0.9, ethereal: 0.7, magnetic: 0.9 },
};

const RESPONDING: StateProfile = StateProfile {
    core_size: 175.0,
    pulse_rate: 2.1,
    core_intensity: 0.95,
    orb_drift: 1.5,
    particle_speed: 3.2,
    connection_opacity: 0.75,
    transition_secs: 1.4,
    nerve_intensity: 0.85,
    thought_activity: 0.7,
    quantum_flux: 0.6,
    plasma_energy: 0.7,
    dimensional_depth: 0.7,
    palette: Palette { primary: 125.0, secondary: 145.0, accent: 105.0, quantum: 160.0, plasma: 95.0, neural: 135.0 },
    effects: Effects { hologram: 0.7, crystalline: 0.6, ethereal: 0.8, magnetic: 0.6 },
};

const EVOLVING: StateProfile = StateProfile {
    core_size: 240.0,
    pulse_rate: 4.5,
    core_intensity: 1.3,
    orb_drift: 4.2,
    particle_speed: 7.5,
    connection_opacity: 1.0,
    transition_secs: 1.8,
    nerve_intensity: 1.0,
    thought_activity: 1.0,
    quantum_flux: 1.0,
    plasma_energy: 1.0,
    dimensional_depth: 1.0,
    palette: Palette { primary: 285.0, secondary: 310.0, accent: 260.0, quantum: 330.0, plasma: 240.0, neural: 295.0 },
    effects: Effects { hologram: 1.0, crystalline: 1.0, ethereal: 0.9, magnetic: 1.0 },
};

const DREAMING: StateProfile = StateProfile {
    core_size: 140.0,
    pulse_rate: 0.25,
    core_intensity: 0.6,
    orb_drift: 0.1,
    particle_speed: 0.4,
    connection_opacity: 0.3,
    transition_secs: 6.0,
    nerve_intensity: 0.4,
    thought_activity: 0.2,
    quantum_flux: 0.9,
    plasma_energy: 0.2,
    dimensional_depth: 0.9,
    palette: Palette { primary: 325.0, secondary: 345.0, accent: 305.0, quantum: 0.0, plasma: 280.0, neural: 335.0 },
    effects: Effects { hologram: 0.9, crystalline: 0.3, ethereal: 1.0, magnetic: 0.1 },
};

const PROCESSING: StateProfile = StateProfile {
    core_size: 170.0,
    pulse_rate: 2.0,
    core_intensity: 0.8,
    orb_drift: 1.0,
    particle_speed: 2.5,
    connection_opacity: 0.7,
    transition_secs: 1.5,
    nerve_intensity: 0.7,
    thought_activity: 0.6,
    quantum_flux: 0.4,
    plasma_energy: 0.5,
    dimensional_depth: 0.5,
    palette: Palette { primary: 240.0, secondary: 260.0, accent: 220.0, quantum: 280.0, plasma: 200.0, neural: 250.0 },
    effects: Effects { hologram: 0.5, crystalline: 0.6, ethereal: 0.5, magnetic: 0.4 },
};

const CREATING: StateProfile = StateProfile {
    core_size: 180.0,
    pulse_rate: 2.8,
    core_intensity: 1.0,
    orb_drift: 2.2,
    particle_speed: 4.5,
    connection_opacity: 0.85,
    transition_secs: 1.8,
    nerve_intensity: 0.9,
    thought_activity: 0.85,
    quantum_flux: 0.7,
    plasma_energy: 0.8,
    dimensional_depth: 0.7,
    palette: Palette { primary: 30.0, secondary: 45.0, accent: 15.0, quantum: 90.0, plasma: 0.0, neural: 35.0 },
    effects: Effects { hologram: 0.7, crystalline: 0.7, ethereal: 0.6, magnetic: 0.8 },
};

const LEARNING: StateProfile = StateProfile {
    core_size: 165.0,
    pulse_rate: 2.0,
    core_intensity: 0.85,
    orb_drift: 1.5,
    particle_speed: 3.2,
    connection_opacity: 0.75,
    transition_secs: 1.6,
    nerve_intensity: 0.85,
    thought_activity: 0.7,
    quantum_flux: 0.5,
    plasma_energy: 0.6,
    dimensional_depth: 0.6,
    palette: Palette { primary: 180.0, secondary: 200.0, accent: 160.0, quantum: 220.0, plasma: 140.0, neural: 190.0 },
    effects: Effects { hologram: 0.6, crystalline: 0.5, ethereal: 0.7, magnetic: 0.5 },
};

const TRANSCENDING: StateProfile = StateProfile {
    core_size: 280.0,
    pulse_rate: 6.0,
    core_intensity: 1.5,
    orb_drift: 5.5,
    particle_speed: 9.0,
    connection_opacity: 1.0,
    transition_secs: 2.5,
    nerve_intensity: 1.0,
    thought_activity: 1.0,
    quantum_flux: 1.0,
    plasma_energy: 1.0,
    dimensional_depth: 1.0,
    palette: Palette { primary: 0.0, secondary: 20.0, accent: 340.0, quantum: 60.0, plasma: 300.0, neural: 15.0 },
    effects: Effects { hologram: 1.0, crystalline: 1.0, ethereal: 1.0, magnetic: 1.0 },
};

const MEDITATING: StateProfile = StateProfile {
    core_size: 130.0,
    pulse_rate: 0.2,
    core_intensity: 0.5,
    orb_drift: 0.05,
    particle_speed: 0.2,
    connection_opacity: 0.2,
    transition_secs: 8.0,
    nerve_intensity: 0.3,
    thought_activity: 0.1,
    quantum_flux: 0.8,
    plasma_energy: 0.1,
    dimensional_depth: 0.95,
    palette: Palette { primary: 270.0, secondary: 290.0, accent: 250.0, quantum: 300.0, plasma: 230.0, neural: 275.0 },
    effects: Effects { hologram: 0.9, crystalline: 0.2, ethereal: 1.0, magnetic: 0.05 },
};

/// Look up the immutable profile for a state.
pub fn profile(state: ConsciousnessState) -> &'static StateProfile {
    match state {
        ConsciousnessState::Idle => &IDLE,
        ConsciousnessState::Thinking => &THINKING,
        ConsciousnessState::Responding => &RESPONDING,
        ConsciousnessState::Evolving => &EVOLVING,
        ConsciousnessState::Dreaming => &DREAMING,
        ConsciousnessState::Processing => &PROCESSING,
        ConsciousnessState::Creating => &CREATING,
        ConsciousnessState::Learning => &LEARNING,
        ConsciousnessState::Transcending => &TRANSCENDING,
        ConsciousnessState::Meditating => &MEDITATING,
    }
}
