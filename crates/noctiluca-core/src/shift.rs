//! State shifts — timed, eased interpolation between two state profiles.

use serde::{Deserialize, Serialize};

use crate::profile::{profile, ConsciousnessState, StateProfile};

/// The continuously-varying slice of a profile, frozen at shift start and
/// blended toward the target each tick. Capturing a sample (rather than the
/// `from` profile) is what lets a mid-flight re-trigger continue from the
/// partially-interpolated values without a visual snap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub core_size: f64,
    pub pulse_rate: f64,
    pub hue: f64,
    pub intensity: f64,
    pub orb_drift: f64,
    pub particle_speed: f64,
    pub connection_opacity: f64,
    pub nerve_intensity: f64,
    pub thought_activity: f64,
    pub quantum_flux: f64,
    pub plasma_energy: f64,
    pub dimensional_depth: f64,
    pub hologram: f64,
    pub magnetic: f64,
}

impl Sample {
    pub fn of(p: &StateProfile) -> Self {
        Self {
            core_size: p.core_size,
            pulse_rate: p.pulse_rate,
            hue: p.palette.primary,
            intensity: p.core_intensity,
            orb_drift: p.orb_drift,
            particle_speed: p.particle_speed,
            connection_opacity: p.connection_opacity,
            nerve_intensity: p.nerve_intensity,
            thought_activity: p.thought_activity,
            quantum_flux: p.quantum_flux,
            plasma_energy: p.plasma_energy,
            dimensional_depth: p.dimensional_depth,
            hologram: p.effects.hologram,
            magnetic: p.effects.magnetic,
        }
    }

    fn lerp(a: &Sample, b: &Sample, t: f64) -> Sample {
        let mix = |x: f64, y: f64| x + (y - x) * t;
        Sample {
            core_size: mix(a.core_size, b.core_size),
            pulse_rate: mix(a.pulse_rate, b.pulse_rate),
            hue: mix(a.hue, b.hue),
            intensity: mix(a.intensity, b.intensity),
            orb_drift: mix(a.orb_drift, b.orb_drift),
            particle_speed: mix(a.particle_speed, b.particle_speed),
            connection_opacity: mix(a.connection_opacity, b.connection_opacity),
            nerve_intensity: mix(a.nerve_intensity, b.nerve_intensity),
            thought_activity: mix(a.thought_activity, b.thought_activity),
            quantum_flux: mix(a.quantum_flux, b.quantum_flux),
            plasma_energy: mix(a.plasma_energy, b.plasma_energy),
            dimensional_depth: mix(a.dimensional_depth, b.dimensional_depth),
            hologram: mix(a.hologram, b.hologram),
            magnetic: mix(a.magnetic, b.magnetic),
        }
    }
}

/// An in-flight shift between two states.
#[derive(Debug, Clone)]
pub struct Shift {
    pub from: ConsciousnessState,
    pub to: ConsciousnessState,
    pub reason: String,
    pub started_at: f64,
    pub duration: f64,
    from_sample: Sample,
}

/// Holds the committed state and drives eased interpolation toward a target.
pub struct ShiftController {
    current: ConsciousnessState,
    shift: Option<Shift>,
}

/// Ease-out quartic with a bounded oscillatory wobble so the motion never
/// reads as perfectly mechanical. The wobble stays within ±0.02 and the
/// result is clamped back into [0, 1].
fn ease(linear: f64) -> f64 {
    let quartic = 1.0 - (1.0 - linear).powi(4);
    let wobble = (linear * std::f64::consts::PI * 8.0).sin() * 0.02;
    (quartic + wobble).clamp(0.0, 1.0)
}

impl ShiftController {
    pub fn new() -> Self {
        Self {
            current: ConsciousnessState::Idle,
            shift: None,
        }
    }

    pub fn current(&self) -> ConsciousnessState {
        self.current
    }

    pub fn shift(&self) -> Option<&Shift> {
        self.shift.as_ref()
    }

    /// The state the avatar is heading toward (== current when settled).
    pub fn target(&self) -> ConsciousnessState {
        self.shift.as_ref().map(|s| s.to).unwrap_or(self.current)
    }

    /// Request a shift. Returns false (and does nothing) when `to` is
    /// already the committed state. A request that lands mid-flight
    /// abandons the in-flight shift and starts over from the current
    /// interpolated sample.
    pub fn request(&mut self, now: f64, to: ConsciousnessState, reason: &str) -> bool {
        if to == self.current {
            return false;
        }

        let from_sample = self.sample(now);
        self.shift = Some(Shift {
            from: self.current,
            to,
            reason: reason.to_string(),
            started_at: now,
            duration: profile(to).transition_secs,
            from_sample,
        });
        true
    }

    /// Raw elapsed/duration progress, monotone non-decreasing over an
    /// uninterrupted shift. None when settled.
    pub fn linear_progress(&self, now: f64) -> Option<f64> {
        self.shift
            .as_ref()
            .map(|s| ((now - s.started_at) / s.duration).clamp(0.0, 1.0))
    }

    /// Eased progress used for visual blending.
    pub fn eased_progress(&self, now: f64) -> Option<f64> {
        self.linear_progress(now).map(ease)
    }

    /// The blended parameter sample for this instant. Call once per tick and
    /// share the result between spawner and physics.
    pub fn sample(&self, now: f64) -> Sample {
        match &self.shift {
            None => Sample::of(profile(self.current)),
            Some(s) => {
                let t = ease(((now - s.started_at) / s.duration).clamp(0.0, 1.0));
                Sample::lerp(&s.from_sample, &Sample::of(profile(s.to)), t)
            }
        }
    }

    /// Drop the in-flight shift without committing it. The committed state
    /// stands; visuals snap back over the next sample. Used for error
    /// recovery when the avatar must land in its current state.
    pub fn abandon(&mut self) {
        self.shift = None;
    }

    /// Commit the target state once linear progress reaches 1.0. Returns the
    /// completed shift so the engine can announce it.
    pub fn finish_if_done(&mut self, now: f64) -> Option<Shift> {
        let done = self
            .linear_progress(now)
            .map(|p| p >= 1.0)
            .unwrap_or(false);
        if done {
            let shift = self.shift.take().expect("progress implies a shift");
            self.current = shift.to;
            Some(shift)
        } else {
            None
        }
    }
}

impl Default for ShiftController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let c = ShiftController::new();
        assert_eq!(c.current(), ConsciousnessState::Idle);
        assert!(c.shift().is_none());
    }

    #[test]
    fn test_retrigger_current_state_is_noop() {
        let mut c = ShiftController::new();
        assert!(!c.request(0.0, ConsciousnessState::Idle, "noop"));
        assert!(c.shift().is_none());
    }

    #[test]
    fn test_linear_progress_monotone_and_commits_at_one() {
        let mut c = ShiftController::new();
        assert!(c.request(0.0, ConsciousnessState::Thinking, "test"));
        let duration = c.shift().unwrap().duration;

        let mut last = 0.0;
        let steps = 200;
        for i in 0..=steps {
            let now = duration * i as f64 / steps as f64;
            let p = c.linear_progress(now).unwrap();
            assert!(p >= last, "progress regressed at step {}", i);
            last = p;
        }
        assert_eq!(last, 1.0);

        assert!(c.finish_if_done(duration).is_some());
        assert_eq!(c.current(), ConsciousnessState::Thinking);
        assert!(c.shift().is_none());
    }

    #[test]
    fn test_no_commit_before_completion() {
        let mut c = ShiftController::new();
        c.request(0.0, ConsciousnessState::Thinking, "test");
        let duration = c.shift().unwrap().duration;
        assert!(c.finish_if_done(duration * 0.99).is_none());
        assert_eq!(c.current(), ConsciousnessState::Idle);
    }

    #[test]
    fn test_eased_progress_stays_in_unit_interval() {
        let mut c = ShiftController::new();
        c.request(0.0, ConsciousnessState::Evolving, "test");
        let duration = c.shift().unwrap().duration;
        for i in 0..=1000 {
            let p = c.eased_progress(duration * i as f64 / 1000.0).unwrap();
            assert!((0.0..=1.0).contains(&p), "eased {} out of bounds", p);
        }
    }

    #[test]
    fn test_retrigger_continues_from_interpolated_sample() {
        let mut c = ShiftController::new();
        c.request(0.0, ConsciousnessState::Thinking, "first");

        // Partway in, divert to evolving.
        let mid = 0.2;
        let sample_before = c.sample(mid);
        c.request(mid, ConsciousnessState::Evolving, "second");

        // Only one shift, targeting the new state, from the old committed state.
        let shift = c.shift().unwrap();
        assert_eq!(shift.to, ConsciousnessState::Evolving);
        assert_eq!(shift.from, ConsciousnessState::Idle);

        // Progress restarted, and the visual sample is continuous: at the
        // moment of re-trigger the blend equals the frozen mid-flight values,
        // not the idle profile values.
        assert_eq!(c.linear_progress(mid), Some(0.0));
        let sample_after = c.sample(mid);
        assert!((sample_after.core_size - sample_before.core_size).abs() < 1e-9);
        assert!((sample_after.hue - sample_before.hue).abs() < 1e-9);
        let idle_size = profile(ConsciousnessState::Idle).core_size;
        assert!((sample_after.core_size - idle_size).abs() > 1.0);
    }

    #[test]
    fn test_sample_reaches_target_profile() {
        let mut c = ShiftController::new();
        c.request(0.0, ConsciousnessState::Meditating, "test");
        let duration = c.shift().unwrap().duration;
        let end = c.sample(duration);
        let target = profile(ConsciousnessState::Meditating);
        assert!((end.core_size - target.core_size).abs() < 1e-9);
        assert!((end.pulse_rate - target.pulse_rate).abs() < 1e-9);
    }
}
