//! The per-tick update loop — integrates, damps, decays, and removes.

use crate::profile::ConsciousnessState;
use crate::rng::RandomSource;
use crate::shift::Sample;
use crate::sim::SimulationState;
use crate::types::*;

/// Points kept in a resonance particle's trail.
const TRAIL_LEN: usize = 20;

/// Per-tick damping factors, expressed per 60 Hz frame and rescaled by dt.
const BURST_DAMPING: f64 = 0.97;
const FLUX_DAMPING: f64 = 0.99;
const RESONANCE_DAMPING: f64 = 0.98;
const DEPTH_DAMPING: f64 = 0.95;
const W_DAMPING: f64 = 0.93;

fn damp(factor: f64, dt: f64) -> f64 {
    factor.powf(dt * 60.0)
}

/// Advance every live entity by one tick. `sample` is the blended profile
/// for this instant (computed once per tick by the controller); `state` is
/// the committed state that selects the functional-orb motion formula.
#[allow(clippy::too_many_arguments)]
pub fn advance(
    sim: &mut SimulationState,
    sample: &Sample,
    state: ConsciousnessState,
    shift_progress: Option<f64>,
    now: f64,
    dt: f64,
    rng: &mut RandomSource,
) {
    update_core(sim, sample, shift_progress, dt);
    update_functional(sim, sample, state, now, dt, rng);
    update_thoughts(sim, now, dt);
    update_dreams(sim, now, dt);
    update_bursts(sim, now, dt);
    update_flux(sim, now, dt);
    update_holograms(sim, now, dt);
    update_plasma(sim, dt);
    update_magnetic(sim, dt);
    update_resonance(sim, sample, now, dt);
    update_connections(sim, dt);
    sweep(sim);
}

// ── Core ──

fn update_core(sim: &mut SimulationState, sample: &Sample, shift_progress: Option<f64>, dt: f64) {
    let core = &mut sim.core;
    core.size = sample.core_size;
    core.pulse_rate = sample.pulse_rate;
    core.color.hue = sample.hue;
    core.intensity = sample.intensity;
    core.traits.magnetism = sample.magnetic;
    core.traits.plasma_charge = sample.plasma_energy;
    core.traits.hologram_depth = sample.hologram;
    if let Some(progress) = shift_progress {
        // Growth only happens while consciousness is shifting.
        core.traits.grow(progress);
        core.traits.drift(dt);
    }
}

// ── Functional ring (and child orbs) ──

fn update_functional(
    sim: &mut SimulationState,
    sample: &Sample,
    state: ConsciousnessState,
    now: f64,
    dt: f64,
    rng: &mut RandomSource,
) {
    let core_pos = sim.core.pos;
    for orb in sim.functional.iter_mut() {
        let a = orb.angle;
        let base = orb.base_pos;
        let mut intensity = orb.intensity;

        match state {
            ConsciousnessState::Idle => {
                // Slow multi-axis breathing around the rest point.
                let qt = now * 0.1;
                orb.pos.x = base.x + (qt * 0.4 + a).sin() * 18.0;
                orb.pos.y = base.y + (qt * 0.35 + a).cos() * 15.0;
                orb.pos.depth = base.depth + (qt * 0.3 + a * 2.0).sin() * 8.0;
                orb.pos.w = (qt * 0.2 + a).sin() * 20.0;
                orb.size = orb.base_size * (1.0 + (qt * 0.6 + a).sin() * 0.12);
                intensity = 0.85;
            }
            ConsciousnessState::Thinking => {
                // Contraction toward the core plus jitter.
                let pull = (1.8 * dt).min(1.0);
                orb.pos.x += (core_pos.x - orb.pos.x) * pull + rng.spread(12.0) * dt * 60.0;
                orb.pos.y += (core_pos.y - orb.pos.y) * pull + rng.spread(12.0) * dt * 60.0;
                orb.pos.depth += (now * 6.0 + a).sin() * 900.0 * dt;
                orb.pos.w = (now * 8.0 + a).cos() * 40.0;
                orb.size = orb.base_size * (1.3 + (now * 5.0 + a).sin() * 0.4);
                intensity = 0.95 + rng.unit() * 0.15;
            }
            ConsciousnessState::Responding => {
                // Communication-relevant orbs step forward, the rest recede.
                let relevant = matches!(
                    orb.role,
                    Some(FunctionRole::Chat) | Some(FunctionRole::Emotion)
                );
                let factor = if relevant { 1.4 } else { 0.6 };
                let tx = core_pos.x + (base.x - core_pos.x) * factor;
                let ty = core_pos.y + (base.y - core_pos.y) * factor;
                let ease = (5.0 * dt).min(1.0);
                orb.pos.x += (tx - orb.pos.x) * ease;
                orb.pos.y += (ty - orb.pos.y) * ease;
                orb.pos.depth = base.depth + if relevant { 30.0 } else { -15.0 };
                orb.pos.w = if relevant { 60.0 } else { 10.0 };
                orb.size = orb.base_size * if relevant { 1.3 } else { 0.8 };
                intensity = if relevant { 1.1 } else { 0.5 };
            }
            ConsciousnessState::Evolving => {
                // Expanding spiral of increasing radius.
                let radius = 350.0 + (now * 2.5).sin() * 80.0;
                let ea = a + now * 0.8;
                orb.pos.x = core_pos.x + ea.cos() * radius;
                orb.pos.y = core_pos.y + ea.sin() * radius;
                orb.pos.depth = base.depth + (now * 4.0 + a).sin() * 50.0;
                orb.pos.w = (now * 3.0 + a).sin() * 80.0;
                orb.size = orb.base_size * (1.8 + (now * 4.0 + a).sin() * 0.7);
                intensity = 1.2 + (now * 6.0 + a).sin() * 0.3;
            }
            ConsciousnessState::Dreaming => {
                // Slow independent wandering, untethered from the ring.
                let qt = now * 0.08;
                orb.pos.x = base.x + (qt + a * 3.0).sin() * 100.0;
                orb.pos.y = base.y + (qt * 1.4 + a * 2.1).cos() * 80.0;
                orb.pos.depth = base.depth + (qt * 0.7 + a).sin() * 40.0;
                orb.pos.w = (qt * 0.5 + a * 1.5).cos() * 60.0;
                orb.size = orb.base_size * (0.7 + (qt * 0.3 + a).sin() * 0.5);
                intensity = 0.4 + (qt * 0.2 + a).sin() * 0.4;
            }
            ConsciousnessState::Transcending => {
                // Wide, fast orbit breaking away from the ring.
                let radius = 500.0 + (now * 3.0).sin() * 150.0;
                let ea = a + now * 1.2;
                orb.pos.x = core_pos.x + ea.cos() * radius;
                orb.pos.y = core_pos.y + ea.sin() * radius;
                orb.pos.depth = base.depth + (now * 5.0 + a).sin() * 100.0;
                orb.pos.w = (now * 4.0 + a).sin() * 120.0;
                orb.size = orb.base_size * (2.2 + (now * 6.0 + a).sin() * 0.8);
                intensity = 1.5 + (now * 8.0 + a).sin() * 0.4;
            }
            ConsciousnessState::Meditating => {
                // Settle back to the rest point and go quiet.
                let ease = (2.0 * dt).min(1.0);
                orb.pos.x += (base.x - orb.pos.x) * ease;
                orb.pos.y += (base.y - orb.pos.y) * ease;
                orb.pos.depth += (base.depth - orb.pos.depth) * ease;
                orb.pos.w += -orb.pos.w * ease;
                orb.size += (orb.base_size * 0.85 - orb.size) * ease;
                intensity += (0.35 - intensity) * ease;
            }
            _ => {
                // Processing / Creating / Learning: gentle drift scaled by
                // the profile's drift level.
                let drift = sample.orb_drift;
                orb.pos.x = base.x + (now * 0.5 + a).sin() * 6.0 * drift;
                orb.pos.y = base.y + (now * 0.45 + a).cos() * 5.0 * drift;
                orb.pos.depth = base.depth;
                orb.pos.w = (now * 0.3 + a).sin() * 10.0 * drift;
                orb.size = orb.base_size;
                intensity += (0.85 - intensity) * (3.0 * dt).min(1.0);
            }
        }

        orb.intensity = intensity.max(0.1);
        orb.pulse_rate = sample.pulse_rate * (0.7 + rng.unit() * 0.6);
        orb.traits.drift(dt);
    }
}

// ── Thought orbs ──

fn update_thoughts(sim: &mut SimulationState, _now: f64, dt: f64) {
    // Snapshot attractor positions first; thoughts drift toward the nearest
    // functional orb while they decay.
    let attractors: Vec<Vec4> = sim.functional.iter().map(|o| o.pos).collect();
    for orb in sim.thoughts.iter_mut() {
        orb.pos.x += orb.vel.x * dt;
        orb.pos.y += orb.vel.y * dt;
        orb.pos.depth = (orb.pos.depth + orb.vel.depth * dt).max(0.0);
        orb.pos.w += orb.vel.w * dt;

        if let Some(nearest) = attractors
            .iter()
            .min_by(|p, q| {
                p.distance_xy(&orb.pos)
                    .total_cmp(&q.distance_xy(&orb.pos))
            })
        {
            let pull = (1.5 * dt).min(1.0);
            orb.pos.x += (nearest.x - orb.pos.x) * pull;
            orb.pos.y += (nearest.y - orb.pos.y) * pull;
        }

        orb.life -= dt / orb.max_life;
        orb.size = orb.base_size * (0.7 + orb.life.max(0.0) * 0.3);
        orb.traits.drift(dt);
    }
}

// ── Dream orbs ──

fn update_dreams(sim: &mut SimulationState, now: f64, dt: f64) {
    for orb in sim.dreams.iter_mut() {
        orb.pos.x += orb.vel.x * dt;
        orb.pos.y += orb.vel.y * dt;
        orb.pos.w = (now * 0.5 + orb.angle).cos() * 30.0;
        orb.life -= dt / orb.max_life;
    }
}

// ── Particles ──

fn update_bursts(sim: &mut SimulationState, now: f64, dt: f64) {
    let d = damp(BURST_DAMPING, dt);
    let dz = damp(DEPTH_DAMPING, dt);
    let dw = damp(W_DAMPING, dt);
    for p in sim.particles.iter_mut() {
        if matches!(
            p.kind,
            ParticleKind::Thought | ParticleKind::TransitionBurst
        ) {
            // Deterministic-from-id perturbation so replays reproduce.
            let wobble = (now * 10.0 + p.id as f64).sin() * 360.0 * dt;
            p.vel.x += wobble;
            p.vel.y += wobble * 0.8;
            p.vel.depth += wobble * 0.6;
        }
        p.vel.x *= d;
        p.vel.y *= d;
        p.vel.depth *= dz;
        p.vel.w *= dw;

        p.pos.x += p.vel.x * dt;
        p.pos.y += p.vel.y * dt;
        p.pos.depth = (p.pos.depth + p.vel.depth * dt).max(0.0);
        p.pos.w += p.vel.w * dt;

        p.life -= dt / p.max_life;
        p.size = p.base_size * (0.6 + p.life.max(0.0) * 0.4);
        p.intensity *= (1.0 - dt / p.max_life).max(0.0);
    }
}

fn update_flux(sim: &mut SimulationState, now: f64, dt: f64) {
    let d = damp(FLUX_DAMPING, dt);
    for p in sim.flux.iter_mut() {
        p.vel.x = p.vel.x * d + (now * 8.0 + p.id as f64).sin() * 360.0 * dt;
        p.vel.y = p.vel.y * d + (now * 8.0 + p.id as f64).cos() * 360.0 * dt;
        p.pos.x += p.vel.x * dt;
        p.pos.y += p.vel.y * dt;
        p.pos.depth = (p.pos.depth + p.vel.depth * dt).max(0.0);
        p.pos.w += p.vel.w * dt;
        p.life -= dt / p.max_life;
    }
}

fn update_holograms(sim: &mut SimulationState, now: f64, dt: f64) {
    for p in sim.holograms.iter_mut() {
        p.pos.w = (now * 5.0 + p.id as f64).sin() * 60.0;
        p.life -= dt / p.max_life;
        p.size = p.base_size * (0.8 + p.life.max(0.0) * 0.4);
    }
}

fn update_plasma(sim: &mut SimulationState, dt: f64) {
    for p in sim.plasma.iter_mut() {
        p.life -= dt / p.max_life;
        let fade = 0.7 + p.life.max(0.0) * 0.6;
        p.size = p.base_size * fade;
        if let ParticleKind::PlasmaStream { thickness, .. } = &mut p.kind {
            *thickness = p.base_size * fade;
        }
    }
}

fn update_magnetic(sim: &mut SimulationState, dt: f64) {
    for p in sim.magnetic.iter_mut() {
        p.life -= dt / p.max_life;
        if let ParticleKind::MagneticField { radius, .. } = &mut p.kind {
            *radius += 40.0 * dt;
        }
    }
}

fn update_resonance(sim: &mut SimulationState, sample: &Sample, now: f64, dt: f64) {
    let core_pos = sim.core.pos;
    let d = damp(RESONANCE_DAMPING, dt);
    let dz = damp(DEPTH_DAMPING, dt);
    let dw = damp(W_DAMPING, dt);
    let seeking = sample.nerve_intensity > 0.7;

    for p in sim.resonance.iter_mut() {
        let phase = p.id as f64 * 0.02;
        p.vel.x += (now * 3.0 + phase).cos() * 480.0 * dt;
        p.vel.y += (now * 4.0 + phase).sin() * 480.0 * dt;

        // Core attraction, proportional to the live nerve intensity.
        if seeking {
            let dx = core_pos.x - p.pos.x;
            let dy = core_pos.y - p.pos.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > 0.0 {
                let force = sample.nerve_intensity * 288.0 * dt;
                p.vel.x += dx / dist * force;
                p.vel.y += dy / dist * force;
            }
        }

        p.vel.x *= d;
        p.vel.y *= d;
        p.vel.depth *= dz;
        p.vel.w *= dw;

        if let ParticleKind::Resonance { trail, .. } = &mut p.kind {
            trail.push(p.pos);
            if trail.len() > TRAIL_LEN {
                trail.remove(0);
            }
        }

        p.pos.x += p.vel.x * dt;
        p.pos.y += p.vel.y * dt;
        p.pos.depth = (p.pos.depth + p.vel.depth * dt).max(0.0);
        p.pos.w += p.vel.w * dt;

        p.life -= dt / p.max_life;
        p.size = p.base_size * (0.5 + p.life.max(0.0) * 0.5);
    }
}

fn update_connections(sim: &mut SimulationState, dt: f64) {
    for c in sim.connections.iter_mut() {
        c.life -= dt / c.duration;
    }
}

// ── Removal ──

/// Drop everything that died this tick, plus any entity whose numbers blew
/// up — a non-finite position loses the entity, never the tick.
fn sweep(sim: &mut SimulationState) {
    sim.thoughts.retain(|o| o.life > 0.0 && o.pos.is_finite());
    sim.dreams.retain(|o| o.life > 0.0 && o.pos.is_finite());
    sim.particles.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.flux.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.holograms.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.plasma.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.magnetic.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.resonance.retain(|p| p.life > 0.0 && p.pos.is_finite());
    sim.connections.retain(|c| c.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::profile::profile;
    use crate::spawner;

    const DT: f64 = 1.0 / 60.0;

    fn setup() -> (SimulationState, RandomSource, EngineConfig) {
        let config = EngineConfig::default();
        let mut rng = RandomSource::from_phrase("physics-tests");
        let sim = SimulationState::seed(&config, &mut rng);
        (sim, rng, config)
    }

    fn idle_sample() -> Sample {
        Sample::of(profile(ConsciousnessState::Idle))
    }

    fn run_ticks(
        sim: &mut SimulationState,
        rng: &mut RandomSource,
        state: ConsciousnessState,
        ticks: usize,
    ) {
        let sample = Sample::of(profile(state));
        for i in 0..ticks {
            advance(sim, &sample, state, None, i as f64 * DT, DT, rng);
        }
    }

    #[test]
    fn test_life_is_non_increasing_until_removal() {
        let (mut sim, mut rng, _config) = setup();
        spawner::thinking_burst(&mut sim, &mut rng, profile(ConsciousnessState::Thinking));
        let sample = idle_sample();

        let mut last: Vec<(EntityId, f64)> =
            sim.particles.iter().map(|p| (p.id, p.life)).collect();
        for i in 0..600 {
            advance(
                &mut sim,
                &sample,
                ConsciousnessState::Idle,
                None,
                i as f64 * DT,
                DT,
                &mut rng,
            );
            for p in &sim.particles {
                // Every survivor's life must have strictly decreased.
                if let Some((_, prev)) = last.iter().find(|(id, _)| *id == p.id) {
                    assert!(p.life < *prev, "life increased for particle {}", p.id);
                }
                assert!(p.life > 0.0, "dead particle survived its tick");
            }
            last = sim.particles.iter().map(|p| (p.id, p.life)).collect();
        }
        // Burst max_life is 3 s; after 10 s everything is gone.
        assert!(sim.particles.is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let run = || {
            let config = EngineConfig::default();
            let mut rng = RandomSource::from_phrase("replay");
            let mut sim = SimulationState::seed(&config, &mut rng);
            spawner::thinking_burst(&mut sim, &mut rng, profile(ConsciousnessState::Thinking));
            run_ticks(&mut sim, &mut rng, ConsciousnessState::Thinking, 300);
            sim.particles
                .iter()
                .map(|p| (p.id, p.pos.x, p.pos.y))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_thinking_contracts_the_ring() {
        let (mut sim, mut rng, config) = setup();
        let (cx, cy) = config.center();
        let center = Vec4::at(cx, cy);
        let before: f64 = sim
            .functional
            .iter()
            .map(|o| o.pos.distance_xy(&center))
            .sum::<f64>()
            / sim.functional.len() as f64;

        run_ticks(&mut sim, &mut rng, ConsciousnessState::Thinking, 120);

        let after: f64 = sim
            .functional
            .iter()
            .map(|o| o.pos.distance_xy(&center))
            .sum::<f64>()
            / sim.functional.len() as f64;
        assert!(after < before * 0.5, "ring did not contract: {} -> {}", before, after);
    }

    #[test]
    fn test_evolving_expands_beyond_the_ring() {
        let (mut sim, mut rng, config) = setup();
        let (cx, cy) = config.center();
        let center = Vec4::at(cx, cy);

        run_ticks(&mut sim, &mut rng, ConsciousnessState::Evolving, 60);

        for orb in &sim.functional {
            let d = orb.pos.distance_xy(&center);
            assert!((250.0..=450.0).contains(&d), "orb at {}", d);
        }
    }

    #[test]
    fn test_idle_breathes_near_base() {
        let (mut sim, mut rng, _config) = setup();
        run_ticks(&mut sim, &mut rng, ConsciousnessState::Idle, 600);
        for orb in &sim.functional {
            let drift = orb.pos.distance_xy(&orb.base_pos);
            assert!(drift < 40.0, "idle drifted {}", drift);
        }
    }

    #[test]
    fn test_meditating_returns_orbs_to_base() {
        let (mut sim, mut rng, _config) = setup();
        run_ticks(&mut sim, &mut rng, ConsciousnessState::Evolving, 120);
        run_ticks(&mut sim, &mut rng, ConsciousnessState::Meditating, 600);
        for orb in &sim.functional {
            assert!(orb.pos.distance_xy(&orb.base_pos) < 5.0);
            assert!(orb.intensity < 0.4);
        }
    }

    #[test]
    fn test_non_finite_entity_is_dropped_not_fatal() {
        let (mut sim, mut rng, _config) = setup();
        spawner::thinking_burst(&mut sim, &mut rng, profile(ConsciousnessState::Thinking));
        let count = sim.particles.len();
        sim.particles[0].pos.x = f64::NAN;

        let sample = idle_sample();
        advance(&mut sim, &sample, ConsciousnessState::Idle, None, 0.0, DT, &mut rng);
        assert_eq!(sim.particles.len(), count - 1);
        assert!(sim.particles.iter().all(|p| p.pos.is_finite()));
    }

    #[test]
    fn test_resonance_trail_is_bounded() {
        let (mut sim, mut rng, _config) = setup();
        let sample = idle_sample();
        spawner::resonance_particle(&mut sim, &mut rng, 100.0, 100.0, 1.0, &sample);
        // Make it long-lived enough to out-survive the trail bound.
        sim.resonance[0].max_life = 100.0;

        run_ticks(&mut sim, &mut rng, ConsciousnessState::Idle, 120);
        let ParticleKind::Resonance { trail, .. } = &sim.resonance[0].kind else {
            panic!("kind changed");
        };
        assert_eq!(trail.len(), TRAIL_LEN);
    }

    #[test]
    fn test_resonance_seeks_core_at_high_nerve_intensity() {
        let (mut sim, mut rng, config) = setup();
        let (cx, cy) = config.center();
        let center = Vec4::at(cx, cy);
        let sample = Sample::of(profile(ConsciousnessState::Thinking)); // nerve 0.95
        spawner::resonance_particle(&mut sim, &mut rng, cx + 600.0, cy, 1.0, &sample);
        sim.resonance[0].max_life = 100.0;
        sim.resonance[0].vel = Vec4::default();

        let before = sim.resonance[0].pos.distance_xy(&center);
        for i in 0..180 {
            advance(
                &mut sim,
                &sample,
                ConsciousnessState::Thinking,
                None,
                i as f64 * DT,
                DT,
                &mut rng,
            );
        }
        let after = sim.resonance[0].pos.distance_xy(&center);
        assert!(after < before, "no attraction: {} -> {}", before, after);
    }

    #[test]
    fn test_connections_decay_out() {
        let (mut sim, mut rng, _config) = setup();
        let p = profile(ConsciousnessState::Evolving);
        let config = EngineConfig::default();
        for i in 0..120 {
            spawner::run(
                &mut sim,
                &mut rng,
                &config,
                p,
                1.0,
                ConsciousnessState::Evolving,
                i as f64 * DT,
                DT,
            );
        }
        assert!(!sim.connections.is_empty());
        run_ticks(&mut sim, &mut rng, ConsciousnessState::Idle, 600);
        assert!(sim.connections.is_empty(), "connections outlived max duration");
    }

    #[test]
    fn test_core_tracks_sample() {
        let (mut sim, mut rng, _config) = setup();
        let sample = Sample::of(profile(ConsciousnessState::Transcending));
        advance(
            &mut sim,
            &sample,
            ConsciousnessState::Idle,
            Some(0.5),
            0.0,
            DT,
            &mut rng,
        );
        assert_eq!(sim.core.size, sample.core_size);
        assert_eq!(sim.core.color.hue, sample.hue);
        assert_eq!(sim.core.pulse_rate, sample.pulse_rate);
    }
}
