//! The tick loop — the heart of the avatar. Runs as an independent tokio
//! task, drains commands at tick boundaries, and broadcasts snapshots.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::adapter::{self, VoiceIntent};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{ConversationTurn, EngineEvent, NoticeData, Snapshot, StateChange};
use crate::physics;
use crate::profile::{profile, ConsciousnessState};
use crate::responder::{self, Reply};
use crate::rng::RandomSource;
use crate::shift::ShiftController;
use crate::sim::SimulationState;
use crate::spawner;
use crate::types::{EntityId, FunctionRole, OrbKind};

/// Messages that can be sent TO the engine (from frontends/collaborators).
#[derive(Debug)]
pub enum EngineCommand {
    /// A chat query was submitted.
    Query(String),
    /// Recognized speech to pattern-match against voice intents.
    Voice(String),
    /// Pointer moved over the avatar's viewport.
    Pointer { x: f64, y: f64 },
    /// An orb was clicked/tapped.
    OrbClicked(EntityId),
    /// The chat panel opened or closed.
    ChatOpen(bool),
    /// An input source (microphone etc.) failed to start.
    InputFailure(String),
    /// The external query round trip settled (internal).
    ResponseSettled(Result<Reply, EngineError>),
    Stop,
}

/// Deadline entries on the simulation clock — the setTimeout equivalents.
/// `Return` entries are cleared whenever a new shift is accepted, so
/// auto-return timers never stack.
#[derive(Debug, Clone)]
enum Deferred {
    Return {
        to: ConsciousnessState,
        reason: String,
    },
    Expand {
        orb: EntityId,
    },
    CollapseChildren {
        parent: EntityId,
    },
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: f64,
    action: Deferred,
}

/// Cloneable sender half used by collaborators.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn submit_query(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::Query(text.into())).await
    }

    pub async fn recognized_speech(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::Voice(text.into())).await
    }

    pub async fn pointer_position(&self, x: f64, y: f64) -> Result<(), EngineError> {
        self.send(EngineCommand::Pointer { x, y }).await
    }

    pub async fn orb_clicked(&self, id: EntityId) -> Result<(), EngineError> {
        self.send(EngineCommand::OrbClicked(id)).await
    }

    pub async fn set_chat_open(&self, open: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::ChatOpen(open)).await
    }

    pub async fn input_failure(&self, detail: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::InputFailure(detail.into())).await
    }

    pub async fn stop(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Stop).await
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(cmd).await.map_err(|_| EngineError::NotRunning)
    }
}

/// The engine — owns the whole simulation aggregate and all timers.
pub struct Engine {
    config: EngineConfig,
    rng: RandomSource,
    pub sim: SimulationState,
    shifts: ShiftController,

    /// Simulation clock in seconds, advanced dt per tick. All deadlines
    /// live on this clock, so tests drive time by calling `advance`.
    clock: f64,
    tick: u64,

    pending: Vec<Scheduled>,
    last_activity: f64,
    next_dream_check: f64,
    chat_open: bool,
    speech_enabled: bool,
    awaiting_reply: bool,

    event_tx: broadcast::Sender<EngineEvent>,
    command_tx: mpsc::Sender<EngineCommand>,
    command_rx: Option<mpsc::Receiver<EngineCommand>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut rng = match config.seed.as_deref() {
            Some(phrase) => RandomSource::from_phrase(phrase),
            None => RandomSource::from_entropy(),
        };
        let sim = SimulationState::seed(&config, &mut rng);
        let (event_tx, _) = broadcast::channel(256);
        let (command_tx, command_rx) = mpsc::channel(32);
        let next_dream_check = config.dream_check_secs;
        let speech_enabled = config.speech_enabled;

        Self {
            config,
            rng,
            sim,
            shifts: ShiftController::new(),
            clock: 0.0,
            tick: 0,
            pending: Vec::new(),
            last_activity: 0.0,
            next_dream_check,
            chat_open: false,
            speech_enabled,
            awaiting_reply: false,
            event_tx,
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.command_tx.clone(),
        }
    }

    pub fn state(&self) -> ConsciousnessState {
        self.shifts.current()
    }

    fn broadcast(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    // ── Shifting ──

    /// Request a shift; on acceptance clears any pending auto-return and
    /// fires the transition burst. Re-triggering the current state is a
    /// no-op with no side effects.
    fn shift_to(&mut self, to: ConsciousnessState, reason: &str) -> bool {
        if !self.shifts.request(self.clock, to, reason) {
            return false;
        }
        debug!("consciousness shifting: {} -> {} ({})", self.shifts.current(), to, reason);
        self.pending
            .retain(|s| !matches!(s.action, Deferred::Return { .. }));
        spawner::transition_burst(&mut self.sim, &mut self.rng, profile(to));
        true
    }

    /// Error recovery lands in idle even when a shift away from idle is
    /// still in flight.
    fn settle_to_idle(&mut self, reason: &str) {
        if self.shifts.current() == ConsciousnessState::Idle {
            self.shifts.abandon();
        } else {
            self.shift_to(ConsciousnessState::Idle, reason);
        }
    }

    fn schedule(&mut self, delay: f64, action: Deferred) {
        self.pending.push(Scheduled {
            due: self.clock + delay,
            action,
        });
    }

    fn schedule_return(&mut self, to: ConsciousnessState, reason: &str, delay: f64) {
        // One pending auto-return at a time.
        self.pending
            .retain(|s| !matches!(s.action, Deferred::Return { .. }));
        self.schedule(
            delay,
            Deferred::Return {
                to,
                reason: reason.to_string(),
            },
        );
    }

    // ── Command handling ──

    /// Returns false when the engine should stop.
    pub fn handle_command(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::Query(text) => self.on_query_submitted(text),
            EngineCommand::Voice(text) => self.on_voice_command(&text),
            EngineCommand::Pointer { x, y } => self.on_pointer_move(x, y),
            EngineCommand::OrbClicked(id) => self.on_orb_activated(id),
            EngineCommand::ChatOpen(open) => {
                self.chat_open = open;
                self.last_activity = self.clock;
                if open {
                    self.shift_to(ConsciousnessState::Creating, "chat_open");
                }
            }
            EngineCommand::InputFailure(detail) => {
                warn!("input acquisition failed: {}", detail);
                self.broadcast(EngineEvent::Notice(NoticeData {
                    level: "warn".to_string(),
                    text: format!("input unavailable: {}", detail),
                }));
                self.settle_to_idle("input_error");
            }
            EngineCommand::ResponseSettled(result) => self.on_response_settled(result),
            EngineCommand::Stop => return false,
        }
        true
    }

    fn on_query_submitted(&mut self, text: String) {
        self.last_activity = self.clock;
        self.awaiting_reply = true;
        self.broadcast(EngineEvent::Conversation(ConversationTurn {
            sender: "user".to_string(),
            text: text.clone(),
            mode: None,
        }));
        self.shift_to(ConsciousnessState::Thinking, "user_query");
        spawner::thinking_burst(
            &mut self.sim,
            &mut self.rng,
            profile(ConsciousnessState::Thinking),
        );

        // The round trip settles back through the command channel so the
        // tick loop keeps animating while we wait.
        let tx = self.command_tx.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            let result = responder::respond(&config, &text).await;
            let _ = tx.send(EngineCommand::ResponseSettled(result)).await;
        });
    }

    fn on_response_settled(&mut self, result: Result<Reply, EngineError>) {
        self.awaiting_reply = false;
        self.last_activity = self.clock;
        match result {
            Ok(reply) => {
                self.shift_to(ConsciousnessState::Responding, "reply_settled");
                self.broadcast(EngineEvent::Conversation(ConversationTurn {
                    sender: "noctiluca".to_string(),
                    text: reply.text,
                    mode: Some(reply.mode),
                }));
                self.schedule_return(
                    ConsciousnessState::Idle,
                    "response_complete",
                    self.config.response_linger_secs,
                );
            }
            Err(e) => {
                self.broadcast(EngineEvent::Conversation(ConversationTurn {
                    sender: "noctiluca".to_string(),
                    text: format!("A disruption rippled through the field: {}", e),
                    mode: Some("error".to_string()),
                }));
                self.broadcast(EngineEvent::Notice(NoticeData {
                    level: "warn".to_string(),
                    text: e.to_string(),
                }));
                self.settle_to_idle("error");
            }
        }
    }

    fn on_voice_command(&mut self, text: &str) {
        self.last_activity = self.clock;
        let intent = adapter::parse_intent(text);
        if let Some(role) = intent.target_role() {
            if let Some(id) = self.find_role_orb(role) {
                self.on_orb_activated(id);
            }
            return;
        }
        match intent {
            VoiceIntent::Dream => {
                self.shift_to(ConsciousnessState::Dreaming, "voice_dream");
                self.schedule_return(
                    ConsciousnessState::Idle,
                    "dream_finished",
                    self.config.voice_dream_dwell_secs,
                );
            }
            VoiceIntent::Transcend => {
                self.shift_to(ConsciousnessState::Transcending, "voice_transcend");
                self.schedule_return(
                    ConsciousnessState::Idle,
                    "transcendence_finished",
                    self.config.transcend_dwell_secs,
                );
            }
            VoiceIntent::Meditate => {
                self.shift_to(ConsciousnessState::Meditating, "voice_meditate");
                self.schedule_return(
                    ConsciousnessState::Idle,
                    "meditation_finished",
                    self.config.meditate_dwell_secs,
                );
            }
            VoiceIntent::Query(q) => self.on_query_submitted(q),
            // Role-mapped intents were handled above.
            _ => {}
        }
    }

    fn on_pointer_move(&mut self, x: f64, y: f64) {
        let sample = self.shifts.sample(self.clock);
        let resonance = adapter::core_resonance(
            x,
            y,
            self.sim.core.pos.x,
            self.sim.core.pos.y,
            self.config.pointer_threshold,
        );
        if resonance <= 0.0 {
            return;
        }
        if self.rng.chance(sample.quantum_flux * resonance) {
            spawner::resonance_particle(&mut self.sim, &mut self.rng, x, y, resonance, &sample);
        }
        if self.rng.chance(sample.magnetic * resonance * 0.5) {
            spawner::magnetic_ripple(&mut self.sim, &mut self.rng, x, y, resonance, &sample);
        }
    }

    fn find_role_orb(&self, role: FunctionRole) -> Option<EntityId> {
        self.sim
            .functional
            .iter()
            .find(|o| o.role == Some(role))
            .map(|o| o.id)
    }

    fn on_orb_activated(&mut self, id: EntityId) {
        self.last_activity = self.clock;
        let Some(orb) = self.sim.find_orb(id) else {
            debug!("activation for unknown orb {}", id);
            return;
        };
        let (kind, role, label, pos, color, intensity) = (
            orb.kind,
            orb.role,
            orb.label.clone(),
            orb.pos,
            orb.color,
            orb.intensity,
        );

        spawner::explosion_burst(&mut self.sim, &mut self.rng, pos, color, intensity);

        match (kind, role) {
            (OrbKind::Core, _) => {
                self.shift_to(ConsciousnessState::Transcending, "core_transcend");
            }
            (OrbKind::Functional, Some(FunctionRole::Chat)) => {
                self.chat_open = true;
                self.shift_to(ConsciousnessState::Creating, "chat_open");
            }
            (
                OrbKind::Functional,
                Some(role @ (FunctionRole::Memory | FunctionRole::Tools | FunctionRole::Settings)),
            ) => {
                self.shift_to(
                    ConsciousnessState::Processing,
                    &format!("orb_expand_{}", role),
                );
                self.schedule(self.config.expand_delay_secs, Deferred::Expand { orb: id });
            }
            (OrbKind::Functional, _) => {
                self.shift_to(ConsciousnessState::Processing, "orb_click");
                self.schedule_return(
                    ConsciousnessState::Idle,
                    "orb_click_idle",
                    self.config.child_dwell_secs,
                );
            }
            (OrbKind::Child, _) => self.on_child_activated(&label),
            _ => debug!("{} orb {} is not interactive", kind, id),
        }
    }

    fn on_child_activated(&mut self, label: &str) {
        match label {
            "voice" => {
                self.speech_enabled = !self.speech_enabled;
                self.shift_to(ConsciousnessState::Processing, "voice_setting_toggle");
                self.schedule_return(ConsciousnessState::Idle, "voice_setting_idle", 2.0);
            }
            "visual" => {
                self.shift_to(ConsciousnessState::Dreaming, "visual_setting");
                self.schedule_return(ConsciousnessState::Idle, "visual_setting_idle", 10.0);
            }
            "privacy" => {
                self.shift_to(ConsciousnessState::Learning, "privacy_setting");
                self.schedule_return(ConsciousnessState::Idle, "privacy_setting_idle", 3.0);
            }
            "evolution" => {
                self.shift_to(ConsciousnessState::Evolving, "evolution_setting");
                self.schedule_return(ConsciousnessState::Idle, "evolution_setting_idle", 5.0);
            }
            other => {
                // Navigation children are handled by the hosting page.
                self.broadcast(EngineEvent::Notice(NoticeData {
                    level: "info".to_string(),
                    text: format!("navigate:{}", other),
                }));
                self.schedule_return(ConsciousnessState::Idle, "navigation", 2.0);
            }
        }
    }

    // ── The tick ──

    /// Advance the simulation one tick. Shift progress is sampled exactly
    /// once here and the same values feed spawner and physics.
    pub fn advance(&mut self, dt: f64) {
        self.clock += dt;
        self.tick += 1;

        self.run_deferred();
        self.check_idle_timeout();
        self.check_dream_schedule();

        let sample = self.shifts.sample(self.clock);
        let progress = self.shifts.linear_progress(self.clock);
        let state = self.shifts.current();
        let (spawn_target, spawn_progress) = match self.shifts.shift() {
            Some(s) => (s.to, progress.unwrap_or(1.0)),
            None => (state, 1.0),
        };

        spawner::run(
            &mut self.sim,
            &mut self.rng,
            &self.config,
            profile(spawn_target),
            spawn_progress,
            state,
            self.clock,
            dt,
        );
        physics::advance(
            &mut self.sim,
            &sample,
            state,
            progress,
            self.clock,
            dt,
            &mut self.rng,
        );

        if let Some(done) = self.shifts.finish_if_done(self.clock) {
            info!("consciousness settled: {} -> {} ({})", done.from, done.to, done.reason);
            self.broadcast(EngineEvent::State(StateChange {
                from: done.from,
                to: done.to,
                reason: done.reason,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }));
        }

        self.broadcast(EngineEvent::Snapshot(Box::new(self.snapshot())));
    }

    fn run_deferred(&mut self) {
        let clock = self.clock;
        let mut due = Vec::new();
        self.pending.retain(|s| {
            if s.due <= clock {
                due.push(s.action.clone());
                false
            } else {
                true
            }
        });
        for action in due {
            match action {
                Deferred::Return { to, reason } => {
                    self.shift_to(to, &reason);
                }
                Deferred::Expand { orb } => {
                    let spawned = spawner::expand_orb(&mut self.sim, &mut self.rng, orb);
                    if spawned > 0 {
                        self.schedule(
                            self.config.child_dwell_secs,
                            Deferred::CollapseChildren { parent: orb },
                        );
                        self.schedule_return(
                            ConsciousnessState::Idle,
                            "orb_collapse",
                            self.config.child_dwell_secs,
                        );
                    }
                }
                Deferred::CollapseChildren { parent } => {
                    let removed = self.sim.collapse_children(parent);
                    debug!("collapsed {} child orbs of {}", removed, parent);
                }
            }
        }
    }

    fn check_idle_timeout(&mut self) {
        if self.chat_open || self.awaiting_reply {
            return;
        }
        let current = self.shifts.current();
        // Dreaming is deliberately exempt — dreams end on their own timer.
        if matches!(
            current,
            ConsciousnessState::Idle | ConsciousnessState::Dreaming
        ) {
            return;
        }
        if self.shifts.target() == ConsciousnessState::Idle {
            return;
        }
        if self.clock - self.last_activity >= self.config.idle_timeout_secs {
            self.shift_to(ConsciousnessState::Idle, "inactivity");
            self.last_activity = self.clock;
        }
    }

    fn check_dream_schedule(&mut self) {
        if self.clock < self.next_dream_check {
            return;
        }
        self.next_dream_check = self.clock + self.config.dream_check_secs;
        let settled_idle =
            self.shifts.current() == ConsciousnessState::Idle && self.shifts.shift().is_none();
        if settled_idle && !self.chat_open && self.rng.chance(self.config.dream_chance) {
            self.shift_to(ConsciousnessState::Dreaming, "periodic_dream");
            self.schedule_return(
                ConsciousnessState::Idle,
                "dream_cycle_end",
                self.config.dream_dwell_secs,
            );
        }
    }

    fn snapshot(&self) -> Snapshot {
        let sim = &self.sim;
        let mut particles = Vec::with_capacity(sim.particle_census());
        particles.extend(sim.particles.iter().cloned());
        particles.extend(sim.flux.iter().cloned());
        particles.extend(sim.holograms.iter().cloned());
        particles.extend(sim.plasma.iter().cloned());
        particles.extend(sim.magnetic.iter().cloned());
        particles.extend(sim.resonance.iter().cloned());

        Snapshot {
            tick: self.tick,
            state: self.shifts.current(),
            transition_progress: self.shifts.linear_progress(self.clock),
            core_orb: sim.core.clone(),
            functional_orbs: sim.functional.clone(),
            thought_orbs: sim.thoughts.clone(),
            dream_orbs: sim.dreams.clone(),
            particles,
            connections: sim.connections.clone(),
            branch_structures: sim.branches.clone(),
        }
    }

    // ── Main loop ──

    /// View mounted: run until a Stop command arrives. The interval, the
    /// dream scheduler, and every pending deadline die with this task.
    pub async fn run(&mut self) {
        info!(
            "noctiluca waking up: {} orbs, {:.0} Hz",
            self.sim.functional.len() + 1,
            self.config.tick_hz
        );

        let mut command_rx = self.command_rx.take().expect("command_rx already taken");
        let dt = self.config.tick_dt();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs_f64(dt));
        // Degrade gracefully when the host can't sustain the tick rate.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut running = true;
        while running {
            interval.tick().await;

            while let Ok(cmd) = command_rx.try_recv() {
                if !self.handle_command(cmd) {
                    running = false;
                    break;
                }
            }
            if !running {
                break;
            }

            self.advance(dt);
        }

        info!("noctiluca going dark after {} ticks", self.tick);
    }
}
