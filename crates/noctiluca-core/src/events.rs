//! EngineEvent enum — broadcast from the engine to frontends via
//! tokio::broadcast.

use serde::{Deserialize, Serialize};

use crate::profile::ConsciousnessState;
use crate::types::{BranchStructure, Connection, Orb, Particle};

/// The renderer-agnostic per-tick output: pure data, drawn by whatever
/// frontend subscribed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub state: ConsciousnessState,
    /// Linear progress of the in-flight shift, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_progress: Option<f64>,
    pub core_orb: Orb,
    pub functional_orbs: Vec<Orb>,
    pub thought_orbs: Vec<Orb>,
    pub dream_orbs: Vec<Orb>,
    pub particles: Vec<Particle>,
    pub connections: Vec<Connection>,
    pub branch_structures: Vec<BranchStructure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ConsciousnessState,
    pub to: ConsciousnessState,
    pub reason: String,
    pub timestamp: String,
}

/// One side of the in-band conversation surfaced alongside the avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: String, // "user" | "noctiluca"
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeData {
    pub level: String, // "info" | "warn"
    pub text: String,
}

/// Events broadcast from the engine task to all subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum EngineEvent {
    /// Full entity snapshot, emitted once per tick.
    #[serde(rename = "snapshot")]
    Snapshot(Box<Snapshot>),

    /// A state shift committed.
    #[serde(rename = "state")]
    State(StateChange),

    /// An in-band conversation turn (user query or avatar reply).
    #[serde(rename = "conversation")]
    Conversation(ConversationTurn),

    /// Non-fatal notice for the hosting collaborator (input errors,
    /// navigation hints from child orbs).
    #[serde(rename = "notice")]
    Notice(NoticeData),
}

impl EngineEvent {
    /// Serialize to the JSON shape frontends expect:
    /// `{"event": "...", "data": {...}}`
    pub fn to_ws_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
