//! The external query collaborator — templated, no reasoning.
//!
//! The engine only cares about start/settle timing; the reply content is
//! canned. Template choice is derived from the query so runs stay
//! reproducible.

use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub mode: String,
}

const TEMPLATES: &[&str] = &[
    "I hear the shape of your question — \"{query}\". Let me turn it in the light: the patterns I can reach suggest more than one path forward, and I'd rather walk the honest one with you than the impressive one.",
    "\"{query}\" — a good question to sit with. I've gathered what I hold about it and traced the edges; here is what stands out, and what I'm still uncertain about.",
    "You asked: \"{query}\". Pulling the threads together, a few things align. I'll keep the answer small and true rather than wide and vague.",
];

/// Pick a response mode from surface features of the query.
pub fn select_mode(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if q.contains("remember") || q.contains("memory") || q.contains("feel") {
        "reflective"
    } else if q.contains("how") || q.contains("why") || q.contains("what") {
        "analytical"
    } else if q.contains('?') {
        "curious"
    } else {
        "creative"
    }
}

/// Deterministic template index for a query.
fn template_index(query: &str) -> usize {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.finalize()[0] as usize % TEMPLATES.len()
}

/// Pure reply composition, separated from the timing wrapper for tests.
pub fn compose_reply(query: &str) -> Reply {
    let template = TEMPLATES[template_index(query)];
    Reply {
        text: template.replace("{query}", query.trim()),
        mode: select_mode(query).to_string(),
    }
}

/// The full round trip: validate, simulate latency, compose. The engine
/// awaits this off the tick loop.
pub async fn respond(config: &EngineConfig, query: &str) -> Result<Reply, EngineError> {
    if query.trim().is_empty() {
        return Err(EngineError::Responder("empty query".to_string()));
    }
    tokio::time::sleep(std::time::Duration::from_secs_f64(
        config.responder_delay_secs,
    ))
    .await;
    Ok(compose_reply(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        assert_eq!(select_mode("do you remember last week"), "reflective");
        assert_eq!(select_mode("how does this work"), "analytical");
        assert_eq!(select_mode("ready?"), "curious");
        assert_eq!(select_mode("paint me a sunrise"), "creative");
    }

    #[test]
    fn test_compose_is_deterministic_and_embeds_query() {
        let a = compose_reply("where do thoughts go");
        let b = compose_reply("where do thoughts go");
        assert_eq!(a, b);
        assert!(a.text.contains("where do thoughts go"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_rejected_without_latency() {
        let config = EngineConfig::default();
        let result = respond(&config, "   ").await;
        assert!(matches!(result, Err(EngineError::Responder(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_settles_after_latency() {
        let config = EngineConfig::default();
        let reply = respond(&config, "hello there").await.unwrap();
        assert!(!reply.text.is_empty());
        assert!(!reply.mode.is_empty());
    }
}
