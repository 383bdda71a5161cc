//! Input translation — voice intents and pointer resonance.

use crate::types::FunctionRole;

/// What a recognized utterance asks the avatar to do.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceIntent {
    ShowMemory,
    ShowTools,
    OpenSettings,
    Dream,
    Chat,
    Transcend,
    Meditate,
    /// Anything unmatched is forwarded to the query path.
    Query(String),
}

impl VoiceIntent {
    /// The functional orb this intent activates, if it maps to one.
    pub fn target_role(&self) -> Option<FunctionRole> {
        match self {
            VoiceIntent::ShowMemory => Some(FunctionRole::Memory),
            VoiceIntent::ShowTools => Some(FunctionRole::Tools),
            VoiceIntent::OpenSettings => Some(FunctionRole::Settings),
            VoiceIntent::Chat => Some(FunctionRole::Chat),
            _ => None,
        }
    }
}

/// Match an utterance against the small fixed keyword set. Matching is
/// case-insensitive substring search; first hit wins, in this order.
pub fn parse_intent(text: &str) -> VoiceIntent {
    let cmd = text.to_lowercase();
    if cmd.contains("show memory") || cmd.contains("open memories") {
        VoiceIntent::ShowMemory
    } else if cmd.contains("show tools") || cmd.contains("open tools") {
        VoiceIntent::ShowTools
    } else if cmd.contains("settings") || cmd.contains("configure") {
        VoiceIntent::OpenSettings
    } else if cmd.contains("dream") || cmd.contains("relax") {
        VoiceIntent::Dream
    } else if cmd.contains("chat") || cmd.contains("talk") {
        VoiceIntent::Chat
    } else if cmd.contains("transcend") || cmd.contains("ascend") {
        VoiceIntent::Transcend
    } else if cmd.contains("meditate") || cmd.contains("calm") {
        VoiceIntent::Meditate
    } else {
        VoiceIntent::Query(text.to_string())
    }
}

/// Pointer-to-core resonance: 1.0 on the core, falling linearly to 0 at
/// `threshold` distance.
pub fn core_resonance(x: f64, y: f64, core_x: f64, core_y: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    let dx = x - core_x;
    let dy = y - core_y;
    let distance = (dx * dx + dy * dy).sqrt();
    (1.0 - distance / threshold).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_intents() {
        assert_eq!(parse_intent("please show memory"), VoiceIntent::ShowMemory);
        assert_eq!(parse_intent("Open Memories now"), VoiceIntent::ShowMemory);
        assert_eq!(parse_intent("show tools"), VoiceIntent::ShowTools);
        assert_eq!(parse_intent("go to settings"), VoiceIntent::OpenSettings);
        assert_eq!(parse_intent("time to DREAM"), VoiceIntent::Dream);
        assert_eq!(parse_intent("let's talk"), VoiceIntent::Chat);
        assert_eq!(parse_intent("transcend"), VoiceIntent::Transcend);
        assert_eq!(parse_intent("stay calm"), VoiceIntent::Meditate);
    }

    #[test]
    fn test_unmatched_text_becomes_a_query() {
        let intent = parse_intent("what's the weather on Europa?");
        assert_eq!(
            intent,
            VoiceIntent::Query("what's the weather on Europa?".to_string())
        );
    }

    #[test]
    fn test_intent_roles() {
        assert_eq!(
            parse_intent("show memory").target_role(),
            Some(FunctionRole::Memory)
        );
        assert_eq!(parse_intent("meditate").target_role(), None);
    }

    #[test]
    fn test_resonance_peaks_at_core() {
        assert_eq!(core_resonance(500.0, 500.0, 500.0, 500.0, 400.0), 1.0);
    }

    #[test]
    fn test_resonance_fades_to_zero() {
        assert_eq!(core_resonance(1000.0, 500.0, 500.0, 500.0, 400.0), 0.0);
        let mid = core_resonance(700.0, 500.0, 500.0, 500.0, 400.0);
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_resonance_degenerate_threshold() {
        assert_eq!(core_resonance(0.0, 0.0, 0.0, 0.0, 0.0), 0.0);
    }
}
