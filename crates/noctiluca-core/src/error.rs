//! Engine error taxonomy. Nothing here is fatal to the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An input source (microphone, pointer stream) could not be acquired.
    /// Recovered by returning to idle with reason `input_error`.
    #[error("input source unavailable: {0}")]
    InputAcquisition(String),

    /// The external query round trip failed. Recovered by emitting a
    /// synthetic in-band error message and returning to idle; never retried.
    #[error("responder failed: {0}")]
    Responder(String),

    /// A command was sent to an engine that has already stopped.
    #[error("engine is not running")]
    NotRunning,
}
