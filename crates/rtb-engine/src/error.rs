//! Error types for the battle engine.

use rtb_protocol::CommandError;
use rtb_session::Role;

/// Errors a battle step can report.
///
/// All of them are recoverable: the caller logs and keeps ticking. The
/// worst outcome is an abandoned round or a battle that never starts.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The peer's message does not fit this game, or its payload failed
    /// a shape check before replay. The message is discarded.
    #[error("protocol mismatch ({reason}): {message}")]
    ProtocolMismatch {
        message: String,
        reason: &'static str,
    },

    /// A digirom string failed to parse.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// No machine is registered for this battle type and role.
    #[error("{battle_type} not implemented for {role}")]
    UnrecognizedVariant { battle_type: String, role: Role },
}
