//! Unified error type for the RTB crates.

use rtb_engine::EngineError;
use rtb_protocol::ProtocolError;
use rtb_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically. None of these are fatal to the device: the
/// driver logs them and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum RtbError {
    /// An envelope failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An app-feed message could not start a session.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A battle machine rejected a peer message or could not be built.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use rtb_session::Role;

    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let rtb_err: RtbError = err.into();
        assert!(matches!(rtb_err, RtbError::Protocol(_)));
        assert!(rtb_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::MissingField("topic");
        let rtb_err: RtbError = err.into();
        assert!(matches!(rtb_err, RtbError::Session(_)));
        assert!(rtb_err.to_string().contains("topic"));
    }

    #[test]
    fn test_from_engine_error() {
        let err = EngineError::UnrecognizedVariant {
            battle_type: "dmog".into(),
            role: Role::Guest,
        };
        let rtb_err: RtbError = err.into();
        assert!(matches!(rtb_err, RtbError::Engine(_)));
        assert_eq!(rtb_err.to_string(), "dmog not implemented for guest");
    }
}
