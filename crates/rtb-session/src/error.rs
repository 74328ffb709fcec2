//! Error types for the session layer.

/// Errors raised while turning an app-feed message into a session.
///
/// None of these are fatal: the message is dropped, logged, and the
/// device keeps listening.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A `subscribe` message lacked a field a battle needs.
    #[error("subscribe message is missing `{0}`")]
    MissingField(&'static str),

    /// `user_type` was neither `host` nor `guest`.
    #[error("unknown user type {0:?}")]
    UnknownRole(String),
}
