use super::state::Phase;
use thiserror::Error;

/// Failures scoped to a single session operation. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Both seats are taken; the connection is rejected before admission
    #[error("session is full")]
    SessionFull,

    #[error("cannot submit while the session is {0}")]
    InvalidPhase(Phase),

    #[error("submission must not be empty")]
    EmptyContent,

    #[error("you have already submitted")]
    AlreadySubmitted,

    /// Stale or already-closed connection; callers drop it silently
    #[error("unknown participant")]
    UnknownParticipant,
}
