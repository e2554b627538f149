use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by every engine operation.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Start of a time window is not before its end.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Duplicate active round or duplicate unique field.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Operation not legal for the round's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("missing capability '{0}'")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, ArenaError>;

impl From<StoreError> for ArenaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveRoundExists => {
                ArenaError::Conflict("An active round already exists".into())
            }
            StoreError::Duplicate(field) => ArenaError::Conflict(format!("{field} already taken")),
            StoreError::RoundNotFound(_) => ArenaError::NotFound("Round".into()),
            StoreError::ParticipantNotFound(_) => ArenaError::NotFound("Participant".into()),
            StoreError::RoundNotActive(_) => ArenaError::InvalidState("Round is not active".into()),
            StoreError::Backend(detail) => ArenaError::Store(detail),
        }
    }
}
