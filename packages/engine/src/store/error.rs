use std::fmt;

/// Errors reported by an [`ArenaStore`](super::ArenaStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A conditional round insert found another active round.
    ActiveRoundExists,
    /// A unique field collided. Contains the field name.
    Duplicate(String),
    RoundNotFound(i32),
    ParticipantNotFound(i32),
    /// A write required an active round.
    RoundNotActive(i32),
    /// Backend failure (connection, query, serialization).
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveRoundExists => write!(f, "an active round already exists"),
            Self::Duplicate(field) => write!(f, "duplicate value for {field}"),
            Self::RoundNotFound(id) => write!(f, "round {id} not found"),
            Self::ParticipantNotFound(id) => write!(f, "participant {id} not found"),
            Self::RoundNotActive(id) => write!(f, "round {id} is not active"),
            Self::Backend(msg) => write!(f, "store backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
