//! Contest round lifecycle and scoring.
//!
//! A round is opened, collects peer votes and submissions while active, and
//! is closed exactly once. Closure resolves every participant's stars,
//! folds them into the participant ledgers and picks the winner, all in one
//! atomic store commit.

pub mod actor;
pub mod closure;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod participants;
pub mod scoring;
pub mod store;
pub mod votes;
pub mod winner;

pub use actor::Actor;
pub use error::{ArenaError, Result};
pub use lifecycle::{RoundDraft, RoundManager};
pub use notify::{Notifier, TracingNotifier};
pub use participants::{ParticipantDraft, ParticipantRegistry};
pub use scoring::ManualRating;
pub use store::{ArenaStore, MemoryStore, StoreError};
pub use votes::{VoteAggregator, VoteTally};
