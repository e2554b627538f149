use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Role;

use super::error::StoreError;
use crate::model::{
    ClosurePlan, ClosureSnapshot, FinalRating, NewParticipant, NewRound, Participant, PeerVote,
    Round, RoundDetail, RoundPatch, Submission,
};

/// Pure function computing every closure write from a snapshot.
pub type ClosurePlanner = dyn Fn(&ClosureSnapshot) -> ClosurePlan + Send + Sync;

/// Record store backing the engine.
///
/// Operations that guard an invariant (`insert_round_if_none_active`,
/// `upsert_vote`, `upsert_submission`, `close_round`) must run atomically
/// with respect to each other.
#[async_trait]
pub trait ArenaStore: Send + Sync {
    /// Insert an active round unless one already exists.
    ///
    /// Fails with [`StoreError::ActiveRoundExists`] otherwise.
    async fn insert_round_if_none_active(&self, round: NewRound) -> Result<Round, StoreError>;

    async fn find_round(&self, id: i32) -> Result<Option<Round>, StoreError>;

    async fn find_active_round(&self) -> Result<Option<Round>, StoreError>;

    /// Most recent closed round (by end date) that has a winner.
    async fn latest_decided_round(&self) -> Result<Option<Round>, StoreError>;

    /// All rounds sorted by start date, newest first.
    async fn list_rounds(&self) -> Result<Vec<Round>, StoreError>;

    async fn count_rounds(&self) -> Result<u64, StoreError>;

    /// Apply a patch regardless of status.
    async fn update_round(&self, id: i32, patch: RoundPatch) -> Result<Round, StoreError>;

    /// Remove a round with its votes, submissions and ratings.
    async fn delete_round(&self, id: i32) -> Result<(), StoreError>;

    /// Insert or replace the vote keyed by (voter, candidate).
    ///
    /// Fails with [`StoreError::RoundNotActive`] unless the round is active
    /// at the moment of the write.
    async fn upsert_vote(&self, round_id: i32, vote: PeerVote) -> Result<(), StoreError>;

    /// Insert or replace a participant's submission. Same status rule as votes.
    async fn upsert_submission(
        &self,
        round_id: i32,
        submission: Submission,
    ) -> Result<(), StoreError>;

    async fn round_votes(&self, round_id: i32) -> Result<Vec<PeerVote>, StoreError>;

    /// Votes received by `candidate_id` in `round_id`.
    async fn candidate_votes(
        &self,
        round_id: i32,
        candidate_id: i32,
    ) -> Result<Vec<PeerVote>, StoreError>;

    async fn round_submissions(&self, round_id: i32) -> Result<Vec<Submission>, StoreError>;

    async fn round_ratings(&self, round_id: i32) -> Result<Vec<FinalRating>, StoreError>;

    /// Close an active round in one atomic step.
    ///
    /// Takes a snapshot under the round lock, runs `planner` on it and
    /// commits the resulting ledger updates, ratings and round state
    /// together. Nothing is written if any step fails.
    ///
    /// Returns the closed round with the votes and submissions it was scored
    /// from and the ratings that were stored.
    async fn close_round(
        &self,
        round_id: i32,
        closed_at: DateTime<Utc>,
        planner: &ClosurePlanner,
    ) -> Result<RoundDetail, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the e-mail is taken.
    async fn insert_participant(&self, participant: NewParticipant)
    -> Result<Participant, StoreError>;

    async fn find_participant(&self, id: i32) -> Result<Option<Participant>, StoreError>;

    /// Participants sorted by id, optionally filtered by role.
    async fn list_participants(&self, role: Option<Role>) -> Result<Vec<Participant>, StoreError>;

    async fn count_participants(&self, role: Option<Role>) -> Result<u64, StoreError>;

    /// Returns the number of participants removed.
    async fn delete_participants(&self, ids: &[i32]) -> Result<u64, StoreError>;
}
