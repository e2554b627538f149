//! Peer vote recording and per-candidate aggregation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::permission;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::actor::Actor;
use crate::error::{ArenaError, Result};
use crate::model::PeerVote;
use crate::store::ArenaStore;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

/// Sum and count of the ratings one candidate received in a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub sum: i32,
    pub count: i32,
}

impl VoteTally {
    pub fn add(&mut self, rating: i32) {
        self.sum += rating;
        self.count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Group a round's votes by candidate.
pub fn tally(votes: &[PeerVote]) -> HashMap<i32, VoteTally> {
    let mut tallies: HashMap<i32, VoteTally> = HashMap::new();
    for vote in votes {
        tallies.entry(vote.candidate_id).or_default().add(vote.rating);
    }
    tallies
}

/// Reject self-votes and out-of-scale ratings.
pub fn validate_vote(voter_id: i32, candidate_id: i32, rating: i32) -> Result<()> {
    if voter_id == candidate_id {
        return Err(ArenaError::Validation("You cannot vote for yourself".into()));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ArenaError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

pub struct VoteAggregator {
    store: Arc<dyn ArenaStore>,
}

impl VoteAggregator {
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self { store }
    }

    /// Record `actor`'s vote for `candidate_id`, replacing any earlier vote
    /// for the same pair.
    #[instrument(skip(self, actor, comment), fields(voter = actor.participant_id))]
    pub async fn cast_vote(
        &self,
        actor: &Actor,
        round_id: i32,
        candidate_id: i32,
        rating: i32,
        comment: Option<String>,
    ) -> Result<()> {
        actor.require_permission(permission::ROUND_PARTICIPATE)?;
        validate_vote(actor.participant_id, candidate_id, rating)?;

        let vote = PeerVote {
            voter_id: actor.participant_id,
            candidate_id,
            rating,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            updated_at: Utc::now(),
        };
        self.store.upsert_vote(round_id, vote).await?;

        debug!("Vote recorded");
        Ok(())
    }

    /// (sum, count) of the votes `candidate_id` received in `round_id`.
    pub async fn aggregate_for(&self, round_id: i32, candidate_id: i32) -> Result<VoteTally> {
        let votes = self.store.candidate_votes(round_id, candidate_id).await?;
        Ok(votes
            .iter()
            .fold(VoteTally::default(), |mut acc, v| {
                acc.add(v.rating);
                acc
            }))
    }
}
