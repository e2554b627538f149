use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Role, RoundStatus};
use tokio::sync::RwLock;

use super::error::StoreError;
use super::traits::{ArenaStore, ClosurePlanner};
use crate::model::{
    ClosureSnapshot, FinalRating, NewParticipant, NewRound, Participant, PeerVote, Round,
    RoundDetail, RoundPatch, Submission, VoteKey,
};

struct RoundRecord {
    round: Round,
    votes: BTreeMap<VoteKey, PeerVote>,
    submissions: BTreeMap<i32, Submission>,
    ratings: Vec<FinalRating>,
}

#[derive(Default)]
struct State {
    last_round_id: i32,
    last_participant_id: i32,
    rounds: BTreeMap<i32, RoundRecord>,
    participants: BTreeMap<i32, Participant>,
}

impl State {
    fn active_round_mut(&mut self, round_id: i32) -> Result<&mut RoundRecord, StoreError> {
        let record = self
            .rounds
            .get_mut(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        if !record.round.status.is_active() {
            return Err(StoreError::RoundNotActive(round_id));
        }
        Ok(record)
    }
}

/// In-process store. Every operation runs under a single lock, which makes
/// each trait method atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArenaStore for MemoryStore {
    async fn insert_round_if_none_active(&self, new: NewRound) -> Result<Round, StoreError> {
        let mut state = self.state.write().await;
        if state.rounds.values().any(|r| r.round.status.is_active()) {
            return Err(StoreError::ActiveRoundExists);
        }

        state.last_round_id += 1;
        let now = Utc::now();
        let round = Round {
            id: state.last_round_id,
            title: new.title,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            status: RoundStatus::Active,
            created_by: new.created_by,
            winner_id: None,
            winner_points: 0,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.rounds.insert(
            round.id,
            RoundRecord {
                round: round.clone(),
                votes: BTreeMap::new(),
                submissions: BTreeMap::new(),
                ratings: Vec::new(),
            },
        );
        Ok(round)
    }

    async fn find_round(&self, id: i32) -> Result<Option<Round>, StoreError> {
        let state = self.state.read().await;
        Ok(state.rounds.get(&id).map(|r| r.round.clone()))
    }

    async fn find_active_round(&self) -> Result<Option<Round>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rounds
            .values()
            .find(|r| r.round.status.is_active())
            .map(|r| r.round.clone()))
    }

    async fn latest_decided_round(&self) -> Result<Option<Round>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rounds
            .values()
            .map(|r| &r.round)
            .filter(|r| r.status == RoundStatus::Closed && r.winner_id.is_some())
            .max_by_key(|r| (r.end_date, r.id))
            .cloned())
    }

    async fn list_rounds(&self) -> Result<Vec<Round>, StoreError> {
        let state = self.state.read().await;
        let mut rounds: Vec<Round> = state.rounds.values().map(|r| r.round.clone()).collect();
        rounds.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(rounds)
    }

    async fn count_rounds(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.rounds.len() as u64)
    }

    async fn update_round(&self, id: i32, patch: RoundPatch) -> Result<Round, StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .rounds
            .get_mut(&id)
            .ok_or(StoreError::RoundNotFound(id))?;
        patch.apply_to(&mut record.round);
        record.round.updated_at = Utc::now();
        Ok(record.round.clone())
    }

    async fn delete_round(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .rounds
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RoundNotFound(id))
    }

    async fn upsert_vote(&self, round_id: i32, vote: PeerVote) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let candidate_known = state.participants.contains_key(&vote.candidate_id);
        let record = state.active_round_mut(round_id)?;
        if !candidate_known {
            return Err(StoreError::ParticipantNotFound(vote.candidate_id));
        }
        record.votes.insert(vote.key(), vote);
        Ok(())
    }

    async fn upsert_submission(
        &self,
        round_id: i32,
        submission: Submission,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let record = state.active_round_mut(round_id)?;
        record
            .submissions
            .insert(submission.participant_id, submission);
        Ok(())
    }

    async fn round_votes(&self, round_id: i32) -> Result<Vec<PeerVote>, StoreError> {
        let state = self.state.read().await;
        let record = state
            .rounds
            .get(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        Ok(record.votes.values().cloned().collect())
    }

    async fn candidate_votes(
        &self,
        round_id: i32,
        candidate_id: i32,
    ) -> Result<Vec<PeerVote>, StoreError> {
        let state = self.state.read().await;
        let record = state
            .rounds
            .get(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        Ok(record
            .votes
            .values()
            .filter(|v| v.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn round_submissions(&self, round_id: i32) -> Result<Vec<Submission>, StoreError> {
        let state = self.state.read().await;
        let record = state
            .rounds
            .get(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        Ok(record.submissions.values().cloned().collect())
    }

    async fn round_ratings(&self, round_id: i32) -> Result<Vec<FinalRating>, StoreError> {
        let state = self.state.read().await;
        let record = state
            .rounds
            .get(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        Ok(record.ratings.clone())
    }

    async fn close_round(
        &self,
        round_id: i32,
        closed_at: DateTime<Utc>,
        planner: &ClosurePlanner,
    ) -> Result<RoundDetail, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let record = state
            .rounds
            .get(&round_id)
            .ok_or(StoreError::RoundNotFound(round_id))?;
        if !record.round.status.is_active() {
            return Err(StoreError::RoundNotActive(round_id));
        }
        let snapshot = ClosureSnapshot {
            round: record.round.clone(),
            votes: record.votes.values().cloned().collect(),
            submissions: record.submissions.values().cloned().collect(),
            participants: state
                .participants
                .values()
                .filter(|p| p.role == Role::Participant)
                .cloned()
                .collect(),
        };
        let plan = planner(&snapshot);

        // Every target must exist before anything is written.
        if let Some(missing) = plan
            .ledger
            .iter()
            .find(|u| !state.participants.contains_key(&u.participant_id))
        {
            return Err(StoreError::ParticipantNotFound(missing.participant_id));
        }

        for update in &plan.ledger {
            if let Some(participant) = state.participants.get_mut(&update.participant_id) {
                participant.apply(update);
            }
        }

        let record = state.active_round_mut(round_id)?;
        record.ratings = plan.ratings;
        record.round.status = RoundStatus::Closed;
        record.round.winner_id = plan.winner.map(|w| w.participant_id);
        record.round.winner_points = plan.winner.map_or(0, |w| w.points);
        record.round.closed_at = Some(closed_at);
        record.round.updated_at = closed_at;
        Ok(RoundDetail {
            round: record.round.clone(),
            votes: snapshot.votes,
            submissions: snapshot.submissions,
            ratings: record.ratings.clone(),
        })
    }

    async fn insert_participant(
        &self,
        new: NewParticipant,
    ) -> Result<Participant, StoreError> {
        let mut state = self.state.write().await;
        if state.participants.values().any(|p| p.email == new.email) {
            return Err(StoreError::Duplicate("email".into()));
        }

        state.last_participant_id += 1;
        let participant = Participant {
            id: state.last_participant_id,
            name: new.name,
            email: new.email,
            role: new.role,
            total_points: 0,
            total_votes_received: 0,
            streak: 0,
            latest_rating: 0,
            last_participated_round_end: None,
            created_at: Utc::now(),
        };
        state
            .participants
            .insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn find_participant(&self, id: i32) -> Result<Option<Participant>, StoreError> {
        Ok(self.state.read().await.participants.get(&id).cloned())
    }

    async fn list_participants(&self, role: Option<Role>) -> Result<Vec<Participant>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .filter(|p| role.is_none_or(|r| p.role == r))
            .cloned()
            .collect())
    }

    async fn count_participants(&self, role: Option<Role>) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .filter(|p| role.is_none_or(|r| p.role == r))
            .count() as u64)
    }

    async fn delete_participants(&self, ids: &[i32]) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let removed = ids
            .iter()
            .filter(|id| state.participants.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }
}
