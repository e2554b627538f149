//! PostgreSQL-backed [`ArenaStore`].
//!
//! Every write that guards an invariant runs in its own transaction and
//! takes a `FOR UPDATE` lock on the round row first, so votes, submissions
//! and closure of the same round are serialized. The single active round is
//! enforced by the unique `active_slot` column.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Role, RoundStatus};
use engine::model::{
    ClosureSnapshot, FinalRating, NewParticipant, NewRound, Participant, PeerVote, Round,
    RoundDetail, RoundPatch, Submission,
};
use engine::store::{ArenaStore, ClosurePlanner, StoreError};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{final_rating, participant, peer_vote, round, submission};

pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Load a round with a row lock, rejecting it unless it is active.
async fn lock_active_round<C: ConnectionTrait>(
    conn: &C,
    round_id: i32,
) -> Result<round::Model, StoreError> {
    let model = round::Entity::find_by_id(round_id)
        .lock(LockType::Update)
        .one(conn)
        .await
        .map_err(backend)?
        .ok_or(StoreError::RoundNotFound(round_id))?;
    if !model.status.is_active() {
        return Err(StoreError::RoundNotActive(round_id));
    }
    Ok(model)
}

async fn ensure_round<C: ConnectionTrait>(conn: &C, round_id: i32) -> Result<(), StoreError> {
    let found = round::Entity::find_by_id(round_id)
        .count(conn)
        .await
        .map_err(backend)?;
    if found == 0 {
        return Err(StoreError::RoundNotFound(round_id));
    }
    Ok(())
}

async fn fetch_votes<C: ConnectionTrait>(
    conn: &C,
    round_id: i32,
) -> Result<Vec<PeerVote>, StoreError> {
    Ok(peer_vote::Entity::find()
        .filter(peer_vote::Column::RoundId.eq(round_id))
        .order_by_asc(peer_vote::Column::VoterId)
        .order_by_asc(peer_vote::Column::CandidateId)
        .all(conn)
        .await
        .map_err(backend)?
        .into_iter()
        .map(PeerVote::from)
        .collect())
}

async fn fetch_submissions<C: ConnectionTrait>(
    conn: &C,
    round_id: i32,
) -> Result<Vec<Submission>, StoreError> {
    Ok(submission::Entity::find()
        .filter(submission::Column::RoundId.eq(round_id))
        .order_by_asc(submission::Column::ParticipantId)
        .all(conn)
        .await
        .map_err(backend)?
        .into_iter()
        .map(Submission::from)
        .collect())
}

#[async_trait]
impl ArenaStore for SeaOrmStore {
    #[instrument(skip(self, new))]
    async fn insert_round_if_none_active(&self, new: NewRound) -> Result<Round, StoreError> {
        let now = Utc::now();
        let model = round::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            start_date: Set(new.start_date),
            end_date: Set(new.end_date),
            status: Set(RoundStatus::Active),
            active_slot: Set(Some(true)),
            created_by: Set(new.created_by),
            winner_id: Set(None),
            winner_points: Set(0),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted.into()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::ActiveRoundExists),
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_round(&self, id: i32) -> Result<Option<Round>, StoreError> {
        Ok(round::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(Round::from))
    }

    async fn find_active_round(&self) -> Result<Option<Round>, StoreError> {
        Ok(round::Entity::find()
            .filter(round::Column::Status.eq(RoundStatus::Active))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(Round::from))
    }

    async fn latest_decided_round(&self) -> Result<Option<Round>, StoreError> {
        Ok(round::Entity::find()
            .filter(round::Column::Status.eq(RoundStatus::Closed))
            .filter(round::Column::WinnerId.is_not_null())
            .order_by_desc(round::Column::EndDate)
            .order_by_desc(round::Column::Id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(Round::from))
    }

    async fn list_rounds(&self) -> Result<Vec<Round>, StoreError> {
        Ok(round::Entity::find()
            .order_by_desc(round::Column::StartDate)
            .order_by_desc(round::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Round::from)
            .collect())
    }

    async fn count_rounds(&self) -> Result<u64, StoreError> {
        round::Entity::find().count(&self.db).await.map_err(backend)
    }

    #[instrument(skip(self, patch))]
    async fn update_round(&self, id: i32, patch: RoundPatch) -> Result<Round, StoreError> {
        let model = round::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or(StoreError::RoundNotFound(id))?;

        let mut active: round::ActiveModel = model.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(start_date) = patch.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = patch.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await.map_err(backend)?.into())
    }

    #[instrument(skip(self))]
    async fn delete_round(&self, id: i32) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;

        peer_vote::Entity::delete_many()
            .filter(peer_vote::Column::RoundId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        submission::Entity::delete_many()
            .filter(submission::Column::RoundId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        final_rating::Entity::delete_many()
            .filter(final_rating::Column::RoundId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;

        let result = round::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::RoundNotFound(id));
        }

        txn.commit().await.map_err(backend)
    }

    #[instrument(skip(self, vote), fields(voter = vote.voter_id, candidate = vote.candidate_id))]
    async fn upsert_vote(&self, round_id: i32, vote: PeerVote) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;
        lock_active_round(&txn, round_id).await?;

        let candidate = participant::Entity::find_by_id(vote.candidate_id)
            .one(&txn)
            .await
            .map_err(backend)?;
        if candidate.is_none() {
            return Err(StoreError::ParticipantNotFound(vote.candidate_id));
        }

        let model = peer_vote::ActiveModel {
            round_id: Set(round_id),
            voter_id: Set(vote.voter_id),
            candidate_id: Set(vote.candidate_id),
            rating: Set(vote.rating),
            comment: Set(vote.comment),
            updated_at: Set(vote.updated_at),
            ..Default::default()
        };
        peer_vote::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    peer_vote::Column::RoundId,
                    peer_vote::Column::VoterId,
                    peer_vote::Column::CandidateId,
                ])
                .update_columns([
                    peer_vote::Column::Rating,
                    peer_vote::Column::Comment,
                    peer_vote::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(backend)?;

        txn.commit().await.map_err(backend)
    }

    #[instrument(skip(self, submission), fields(participant = submission.participant_id))]
    async fn upsert_submission(
        &self,
        round_id: i32,
        submission: Submission,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;
        lock_active_round(&txn, round_id).await?;

        let model = submission::ActiveModel {
            round_id: Set(round_id),
            participant_id: Set(submission.participant_id),
            url: Set(submission.url),
            updated_at: Set(submission.updated_at),
            ..Default::default()
        };
        submission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    submission::Column::RoundId,
                    submission::Column::ParticipantId,
                ])
                .update_columns([submission::Column::Url, submission::Column::UpdatedAt])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(backend)?;

        txn.commit().await.map_err(backend)
    }

    async fn round_votes(&self, round_id: i32) -> Result<Vec<PeerVote>, StoreError> {
        ensure_round(&self.db, round_id).await?;
        fetch_votes(&self.db, round_id).await
    }

    async fn candidate_votes(
        &self,
        round_id: i32,
        candidate_id: i32,
    ) -> Result<Vec<PeerVote>, StoreError> {
        ensure_round(&self.db, round_id).await?;
        Ok(peer_vote::Entity::find()
            .filter(peer_vote::Column::RoundId.eq(round_id))
            .filter(peer_vote::Column::CandidateId.eq(candidate_id))
            .order_by_asc(peer_vote::Column::VoterId)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(PeerVote::from)
            .collect())
    }

    async fn round_submissions(&self, round_id: i32) -> Result<Vec<Submission>, StoreError> {
        ensure_round(&self.db, round_id).await?;
        fetch_submissions(&self.db, round_id).await
    }

    async fn round_ratings(&self, round_id: i32) -> Result<Vec<FinalRating>, StoreError> {
        ensure_round(&self.db, round_id).await?;
        Ok(final_rating::Entity::find()
            .filter(final_rating::Column::RoundId.eq(round_id))
            .order_by_asc(final_rating::Column::ParticipantId)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(FinalRating::from)
            .collect())
    }

    #[instrument(skip(self, planner))]
    async fn close_round(
        &self,
        round_id: i32,
        closed_at: DateTime<Utc>,
        planner: &ClosurePlanner,
    ) -> Result<RoundDetail, StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;
        let locked = lock_active_round(&txn, round_id).await?;

        let participants = participant::Entity::find()
            .filter(participant::Column::Role.eq(Role::Participant))
            .order_by_asc(participant::Column::Id)
            .lock(LockType::Update)
            .all(&txn)
            .await
            .map_err(backend)?;

        let snapshot = ClosureSnapshot {
            round: locked.clone().into(),
            votes: fetch_votes(&txn, round_id).await?,
            submissions: fetch_submissions(&txn, round_id).await?,
            participants: participants.iter().cloned().map(Participant::from).collect(),
        };
        let plan = planner(&snapshot);

        let mut by_id: HashMap<i32, participant::Model> =
            participants.into_iter().map(|p| (p.id, p)).collect();
        for update in &plan.ledger {
            let model = by_id
                .remove(&update.participant_id)
                .ok_or(StoreError::ParticipantNotFound(update.participant_id))?;
            let mut active: participant::ActiveModel = model.into();
            active.total_points = Set(update.total_points);
            active.total_votes_received = Set(update.total_votes_received);
            active.streak = Set(update.streak);
            active.latest_rating = Set(update.latest_rating);
            active.last_participated_round_end = Set(update.last_participated_round_end);
            active.update(&txn).await.map_err(backend)?;
        }

        if !plan.ratings.is_empty() {
            final_rating::Entity::insert_many(plan.ratings.iter().map(|r| {
                final_rating::ActiveModel {
                    round_id: Set(round_id),
                    participant_id: Set(r.participant_id),
                    stars: Set(r.stars),
                    points: Set(r.points),
                    ..Default::default()
                }
            }))
            .exec_without_returning(&txn)
            .await
            .map_err(backend)?;
        }

        let mut active: round::ActiveModel = locked.into();
        active.status = Set(RoundStatus::Closed);
        active.active_slot = Set(None);
        active.winner_id = Set(plan.winner.map(|w| w.participant_id));
        active.winner_points = Set(plan.winner.map_or(0, |w| w.points));
        active.closed_at = Set(Some(closed_at));
        active.updated_at = Set(closed_at);
        let closed = active.update(&txn).await.map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        Ok(RoundDetail {
            round: closed.into(),
            votes: snapshot.votes,
            submissions: snapshot.submissions,
            ratings: plan.ratings,
        })
    }

    #[instrument(skip(self, new))]
    async fn insert_participant(&self, new: NewParticipant) -> Result<Participant, StoreError> {
        let model = participant::ActiveModel {
            name: Set(new.name),
            email: Set(new.email),
            role: Set(new.role),
            total_points: Set(0),
            total_votes_received: Set(0),
            streak: Set(0),
            latest_rating: Set(0),
            last_participated_round_end: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted.into()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("email".into())),
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_participant(&self, id: i32) -> Result<Option<Participant>, StoreError> {
        Ok(participant::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(Participant::from))
    }

    async fn list_participants(&self, role: Option<Role>) -> Result<Vec<Participant>, StoreError> {
        let mut select = participant::Entity::find();
        if let Some(role) = role {
            select = select.filter(participant::Column::Role.eq(role));
        }
        Ok(select
            .order_by_asc(participant::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Participant::from)
            .collect())
    }

    async fn count_participants(&self, role: Option<Role>) -> Result<u64, StoreError> {
        let mut select = participant::Entity::find();
        if let Some(role) = role {
            select = select.filter(participant::Column::Role.eq(role));
        }
        select.count(&self.db).await.map_err(backend)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_participants(&self, ids: &[i32]) -> Result<u64, StoreError> {
        let result = participant::Entity::delete_many()
            .filter(participant::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected)
    }
}

impl From<round::Model> for Round {
    fn from(m: round::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            created_by: m.created_by,
            winner_id: m.winner_id,
            winner_points: m.winner_points,
            closed_at: m.closed_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<peer_vote::Model> for PeerVote {
    fn from(m: peer_vote::Model) -> Self {
        Self {
            voter_id: m.voter_id,
            candidate_id: m.candidate_id,
            rating: m.rating,
            comment: m.comment,
            updated_at: m.updated_at,
        }
    }
}

impl From<submission::Model> for Submission {
    fn from(m: submission::Model) -> Self {
        Self {
            participant_id: m.participant_id,
            url: m.url,
            updated_at: m.updated_at,
        }
    }
}

impl From<final_rating::Model> for FinalRating {
    fn from(m: final_rating::Model) -> Self {
        Self {
            participant_id: m.participant_id,
            stars: m.stars,
            points: m.points,
        }
    }
}

impl From<participant::Model> for Participant {
    fn from(m: participant::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: m.role,
            total_points: m.total_points,
            total_votes_received: m.total_votes_received,
            streak: m.streak,
            latest_rating: m.latest_rating,
            last_participated_round_end: m.last_participated_round_end,
            created_at: m.created_at,
        }
    }
}
