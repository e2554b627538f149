use std::cmp::Ordering;
use std::sync::Arc;

use common::{Role, permission};
use tracing::{info, instrument};

use crate::actor::Actor;
use crate::error::{ArenaError, Result};
use crate::model::{ArenaStats, LeaderboardEntry, NewParticipant, Participant};
use crate::store::ArenaStore;

/// Registration input as received from the caller.
#[derive(Clone, Debug, Default)]
pub struct ParticipantDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Participant records and the read models built from their ledgers.
pub struct ParticipantRegistry {
    store: Arc<dyn ArenaStore>,
}

impl ParticipantRegistry {
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, actor, draft))]
    pub async fn register(&self, actor: &Actor, draft: ParticipantDraft) -> Result<Participant> {
        actor.require_permission(permission::PARTICIPANT_MANAGE)?;

        let name = draft
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ArenaError::Validation("name is required".into()))?;
        let email = draft
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ArenaError::Validation("email is required".into()))?;
        if !is_plausible_email(&email) {
            return Err(ArenaError::Validation("email is malformed".into()));
        }

        let participant = self
            .store
            .insert_participant(NewParticipant {
                name,
                email,
                role: draft.role.unwrap_or_default(),
            })
            .await?;
        info!(participant_id = participant.id, "Participant registered");
        Ok(participant)
    }

    pub async fn profile(&self, participant_id: i32) -> Result<Participant> {
        self.store
            .find_participant(participant_id)
            .await?
            .ok_or_else(|| ArenaError::NotFound("Participant".into()))
    }

    /// Participants (role `participant` only) sorted by name.
    pub async fn list(&self) -> Result<Vec<Participant>> {
        let mut participants = self.store.list_participants(Some(Role::Participant)).await?;
        participants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(participants)
    }

    /// Ranked by total points, then streak, then name. Ranks follow position.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let mut participants = self.store.list_participants(Some(Role::Participant)).await?;
        participants.sort_by(leaderboard_order);
        Ok(participants
            .into_iter()
            .enumerate()
            .map(|(i, p)| LeaderboardEntry {
                rank: i as u32 + 1,
                id: p.id,
                name: p.name,
                latest_rating: p.latest_rating,
                total_points: p.total_points,
                streak: p.streak,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<ArenaStats> {
        let participant_count = self
            .store
            .count_participants(Some(Role::Participant))
            .await?;
        let round_count = self.store.count_rounds().await?;
        let active = self.store.find_active_round().await?;
        Ok(ArenaStats {
            participant_count,
            round_count,
            has_active: active.is_some(),
            active_title: active.map(|r| r.title),
        })
    }

    /// Remove one participant. Votes and ratings they took part in remain.
    #[instrument(skip(self, actor))]
    pub async fn delete(&self, actor: &Actor, participant_id: i32) -> Result<()> {
        actor.require_permission(permission::PARTICIPANT_MANAGE)?;
        match self.store.delete_participants(&[participant_id]).await? {
            0 => Err(ArenaError::NotFound("Participant".into())),
            _ => {
                info!("Participant deleted");
                Ok(())
            }
        }
    }

    /// Remove every listed participant that exists. Returns how many went.
    #[instrument(skip(self, actor, ids), fields(requested = ids.len()))]
    pub async fn bulk_delete(&self, actor: &Actor, ids: &[i32]) -> Result<u64> {
        actor.require_permission(permission::PARTICIPANT_MANAGE)?;
        if ids.is_empty() {
            return Err(ArenaError::Validation("ids must not be empty".into()));
        }
        let deleted = self.store.delete_participants(ids).await?;
        info!(deleted, "Participants deleted");
        Ok(deleted)
    }
}

fn leaderboard_order(a: &Participant, b: &Participant) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then(b.streak.cmp(&a.streak))
        .then_with(|| a.name.cmp(&b.name))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}
