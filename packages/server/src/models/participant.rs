use chrono::{DateTime, Utc};
use common::Role;
use engine::ParticipantDraft;
use engine::model::{ArenaStats, LeaderboardEntry, Participant};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateParticipantRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Defaults to `participant`.
    pub role: Option<Role>,
}

impl From<CreateParticipantRequest> for ParticipantDraft {
    fn from(req: CreateParticipantRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            role: req.role,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    #[serde(alias = "userIds")]
    pub ids: Vec<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub total_points: i32,
    pub total_votes_received: i32,
    pub streak: i32,
    /// Stars from the last round the participant was rated in, 0 if unrated.
    pub latest_rating: i32,
    pub last_participated_round_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantResponse {
    fn from(p: Participant) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            role: p.role,
            total_points: p.total_points,
            total_votes_received: p.total_votes_received,
            streak: p.streak,
            latest_rating: p.latest_rating,
            last_participated_round_end: p.last_participated_round_end,
            created_at: p.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaderboardEntryResponse {
    #[schema(example = 1)]
    pub rank: u32,
    pub id: i32,
    pub name: String,
    pub latest_rating: i32,
    pub total_points: i32,
    pub streak: i32,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            id: e.id,
            name: e.name,
            latest_rating: e.latest_rating,
            total_points: e.total_points,
            streak: e.streak,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub participant_count: u64,
    pub round_count: u64,
    pub has_active: bool,
    pub active_title: Option<String>,
}

impl From<ArenaStats> for StatsResponse {
    fn from(s: ArenaStats) -> Self {
        Self {
            participant_count: s.participant_count,
            round_count: s.round_count,
            has_active: s.has_active,
            active_title: s.active_title,
        }
    }
}
