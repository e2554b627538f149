use chrono::{DateTime, Utc};
use common::RoundStatus;
use engine::model::{
    ActiveRoundView, FinalRating, PeerVote, Round, RoundDetail, RoundPatch, RoundSummary,
    Submission,
};
use engine::{ManualRating, RoundDraft, VoteTally};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// All fields are required; they are optional here so a missing field
/// surfaces as `VALIDATION_ERROR` rather than a deserialization failure.
#[derive(Deserialize, ToSchema)]
pub struct CreateRoundRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<CreateRoundRequest> for RoundDraft {
    fn from(req: CreateRoundRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateRoundRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<UpdateRoundRequest> for RoundPatch {
    fn from(req: UpdateRoundRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ManualRatingItem {
    #[serde(alias = "userId")]
    pub user_id: i32,
    /// 1-5. Zero or negative means no override.
    pub stars: i32,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct CloseRoundRequest {
    #[serde(default)]
    pub ratings: Vec<ManualRatingItem>,
}

impl CloseRoundRequest {
    pub fn manual_ratings(&self) -> Vec<ManualRating> {
        self.ratings
            .iter()
            .map(|r| ManualRating {
                participant_id: r.user_id,
                stars: r.stars,
            })
            .collect()
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CastVoteRequest {
    #[serde(alias = "candidateId")]
    pub candidate_id: i32,
    /// 1-10
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[serde(default)]
    pub url: String,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, ToSchema)]
pub struct RoundResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: RoundStatus,
    pub created_by: i32,
    pub winner_id: Option<i32>,
    pub winner_points: i32,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Round> for RoundResponse {
    fn from(r: Round) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            start_date: r.start_date,
            end_date: r.end_date,
            status: r.status,
            created_by: r.created_by,
            winner_id: r.winner_id,
            winner_points: r.winner_points,
            closed_at: r.closed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct VoteResponse {
    pub voter_id: i32,
    pub candidate_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<PeerVote> for VoteResponse {
    fn from(v: PeerVote) -> Self {
        Self {
            voter_id: v.voter_id,
            candidate_id: v.candidate_id,
            rating: v.rating,
            comment: v.comment,
            updated_at: v.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub participant_id: i32,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            participant_id: s.participant_id,
            url: s.url,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RatingResponse {
    pub participant_id: i32,
    pub stars: i32,
    pub points: i32,
}

impl From<FinalRating> for RatingResponse {
    fn from(r: FinalRating) -> Self {
        Self {
            participant_id: r.participant_id,
            stars: r.stars,
            points: r.points,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RoundDetailResponse {
    #[serde(flatten)]
    pub round: RoundResponse,
    pub votes: Vec<VoteResponse>,
    pub submissions: Vec<SubmissionResponse>,
    pub ratings: Vec<RatingResponse>,
}

impl From<RoundDetail> for RoundDetailResponse {
    fn from(d: RoundDetail) -> Self {
        Self {
            round: d.round.into(),
            votes: d.votes.into_iter().map(Into::into).collect(),
            submissions: d.submissions.into_iter().map(Into::into).collect(),
            ratings: d.ratings.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RoundSummaryResponse {
    #[serde(flatten)]
    pub round: RoundResponse,
    pub winner_name: Option<String>,
}

impl From<RoundSummary> for RoundSummaryResponse {
    fn from(s: RoundSummary) -> Self {
        Self {
            round: s.round.into(),
            winner_name: s.winner_name,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ActiveRoundResponse {
    pub round: Option<RoundResponse>,
    pub latest_winner: Option<RoundSummaryResponse>,
}

impl From<ActiveRoundView> for ActiveRoundResponse {
    fn from(v: ActiveRoundView) -> Self {
        Self {
            round: v.round.map(Into::into),
            latest_winner: v.latest_winner.map(Into::into),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AggregateResponse {
    pub sum: i32,
    pub count: i32,
}

impl From<VoteTally> for AggregateResponse {
    fn from(t: VoteTally) -> Self {
        Self {
            sum: t.sum,
            count: t.count,
        }
    }
}
