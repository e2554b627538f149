use chrono::{DateTime, Utc};
use common::{Role, RoundStatus};
use serde::{Deserialize, Serialize};

/// One contest cycle with a fixed time window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
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

/// Validated input for a new round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRound {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: i32,
}

/// Partial update of a round. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl RoundPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, round: &mut Round) {
        if let Some(title) = &self.title {
            round.title = title.clone();
        }
        if let Some(description) = &self.description {
            round.description = description.clone();
        }
        if let Some(start_date) = self.start_date {
            round.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            round.end_date = end_date;
        }
    }
}

/// Key of a peer vote inside a round. At most one vote exists per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoteKey {
    pub voter_id: i32,
    pub candidate_id: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerVote {
    pub voter_id: i32,
    pub candidate_id: i32,
    /// 1-10
    pub rating: i32,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PeerVote {
    pub fn key(&self) -> VoteKey {
        VoteKey {
            voter_id: self.voter_id,
            candidate_id: self.candidate_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub participant_id: i32,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

/// Resolved score of one participant in a closed round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRating {
    pub participant_id: i32,
    /// 1-5
    pub stars: i32,
    /// `stars * 2`
    pub points: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub total_points: i32,
    pub total_votes_received: i32,
    pub streak: i32,
    pub latest_rating: i32,
    pub last_participated_round_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Overwrite the ledger fields with the values computed at closure.
    pub fn apply(&mut self, update: &LedgerUpdate) {
        self.total_points = update.total_points;
        self.total_votes_received = update.total_votes_received;
        self.streak = update.streak;
        self.latest_rating = update.latest_rating;
        self.last_participated_round_end = update.last_participated_round_end;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Absolute ledger values for one participant after a closure.
///
/// Values are final, not deltas, so a plan can be applied more than once
/// without drifting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub participant_id: i32,
    pub total_points: i32,
    pub total_votes_received: i32,
    pub streak: i32,
    pub latest_rating: i32,
    pub last_participated_round_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub participant_id: i32,
    pub points: i32,
}

/// Everything the closure planner reads, captured under the round lock.
#[derive(Clone, Debug)]
pub struct ClosureSnapshot {
    pub round: Round,
    pub votes: Vec<PeerVote>,
    pub submissions: Vec<Submission>,
    /// Participants with [`Role::Participant`] only.
    pub participants: Vec<Participant>,
}

/// The complete set of writes a closure commits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClosurePlan {
    pub ratings: Vec<FinalRating>,
    pub ledger: Vec<LedgerUpdate>,
    pub winner: Option<Winner>,
}

/// A round together with its votes, submissions and final ratings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundDetail {
    pub round: Round,
    pub votes: Vec<PeerVote>,
    pub submissions: Vec<Submission>,
    pub ratings: Vec<FinalRating>,
}

/// A round with its winner's display name resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub round: Round,
    pub winner_name: Option<String>,
}

/// Current active round plus the most recent closed round with a winner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActiveRoundView {
    pub round: Option<Round>,
    pub latest_winner: Option<RoundSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub id: i32,
    pub name: String,
    pub latest_rating: i32,
    pub total_points: i32,
    pub streak: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    pub participant_count: u64,
    pub round_count: u64,
    pub has_active: bool,
    pub active_title: Option<String>,
}
