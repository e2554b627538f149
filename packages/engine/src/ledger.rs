//! Per-participant point, vote-count and streak bookkeeping at closure.

use chrono::{DateTime, Utc};

use crate::model::{LedgerUpdate, Participant, Round};
use crate::scoring::Resolution;

/// Whole calendar days (UTC) from `from` to `to`. Negative if `to` is earlier.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

/// A round continues a streak when it starts at most one day after the
/// participant's previous rated round ended.
pub fn is_consecutive(previous_end: Option<DateTime<Utc>>, current_start: DateTime<Utc>) -> bool {
    match previous_end {
        Some(end) => days_between(end, current_start) <= 1,
        None => false,
    }
}

pub struct ParticipantLedger<'a> {
    round: &'a Round,
}

impl<'a> ParticipantLedger<'a> {
    pub fn new(round: &'a Round) -> Self {
        Self { round }
    }

    /// Compute the participant's ledger after this round.
    pub fn apply(&self, participant: &Participant, resolution: &Resolution) -> LedgerUpdate {
        if !resolution.is_rated() {
            return LedgerUpdate {
                participant_id: participant.id,
                total_points: participant.total_points,
                total_votes_received: participant.total_votes_received,
                streak: 0,
                latest_rating: 0,
                last_participated_round_end: participant.last_participated_round_end,
            };
        }

        let streak = if is_consecutive(
            participant.last_participated_round_end,
            self.round.start_date,
        ) {
            participant.streak + 1
        } else {
            1
        };

        LedgerUpdate {
            participant_id: participant.id,
            total_points: participant.total_points + resolution.points,
            total_votes_received: participant.total_votes_received + resolution.votes_received,
            streak,
            latest_rating: resolution.stars,
            last_participated_round_end: Some(self.round.end_date),
        }
    }
}
