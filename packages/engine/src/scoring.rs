//! Resolution of peer votes and manual overrides into stars and points.
//!
//! Peer votes use a 1-10 scale, manual overrides a 1-5 star scale. Both end
//! up as `points = stars * 2`, the currency used for ranking and the ledger.

use std::collections::HashMap;

use crate::error::{ArenaError, Result};
use crate::votes::VoteTally;

pub const MAX_STARS: i32 = 5;
pub const POINTS_PER_STAR: i32 = 2;

/// One admin-supplied star rating from the closure payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualRating {
    pub participant_id: i32,
    pub stars: i32,
}

/// Validated manual overrides keyed by participant.
///
/// Entries with `stars <= 0` mean "no override" and are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualRatings(HashMap<i32, i32>);

impl ManualRatings {
    pub fn from_entries(entries: &[ManualRating]) -> Result<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            if entry.stars > MAX_STARS {
                return Err(ArenaError::Validation(format!(
                    "Stars for participant {} must be at most {MAX_STARS}",
                    entry.participant_id
                )));
            }
            if entry.stars > 0 {
                map.insert(entry.participant_id, entry.stars);
            }
        }
        Ok(Self(map))
    }

    pub fn get(&self, participant_id: i32) -> Option<i32> {
        self.0.get(&participant_id).copied()
    }
}

/// Outcome of scoring one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub participant_id: i32,
    /// 0 when the participant is unrated this round.
    pub stars: i32,
    pub points: i32,
    /// Peer votes received this round, counted even when overridden.
    pub votes_received: i32,
}

impl Resolution {
    pub fn is_rated(&self) -> bool {
        self.stars > 0
    }
}

/// Map a peer tally onto stars: `max(1, round(mean / 2))`, halves rounding up.
pub fn stars_from_votes(tally: VoteTally) -> i32 {
    if tally.count == 0 {
        return 0;
    }
    // round(sum / count / 2) == floor((sum + count) / (2 * count)) for sum >= 0
    let stars = (tally.sum + tally.count) / (2 * tally.count);
    stars.clamp(1, MAX_STARS)
}

pub struct ScoringResolver<'a> {
    manual: &'a ManualRatings,
    tallies: &'a HashMap<i32, VoteTally>,
}

impl<'a> ScoringResolver<'a> {
    pub fn new(manual: &'a ManualRatings, tallies: &'a HashMap<i32, VoteTally>) -> Self {
        Self { manual, tallies }
    }

    /// Override first, then peer votes, else unrated.
    pub fn resolve(&self, participant_id: i32) -> Resolution {
        let tally = self.tallies.get(&participant_id).copied().unwrap_or_default();
        let stars = match self.manual.get(participant_id) {
            Some(stars) => stars,
            None => stars_from_votes(tally),
        };

        Resolution {
            participant_id,
            stars,
            points: stars * POINTS_PER_STAR,
            votes_received: tally.count,
        }
    }
}
