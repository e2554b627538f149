//! Phase one of round closure: a pure plan over a snapshot.
//!
//! The store commits the returned [`ClosurePlan`] as a single unit, so no
//! participant ledger is ever visible without the round being closed.

use crate::ledger::ParticipantLedger;
use crate::model::{ClosurePlan, ClosureSnapshot, FinalRating};
use crate::scoring::{ManualRatings, Resolution, ScoringResolver};
use crate::votes;
use crate::winner::WinnerSelector;

pub fn plan_closure(snapshot: &ClosureSnapshot, manual: &ManualRatings) -> ClosurePlan {
    let tallies = votes::tally(&snapshot.votes);
    let resolver = ScoringResolver::new(manual, &tallies);
    let ledger = ParticipantLedger::new(&snapshot.round);

    let resolutions: Vec<Resolution> = snapshot
        .participants
        .iter()
        .map(|p| resolver.resolve(p.id))
        .collect();

    let updates = snapshot
        .participants
        .iter()
        .zip(&resolutions)
        .map(|(participant, resolution)| ledger.apply(participant, resolution))
        .collect();

    let ratings = resolutions
        .iter()
        .filter(|r| r.is_rated())
        .map(|r| FinalRating {
            participant_id: r.participant_id,
            stars: r.stars,
            points: r.points,
        })
        .collect();

    ClosurePlan {
        ratings,
        ledger: updates,
        winner: WinnerSelector::new(&snapshot.submissions).select(&resolutions),
    }
}
