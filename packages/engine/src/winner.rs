//! Selection of a closed round's top scorer.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{Submission, Winner};
use crate::scoring::Resolution;

pub struct WinnerSelector {
    submitted_at: HashMap<i32, DateTime<Utc>>,
}

impl WinnerSelector {
    pub fn new(submissions: &[Submission]) -> Self {
        Self {
            submitted_at: submissions
                .iter()
                .map(|s| (s.participant_id, s.updated_at))
                .collect(),
        }
    }

    /// Highest points wins. Ties go to the earliest submission (anyone who
    /// submitted beats anyone who did not), then to the lowest participant id.
    pub fn select(&self, resolutions: &[Resolution]) -> Option<Winner> {
        resolutions
            .iter()
            .filter(|r| r.points > 0)
            .min_by(|a, b| self.rank(a, b))
            .map(|r| Winner {
                participant_id: r.participant_id,
                points: r.points,
            })
    }

    fn rank(&self, a: &Resolution, b: &Resolution) -> Ordering {
        b.points
            .cmp(&a.points)
            .then_with(|| {
                match (
                    self.submitted_at.get(&a.participant_id),
                    self.submitted_at.get(&b.participant_id),
                ) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            })
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    }
}
