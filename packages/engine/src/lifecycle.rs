//! Round state machine: creation, submissions, closure, edits and reads.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{Role, RoundEvent, permission};
use tracing::{info, instrument, warn};

use crate::actor::Actor;
use crate::closure::plan_closure;
use crate::error::{ArenaError, Result};
use crate::model::{
    ActiveRoundView, ClosureSnapshot, NewRound, Round, RoundDetail, RoundPatch, RoundSummary,
    Submission,
};
use crate::notify::{self, Notifier};
use crate::scoring::{ManualRating, ManualRatings};
use crate::store::{ArenaStore, StoreError};
use crate::votes::VoteAggregator;

/// Unvalidated round creation input. Every field is required.
#[derive(Clone, Debug, Default)]
pub struct RoundDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub struct RoundManager {
    store: Arc<dyn ArenaStore>,
    notifier: Arc<dyn Notifier>,
    votes: VoteAggregator,
}

impl RoundManager {
    pub fn new(store: Arc<dyn ArenaStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            votes: VoteAggregator::new(store.clone()),
            store,
            notifier,
        }
    }

    pub fn votes(&self) -> &VoteAggregator {
        &self.votes
    }

    #[instrument(skip(self, actor, draft), fields(creator = actor.participant_id))]
    pub async fn create_round(&self, actor: &Actor, draft: RoundDraft) -> Result<Round> {
        actor.require_permission(permission::ROUND_MANAGE)?;

        let title = required_text(draft.title, "title")?;
        let description = required_text(draft.description, "description")?;
        let start_date = draft
            .start_date
            .ok_or_else(|| ArenaError::Validation("start_date is required".into()))?;
        let end_date = draft
            .end_date
            .ok_or_else(|| ArenaError::Validation("end_date is required".into()))?;
        if start_date >= end_date {
            return Err(ArenaError::InvalidRange(
                "End date must be after start date".into(),
            ));
        }

        let round = self
            .store
            .insert_round_if_none_active(NewRound {
                title,
                description,
                start_date,
                end_date,
                created_by: actor.participant_id,
            })
            .await?;
        info!(round_id = round.id, "Round opened");

        self.announce(round.id, |recipients| RoundEvent::Opened {
            round_id: round.id,
            title: round.title.clone(),
            description: round.description.clone(),
            start_date: round.start_date,
            end_date: round.end_date,
            recipients,
        })
        .await;

        Ok(round)
    }

    /// Score every participant and freeze the round.
    ///
    /// Ledger updates, final ratings and the status flip are committed
    /// together by the store.
    #[instrument(skip(self, actor, manual))]
    pub async fn close_round(
        &self,
        actor: &Actor,
        round_id: i32,
        manual: &[ManualRating],
    ) -> Result<RoundDetail> {
        actor.require_permission(permission::ROUND_MANAGE)?;
        let manual = ManualRatings::from_entries(manual)?;

        let planner = move |snapshot: &ClosureSnapshot| plan_closure(snapshot, &manual);
        let detail = self
            .store
            .close_round(round_id, Utc::now(), &planner)
            .await
            .map_err(|e| match e {
                StoreError::RoundNotActive(_) => {
                    ArenaError::InvalidState("Round is already closed".into())
                }
                other => other.into(),
            })?;
        let round = &detail.round;
        info!(
            winner = ?round.winner_id,
            winner_points = round.winner_points,
            "Round closed"
        );

        self.announce(round.id, |recipients| RoundEvent::Closed {
            round_id: round.id,
            title: round.title.clone(),
            winner_id: round.winner_id,
            winner_points: round.winner_points,
            recipients,
        })
        .await;

        Ok(detail)
    }

    /// Edit title, description or dates. Blank strings are ignored and the
    /// round's status is not consulted.
    #[instrument(skip(self, actor, patch))]
    pub async fn update_round(
        &self,
        actor: &Actor,
        round_id: i32,
        patch: RoundPatch,
    ) -> Result<Round> {
        actor.require_permission(permission::ROUND_MANAGE)?;

        let patch = RoundPatch {
            title: non_blank(patch.title),
            description: non_blank(patch.description),
            ..patch
        };
        if patch.is_empty() {
            return self.find_round(round_id).await;
        }
        Ok(self.store.update_round(round_id, patch).await?)
    }

    /// Remove a round in any state. Ledger effects of a closed round stay.
    #[instrument(skip(self, actor))]
    pub async fn delete_round(&self, actor: &Actor, round_id: i32) -> Result<()> {
        actor.require_permission(permission::ROUND_MANAGE)?;
        self.store.delete_round(round_id).await?;
        info!("Round deleted");
        Ok(())
    }

    #[instrument(skip(self, actor, url), fields(participant = actor.participant_id))]
    pub async fn record_submission(
        &self,
        actor: &Actor,
        round_id: i32,
        url: &str,
    ) -> Result<Submission> {
        actor.require_permission(permission::ROUND_PARTICIPATE)?;
        let url = url.trim();
        if url.is_empty() {
            return Err(ArenaError::Validation("Submission URL is required".into()));
        }

        let submission = Submission {
            participant_id: actor.participant_id,
            url: url.to_string(),
            updated_at: Utc::now(),
        };
        self.store
            .upsert_submission(round_id, submission.clone())
            .await
            .map_err(|e| match e {
                StoreError::RoundNotActive(_) => {
                    ArenaError::InvalidState("Cannot submit to a closed round".into())
                }
                other => other.into(),
            })?;
        Ok(submission)
    }

    pub async fn find_round(&self, round_id: i32) -> Result<Round> {
        self.store
            .find_round(round_id)
            .await?
            .ok_or_else(|| ArenaError::NotFound("Round".into()))
    }

    pub async fn get_round(&self, round_id: i32) -> Result<RoundDetail> {
        let round = self.find_round(round_id).await?;
        self.detail(round).await
    }

    /// The active round (if any) and the latest round that produced a winner.
    pub async fn active_view(&self) -> Result<ActiveRoundView> {
        let round = self.store.find_active_round().await?;
        let latest_winner = match self.store.latest_decided_round().await? {
            Some(decided) => {
                let names = self.participant_names().await?;
                Some(summarize(decided, &names))
            }
            None => None,
        };
        Ok(ActiveRoundView {
            round,
            latest_winner,
        })
    }

    /// All rounds, newest start first, with winner names resolved.
    pub async fn list_rounds(&self, actor: &Actor) -> Result<Vec<RoundSummary>> {
        actor.require_permission(permission::ROUND_MANAGE)?;
        let names = self.participant_names().await?;
        let rounds = self.store.list_rounds().await?;
        Ok(rounds.into_iter().map(|r| summarize(r, &names)).collect())
    }

    /// Emit a reminder for the active round while its end date is ahead.
    pub async fn send_reminder(&self, now: DateTime<Utc>) -> Result<Option<RoundEvent>> {
        let Some(round) = self.store.find_active_round().await? else {
            return Ok(None);
        };
        let remaining = round.end_date - now;
        if remaining <= Duration::zero() {
            return Ok(None);
        }
        let recipients = self.recipients().await?;
        if recipients.is_empty() {
            return Ok(None);
        }

        let event = RoundEvent::Reminder {
            round_id: round.id,
            title: round.title,
            remaining: format_remaining(remaining),
            days_left: remaining.num_days(),
            recipients,
        };
        notify::dispatch(self.notifier.as_ref(), event.clone()).await;
        Ok(Some(event))
    }

    async fn detail(&self, round: Round) -> Result<RoundDetail> {
        let votes = self.store.round_votes(round.id).await?;
        let submissions = self.store.round_submissions(round.id).await?;
        let ratings = self.store.round_ratings(round.id).await?;
        Ok(RoundDetail {
            round,
            votes,
            submissions,
            ratings,
        })
    }

    /// Notify participants about a change that is already committed.
    /// Nothing here can fail the operation.
    async fn announce(&self, round_id: i32, event: impl FnOnce(Vec<String>) -> RoundEvent) {
        match self.recipients().await {
            Ok(recipients) => notify::dispatch(self.notifier.as_ref(), event(recipients)).await,
            Err(e) => warn!(round_id, "Skipping round notification, recipients unavailable: {e}"),
        }
    }

    async fn recipients(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_participants(Some(Role::Participant))
            .await?
            .into_iter()
            .map(|p| p.email)
            .filter(|e| !e.is_empty())
            .collect())
    }

    async fn participant_names(&self) -> Result<HashMap<i32, String>> {
        Ok(self
            .store
            .list_participants(None)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }
}

/// `"{d}d {h}h {m}m"`
pub fn format_remaining(remaining: Duration) -> String {
    format!(
        "{}d {}h {}m",
        remaining.num_days(),
        remaining.num_hours() % 24,
        remaining.num_minutes() % 60
    )
}

fn summarize(round: Round, names: &HashMap<i32, String>) -> RoundSummary {
    let winner_name = round.winner_id.and_then(|id| names.get(&id).cloned());
    RoundSummary { round, winner_name }
}

fn required_text(value: Option<String>, field: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| ArenaError::Validation(format!("{field} is required")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
