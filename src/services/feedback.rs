//! Feedback application and undo.
//!
//! Applying feedback learns a new taste vector, persists it and appends the
//! effective delta to the user's log. Undo pops the most recent active log
//! entry and subtracts its delta. Both run under the user's lock so the
//! read-modify-write of the taste vector is never interleaved.

use std::sync::Arc;

use tracing::instrument;

use super::preference::PreferenceModel;
use super::user_locks::UserLocks;
use crate::config::RecommenderConfig;
use crate::embedding::check_dimension;
use crate::models::{FeedbackAction, FeedbackEvent, FeedbackHistory, NewFeedback, TrackId, UserId};
use crate::storage::traits::{CatalogBackend, ProfileBackend};
use crate::{Error, Result, current_timestamp};

/// Outcome of an apply or undo.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackOutcome {
    /// The logged event (for undo, the event that was deactivated).
    pub event: FeedbackEvent,
    /// The taste vector now stored for the user.
    pub preference: Vec<f32>,
}

/// Service for recording feedback and undoing it.
pub struct FeedbackService {
    catalog: Arc<dyn CatalogBackend>,
    profiles: Arc<dyn ProfileBackend>,
    config: RecommenderConfig,
    model: PreferenceModel,
    locks: UserLocks,
}

impl FeedbackService {
    /// Creates a feedback service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        profiles: Arc<dyn ProfileBackend>,
        config: RecommenderConfig,
    ) -> Self {
        let model = PreferenceModel::from_config(&config);
        Self {
            catalog,
            profiles,
            config,
            model,
            locks: UserLocks::new(),
        }
    }

    /// Applies a feedback action to the user's taste vector.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The track has no embedding ([`Error::TrackNotFound`])
    /// - The user does not exist ([`Error::UserNotFound`])
    /// - A vector has the wrong dimension
    /// - A store call fails
    #[instrument(
        skip(self, user, track, action),
        fields(user_id = %user.as_str(), track_id = %track.as_str(), action = %action)
    )]
    pub fn apply(
        &self,
        user: &UserId,
        track: &TrackId,
        action: FeedbackAction,
    ) -> Result<FeedbackOutcome> {
        let embedding = self
            .catalog
            .get_embedding(track)?
            .ok_or_else(|| Error::TrackNotFound(track.clone()))?;
        check_dimension(&embedding, self.config.embedding_dim, "track embedding")?;

        let outcome = self.locks.with_lock(user, || {
            let current = self.current_preference(user)?;
            let update = self.model.learn(&current, action, &embedding)?;
            let now = current_timestamp();

            self.profiles.set_preference(user, &update.preference, now)?;
            let event = self
                .profiles
                .append_feedback(NewFeedback {
                    user_id: user.clone(),
                    track_id: track.clone(),
                    action,
                    delta: update.delta,
                    created_at: now,
                })
                .or_else(|e| self.roll_back(user, &current, now, e))?;

            Ok::<_, Error>(FeedbackOutcome {
                event,
                preference: update.preference,
            })
        })?;

        metrics::counter!("feedback_applied_total", "action" => action.as_str()).increment(1);
        tracing::info!(
            user_id = %user.as_str(),
            track_id = %track.as_str(),
            action = %action,
            feedback_id = outcome.event.id.get(),
            "Applied feedback"
        );
        Ok(outcome)
    }

    /// Reverses the user's most recent active feedback event.
    ///
    /// Undo is a stack pop over the log; it never targets a specific track.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToUndo`] if there is no active event, or
    /// [`Error::UserNotFound`] if the user does not exist.
    #[instrument(skip(self), fields(user_id = %user.as_str()))]
    pub fn undo(&self, user: &UserId) -> Result<FeedbackOutcome> {
        let outcome = self.locks.with_lock(user, || {
            let current = self.current_preference(user)?;
            let Some(mut event) = self.profiles.latest_active_feedback(user)? else {
                metrics::counter!("feedback_undo_empty_total").increment(1);
                return Err(Error::NothingToUndo(user.clone()));
            };
            check_dimension(&event.delta, current.len(), "feedback delta")?;

            let restored = self.restore_preference(user, &current, &event)?;
            let now = current_timestamp();

            self.profiles.set_preference(user, &restored, now)?;
            self.profiles
                .mark_undone(event.id)
                .or_else(|e| self.roll_back(user, &current, now, e))?;

            event.undone = true;
            Ok(FeedbackOutcome {
                event,
                preference: restored,
            })
        })?;

        metrics::counter!("feedback_undone_total").increment(1);
        tracing::info!(
            user_id = %user.as_str(),
            feedback_id = outcome.event.id.get(),
            action = %outcome.event.action,
            "Undid feedback"
        );
        Ok(outcome)
    }

    /// Returns the user's feedback log, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserNotFound`] for unknown users, or an error if a
    /// store call fails.
    pub fn history(&self, user: &UserId, limit: usize) -> Result<FeedbackHistory> {
        if self.profiles.get_user(user)?.is_none() {
            return Err(Error::UserNotFound(user.clone()));
        }
        Ok(FeedbackHistory {
            items: self.profiles.feedback_history(user, limit)?,
            total: self.profiles.feedback_count(user)?,
        })
    }

    fn current_preference(&self, user: &UserId) -> Result<Vec<f32>> {
        let current = self
            .profiles
            .get_preference(user)?
            .ok_or_else(|| Error::UserNotFound(user.clone()))?;
        check_dimension(&current, self.config.embedding_dim, "taste vector")?;
        Ok(current)
    }

    /// Taste vector before `event`.
    ///
    /// Users start from the zero vector and active events always account
    /// for the stored vector, so undoing the only active event returns to
    /// exact zeros. Otherwise the event's delta is reversed, which after a
    /// chain of undos would leave rounding residue where zero belongs.
    fn restore_preference(
        &self,
        user: &UserId,
        current: &[f32],
        event: &FeedbackEvent,
    ) -> Result<Vec<f32>> {
        if self.profiles.active_feedback_count(user)? <= 1 {
            return Ok(vec![0.0; current.len()]);
        }
        Ok(PreferenceModel::reverse_delta(current, &event.delta))
    }

    /// Restores `previous` after the second write of a pair failed, then
    /// returns the original error.
    fn roll_back<T>(&self, user: &UserId, previous: &[f32], now: u64, cause: Error) -> Result<T> {
        if let Err(e) = self.profiles.set_preference(user, previous, now) {
            tracing::error!(
                user_id = %user.as_str(),
                error = %e,
                "Failed to restore taste vector after a failed log write"
            );
        }
        Err(cause)
    }
}
