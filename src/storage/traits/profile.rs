//! Profile backend trait.
//!
//! Per-user learned state: the taste vector, the seen set and the feedback
//! log. Serializing concurrent writers for one user is the caller's job
//! (see [`crate::services::UserLocks`]); backends only need each single
//! call to be atomic.

use std::collections::HashSet;

use crate::Result;
use crate::models::{FeedbackEvent, FeedbackId, NewFeedback, TrackId, User, UserId};

/// Trait for user profile backends.
pub trait ProfileBackend: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the id is taken, or an
    /// operation error if the write fails.
    fn create_user(&self, user: &User) -> Result<()>;

    /// Gets a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Gets a user's taste vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_preference(&self, id: &UserId) -> Result<Option<Vec<f32>>>;

    /// Replaces a user's taste vector and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UserNotFound`] for unknown users.
    fn set_preference(&self, id: &UserId, preference: &[f32], updated_at: u64) -> Result<()>;

    /// Returns the set of track ids already shown to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn seen_tracks(&self, id: &UserId) -> Result<HashSet<TrackId>>;

    /// Adds track ids to the user's seen set. Already-seen ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn mark_seen(&self, id: &UserId, tracks: &[TrackId], seen_at: u64) -> Result<()>;

    /// Appends a feedback event and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_feedback(&self, feedback: NewFeedback) -> Result<FeedbackEvent>;

    /// Returns the most recent feedback event that has not been undone.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn latest_active_feedback(&self, id: &UserId) -> Result<Option<FeedbackEvent>>;

    /// Number of the user's feedback events that have not been undone.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn active_feedback_count(&self, id: &UserId) -> Result<usize>;

    /// Flags a feedback event as undone.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or the write fails.
    fn mark_undone(&self, feedback: FeedbackId) -> Result<()>;

    /// Distinct track ids with an active `like` or `more_like_this`, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn liked_tracks(&self, id: &UserId) -> Result<Vec<TrackId>>;

    /// Feedback events, newest first, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn feedback_history(&self, id: &UserId, limit: usize) -> Result<Vec<FeedbackEvent>>;

    /// Total number of feedback events for the user, undone ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn feedback_count(&self, id: &UserId) -> Result<usize>;
}
