//! # Vibefeed
//!
//! Preference-vector recommendation engine for short audio track feeds.
//!
//! Each user owns a unit-length taste vector in the same embedding space as
//! the track catalog. Feedback nudges the taste vector toward (or away from)
//! a track's embedding with a delta that is logged so it can be reversed.
//! Feeds are composed by scoring candidate tracks against the taste vector,
//! damping over-represented artists, and ranking the result.
//!
//! ## Features
//!
//! - Reversible feedback (`like`, `dislike`, `more_like_this`, stack-pop undo)
//! - Explore feeds drawn from tracks the user has never been shown
//! - Vibe feeds blending liked and fresh tracks within a tag
//! - Reproducible output when a seed is supplied
//! - Pluggable storage (in-memory, `SQLite`)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vibefeed::config::RecommenderConfig;
//! use vibefeed::models::{FeedRequest, Track};
//! use vibefeed::services::{CatalogService, FeedService, UserService};
//! use vibefeed::storage::InMemoryStore;
//!
//! let config = RecommenderConfig::default().with_embedding_dim(3);
//! let store = Arc::new(InMemoryStore::new());
//!
//! let catalog = CatalogService::new(store.clone(), config.clone());
//! catalog.add_track(Track::new("t1", "Intro", "Artist A", vec![1.0, 0.0, 0.0]))?;
//!
//! let users = UserService::new(store.clone(), config.clone());
//! let user = users.create_guest()?;
//!
//! let feed = FeedService::new(store.clone(), store, config);
//! let tracks = feed.compose(&user.id, &FeedRequest::explore(10).with_seed(42))?;
//! assert_eq!(tracks.len(), 1);
//! # Ok::<(), vibefeed::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod embedding;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{RecommenderConfig, VibefeedConfig};
pub use models::{
    FeedMode, FeedRequest, FeedbackAction, FeedbackEvent, FeedbackId, Track, TrackId, User,
    UserId, Vibe, VibeId,
};
pub use services::{CatalogService, FeedService, FeedbackService, UserService};
pub use storage::{CatalogBackend, InMemoryStore, ProfileBackend, SqliteStore};

/// Error type for vibefeed operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnknownAction` | Feedback action is not `like`, `dislike` or `more_like_this` |
/// | `TrackNotFound` | Feedback references a track with no known embedding |
/// | `UserNotFound` | A user id has no stored profile |
/// | `NothingToUndo` | Undo requested but the user has no active feedback |
/// | `InvalidInput` | Bad limits, missing vibe id, dimension mismatch, bad config |
/// | `OperationFailed` | Store, file or parse failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Feedback action outside the learning set.
    #[error("unknown feedback action: {0}")]
    UnknownAction(String),

    /// A referenced track has no known embedding.
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),

    /// A referenced user has no stored profile.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No active (non-undone) feedback event exists for the user.
    ///
    /// This is an expected condition, not a system failure.
    #[error("nothing to undo for user {0}")]
    NothingToUndo(UserId),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Feed limit is zero or above the configured maximum
    /// - Vibe mode is requested without a vibe id
    /// - Vector dimensions do not match the configured dimension
    /// - An embedding contains non-finite values
    /// - A track upsert would change an existing embedding
    /// - Configuration values are out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail
    /// - Filesystem I/O errors occur
    /// - Stored vectors cannot be decoded
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns true for conditions callers are expected to handle as part of
    /// normal flow rather than report as failures.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::NothingToUndo(_))
    }
}

/// Result type alias for vibefeed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use vibefeed::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("limit must be positive".to_string());
        assert_eq!(err.to_string(), "invalid input: limit must be positive");

        let err = Error::OperationFailed {
            operation: "open_database".to_string(),
            cause: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'open_database' failed: permission denied"
        );

        let err = Error::UnknownAction("skip".to_string());
        assert_eq!(err.to_string(), "unknown feedback action: skip");

        let err = Error::TrackNotFound(TrackId::new("t-404"));
        assert_eq!(err.to_string(), "track not found: t-404");

        let err = Error::NothingToUndo(UserId::new("u1"));
        assert_eq!(err.to_string(), "nothing to undo for user u1");
    }

    #[test]
    fn test_nothing_to_undo_is_expected() {
        assert!(Error::NothingToUndo(UserId::new("u1")).is_expected());
        assert!(!Error::TrackNotFound(TrackId::new("t1")).is_expected());
        assert!(!Error::InvalidInput("x".to_string()).is_expected());
    }
}
