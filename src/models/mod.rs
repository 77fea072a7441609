//! Data models for vibefeed.
//!
//! This module contains the core data structures shared by the services and
//! the storage backends.

mod feed;
mod feedback;
mod track;
mod user;

pub use feed::{FeedMode, FeedRequest};
pub use feedback::{FeedbackAction, FeedbackEvent, FeedbackHistory, FeedbackId, NewFeedback};
pub use track::{CandidateFeatures, Track, TrackId, Vibe, VibeId};
pub use user::{User, UserId, UserType};
