//! Feedback actions and the feedback log entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{TrackId, UserId};
use crate::Error;

/// A learning action a user can take on a track.
///
/// `undo` is deliberately not a variant: it is an operation on the log,
/// not a signal about a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    /// Pull taste toward the track.
    Like,
    /// Push taste away from the track.
    Dislike,
    /// Pull taste toward the track with the stronger rate.
    MoreLikeThis,
}

impl FeedbackAction {
    /// Returns all learning actions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Like, Self::Dislike, Self::MoreLikeThis]
    }

    /// Returns the wire/storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::MoreLikeThis => "more_like_this",
        }
    }

    /// Parses an action string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for anything outside the learning set,
    /// including `undo`.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "more_like_this" | "more-like-this" => Ok(Self::MoreLikeThis),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }

    /// Returns true if the action marks the track as liked for vibe feeds.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Like | Self::MoreLikeThis)
    }
}

impl fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier assigned to a feedback event by the store.
///
/// Ids increase monotonically per store, so the largest id is the most
/// recent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(i64);

impl FeedbackId {
    /// Creates a feedback ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric ID.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A feedback event that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    /// The user giving feedback.
    pub user_id: UserId,
    /// The track the feedback is about.
    pub track_id: TrackId,
    /// The action taken.
    pub action: FeedbackAction,
    /// Exact change applied to the stored taste vector.
    pub delta: Vec<f32>,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
}

/// An entry in the append-only feedback log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// Store-assigned identifier.
    pub id: FeedbackId,
    /// The user giving feedback.
    pub user_id: UserId,
    /// The track the feedback is about.
    pub track_id: TrackId,
    /// The action taken.
    pub action: FeedbackAction,
    /// Exact change applied to the stored taste vector.
    pub delta: Vec<f32>,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
    /// Soft-delete flag set by undo.
    pub undone: bool,
}

impl FeedbackEvent {
    /// Builds a stored event from a pending one.
    #[must_use]
    pub fn from_new(id: FeedbackId, new: NewFeedback) -> Self {
        Self {
            id,
            user_id: new.user_id,
            track_id: new.track_id,
            action: new.action,
            delta: new.delta,
            created_at: new.created_at,
            undone: false,
        }
    }

    /// Returns true if the event still counts toward taste and liked sets.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.undone
    }
}

/// A page of feedback history.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackHistory {
    /// Events, newest first.
    pub items: Vec<FeedbackEvent>,
    /// Total number of events for the user, undone ones included.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("like", FeedbackAction::Like)]
    #[test_case("dislike", FeedbackAction::Dislike)]
    #[test_case("more_like_this", FeedbackAction::MoreLikeThis)]
    #[test_case("More-Like-This", FeedbackAction::MoreLikeThis)]
    #[test_case(" LIKE ", FeedbackAction::Like)]
    fn test_parse_known_actions(input: &str, expected: FeedbackAction) {
        assert_eq!(FeedbackAction::parse(input).unwrap(), expected);
    }

    #[test_case("undo")]
    #[test_case("skip")]
    #[test_case("")]
    fn test_parse_rejects_unknown(input: &str) {
        assert!(matches!(
            FeedbackAction::parse(input),
            Err(Error::UnknownAction(_))
        ));
    }

    #[test]
    fn test_as_str_roundtrips() {
        for action in FeedbackAction::all() {
            assert_eq!(action.as_str().parse::<FeedbackAction>().unwrap(), *action);
        }
    }

    #[test]
    fn test_positive_actions() {
        assert!(FeedbackAction::Like.is_positive());
        assert!(FeedbackAction::MoreLikeThis.is_positive());
        assert!(!FeedbackAction::Dislike.is_positive());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FeedbackAction::MoreLikeThis).unwrap();
        assert_eq!(json, "\"more_like_this\"");
    }
}
