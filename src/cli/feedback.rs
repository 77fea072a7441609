//! `feedback` and `history` commands.

use std::fmt;

use super::App;
use crate::models::{FeedbackAction, FeedbackHistory, TrackId, UserId};
use crate::services::FeedbackOutcome;
use crate::{Error, Result};

/// What the `feedback` command was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCommand {
    /// Apply a learning action to a track.
    Apply(FeedbackAction),
    /// Reverse the most recent active feedback.
    Undo,
}

impl FeedbackCommand {
    /// Parses `like`, `dislike`, `more_like_this` or `undo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for anything else.
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("undo") {
            return Ok(Self::Undo);
        }
        FeedbackAction::parse(s).map(Self::Apply)
    }
}

/// Output of `feedback`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackReport {
    /// The command that ran.
    pub command: FeedbackCommand,
    /// The resulting log entry and taste vector.
    pub outcome: FeedbackOutcome,
}

impl fmt::Display for FeedbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = &self.outcome.event;
        match self.command {
            FeedbackCommand::Apply(action) => write!(
                f,
                "Recorded {action} on {} (feedback #{})",
                event.track_id, event.id
            ),
            FeedbackCommand::Undo => write!(
                f,
                "Undid {} on {} (feedback #{})",
                event.action, event.track_id, event.id
            ),
        }
    }
}

/// Applies or undoes feedback.
///
/// `track` is required for learning actions and ignored by `undo`, which
/// always reverses the most recent active event.
///
/// # Errors
///
/// Returns an error for unknown actions, a missing track, unknown users or
/// tracks, an empty undo stack, or a failing store call.
pub fn feedback(app: &App, user: &str, track: Option<&str>, action: &str) -> Result<FeedbackReport> {
    let command = FeedbackCommand::parse(action)?;
    let user = UserId::new(user);

    let outcome = match command {
        FeedbackCommand::Apply(action) => {
            let track = track.ok_or_else(|| {
                Error::InvalidInput(format!("--track is required for {action}"))
            })?;
            app.feedback.apply(&user, &TrackId::new(track), action)?
        },
        FeedbackCommand::Undo => app.feedback.undo(&user)?,
    };

    Ok(FeedbackReport { command, outcome })
}

/// Output of `history`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReport(pub FeedbackHistory);

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history = &self.0;
        write!(
            f,
            "Showing {} of {} feedback events",
            history.items.len(),
            history.total
        )?;
        for event in &history.items {
            write!(
                f,
                "\n  #{:<5} {:<15} {}",
                event.id,
                event.action.as_str(),
                event.track_id
            )?;
            if event.undone {
                write!(f, "  (undone)")?;
            }
        }
        Ok(())
    }
}

/// Shows the user's feedback log, newest first.
///
/// # Errors
///
/// Returns an error for unknown users or a failing store call.
pub fn history(app: &App, user: &str, limit: usize) -> Result<HistoryReport> {
    app.feedback
        .history(&UserId::new(user), limit)
        .map(HistoryReport)
}
