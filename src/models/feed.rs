//! Feed request types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::VibeId;
use crate::{Error, Result};

/// Candidate selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "vibe_id")]
pub enum FeedMode {
    /// Only tracks the user has never been shown.
    Explore,
    /// Tracks tagged with one vibe, blending liked and unseen.
    Vibe(VibeId),
}

impl FeedMode {
    /// Returns the mode name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Vibe(_) => "vibe",
        }
    }

    /// Builds a mode from a name and an optional vibe id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown mode names or when vibe
    /// mode is requested without a vibe id.
    pub fn parse(mode: &str, vibe_id: Option<VibeId>) -> Result<Self> {
        match mode.trim().to_lowercase().as_str() {
            "explore" => Ok(Self::Explore),
            "vibe" => vibe_id.map(Self::Vibe).ok_or_else(|| {
                Error::InvalidInput("vibe_id required for vibe mode".to_string())
            }),
            other => Err(Error::InvalidInput(format!(
                "unknown feed mode '{other}' (expected explore or vibe)"
            ))),
        }
    }
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explore => f.write_str("explore"),
            Self::Vibe(id) => write!(f, "vibe:{id}"),
        }
    }
}

/// Parameters for one feed composition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRequest {
    /// Selection policy.
    pub mode: FeedMode,
    /// Maximum number of tracks to return.
    pub limit: usize,
    /// Seed for reproducible sampling; `None` draws fresh randomness.
    pub seed: Option<u64>,
}

impl FeedRequest {
    /// Creates an explore request.
    #[must_use]
    pub const fn explore(limit: usize) -> Self {
        Self {
            mode: FeedMode::Explore,
            limit,
            seed: None,
        }
    }

    /// Creates a vibe request.
    #[must_use]
    pub const fn vibe(vibe_id: VibeId, limit: usize) -> Self {
        Self {
            mode: FeedMode::Vibe(vibe_id),
            limit,
            seed: None,
        }
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the limit against `1..=max_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the limit is out of range.
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        if self.limit == 0 || self.limit > max_limit {
            return Err(Error::InvalidInput(format!(
                "limit must be within 1..={max_limit}, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!(FeedMode::parse("explore", None).unwrap(), FeedMode::Explore);
        assert_eq!(
            FeedMode::parse("Vibe", Some(VibeId::new(2))).unwrap(),
            FeedMode::Vibe(VibeId::new(2))
        );
    }

    #[test]
    fn test_vibe_mode_requires_id() {
        assert!(matches!(
            FeedMode::parse("vibe", None),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_mode() {
        assert!(FeedMode::parse("trending", None).is_err());
    }

    #[test]
    fn test_validate_limit_bounds() {
        assert!(FeedRequest::explore(0).validate(50).is_err());
        assert!(FeedRequest::explore(1).validate(50).is_ok());
        assert!(FeedRequest::explore(50).validate(50).is_ok());
        assert!(FeedRequest::explore(51).validate(50).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FeedMode::Explore.to_string(), "explore");
        assert_eq!(FeedMode::Vibe(VibeId::new(3)).to_string(), "vibe:3");
    }
}
