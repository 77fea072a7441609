//! User profile types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random guest ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a user account was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Anonymous account created on first visit.
    #[default]
    Guest,
    /// Account linked to an external streaming identity.
    Linked,
}

impl UserType {
    /// Returns the storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Linked => "linked",
        }
    }

    /// Parses a storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(Self::Guest),
            "linked" | "spotify" => Some(Self::Linked),
            _ => None,
        }
    }
}

/// A user and their learned taste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Account kind.
    pub user_type: UserType,
    /// Taste vector; zero until the first feedback.
    pub preference: Vec<f32>,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
    /// Last preference update (Unix epoch seconds).
    pub updated_at: u64,
}

impl User {
    /// Creates a guest user with a zero taste vector of `dim` entries.
    #[must_use]
    pub fn guest(id: UserId, dim: usize, now: u64) -> Self {
        Self {
            id,
            user_type: UserType::Guest,
            preference: vec![0.0; dim],
            created_at: now,
            updated_at: now,
        }
    }
}
