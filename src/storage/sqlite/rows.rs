//! Row conversion for the `SQLite` store.
//!
//! Vectors are stored as JSON arrays in TEXT columns. `serde_json` writes the
//! shortest representation that parses back to the same `f32`, so a stored
//! delta decodes to exactly the value that was applied.

use rusqlite::Row;

use crate::models::{FeedbackAction, FeedbackEvent, FeedbackId, TrackId, User, UserId, UserType};
use crate::{Error, Result};

/// Encodes a vector as a JSON array.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn encode_vector(v: &[f32]) -> Result<String> {
    serde_json::to_string(v).map_err(|e| Error::OperationFailed {
        operation: "encode_vector".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes a JSON array into a vector.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the text is not a JSON number array.
pub fn decode_vector(text: &str) -> Result<Vec<f32>> {
    serde_json::from_str(text).map_err(|e| Error::OperationFailed {
        operation: "decode_vector".to_string(),
        cause: e.to_string(),
    })
}

/// Converts a u64 timestamp to i64 for `SQLite` storage.
#[allow(clippy::cast_possible_wrap)]
pub const fn to_db_timestamp(ts: u64) -> i64 {
    ts as i64
}

/// Converts an i64 from `SQLite` back to a u64 timestamp.
#[allow(clippy::cast_sign_loss)]
pub const fn from_db_timestamp(ts: i64) -> u64 {
    ts as u64
}

/// Raw user columns before vector decoding.
pub struct UserRow {
    id: String,
    user_type: String,
    preference: String,
    created_at: i64,
    updated_at: i64,
}

impl UserRow {
    /// Column list matching [`UserRow::from_row`].
    pub const COLUMNS: &'static str = "user_id, user_type, preference_vector, created_at, updated_at";

    /// Reads the raw columns.
    ///
    /// # Errors
    ///
    /// Returns a rusqlite error if a column has the wrong type.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_type: row.get(1)?,
            preference: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    /// Builds the domain user.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored vector cannot be decoded.
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: UserId::new(self.id),
            user_type: UserType::parse(&self.user_type).unwrap_or_default(),
            preference: decode_vector(&self.preference)?,
            created_at: from_db_timestamp(self.created_at),
            updated_at: from_db_timestamp(self.updated_at),
        })
    }
}

/// Raw feedback columns before action parsing and vector decoding.
pub struct FeedbackRow {
    id: i64,
    user_id: String,
    track_id: String,
    action: String,
    delta: String,
    created_at: i64,
    undone: bool,
}

impl FeedbackRow {
    /// Column list matching [`FeedbackRow::from_row`].
    pub const COLUMNS: &'static str =
        "feedback_id, user_id, track_id, action, preference_delta, created_at, undone";

    /// Reads the raw columns.
    ///
    /// # Errors
    ///
    /// Returns a rusqlite error if a column has the wrong type.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            track_id: row.get(2)?,
            action: row.get(3)?,
            delta: row.get(4)?,
            created_at: row.get(5)?,
            undone: row.get::<_, i64>(6)? != 0,
        })
    }

    /// Builds the domain event.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is unknown or the delta cannot be
    /// decoded.
    pub fn into_event(self) -> Result<FeedbackEvent> {
        let action = FeedbackAction::parse(&self.action).map_err(|e| Error::OperationFailed {
            operation: "decode_feedback".to_string(),
            cause: e.to_string(),
        })?;
        Ok(FeedbackEvent {
            id: FeedbackId::new(self.id),
            user_id: UserId::new(self.user_id),
            track_id: TrackId::new(self.track_id),
            action,
            delta: decode_vector(&self.delta)?,
            created_at: from_db_timestamp(self.created_at),
            undone: self.undone,
        })
    }
}
