//! In-memory store for tests and embedding.
//!
//! Implements both [`CatalogBackend`] and [`ProfileBackend`] over plain
//! collections. Data is not persisted between runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{
    CandidateFeatures, FeedbackEvent, FeedbackId, NewFeedback, Track, TrackId, User, UserId,
    Vibe, VibeId,
};
use crate::storage::traits::{CatalogBackend, ProfileBackend};
use crate::{Error, Result};

/// In-memory catalog and profile store.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
///
/// # Example
///
/// ```rust
/// use vibefeed::storage::InMemoryStore;
/// use vibefeed::storage::CatalogBackend;
///
/// let store = InMemoryStore::new();
/// assert_eq!(store.track_count().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tracks: RwLock<BTreeMap<TrackId, Track>>,
    vibes: RwLock<BTreeMap<VibeId, Vibe>>,
    users: RwLock<HashMap<UserId, User>>,
    seen: RwLock<HashMap<UserId, HashSet<TrackId>>>,
    feedback: RwLock<Vec<FeedbackEvent>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of users stored.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, operation: &str) -> Result<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| poisoned(operation))
}

fn write<'a, T>(lock: &'a RwLock<T>, operation: &str) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| poisoned(operation))
}

fn poisoned(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "Lock poisoned".to_string(),
    }
}

impl CatalogBackend for InMemoryStore {
    fn upsert_track(&self, track: &Track) -> Result<()> {
        let mut tracks = write(&self.tracks, "upsert_track")?;

        if let Some(existing) = tracks.get(&track.id) {
            if existing.embedding != track.embedding {
                return Err(Error::InvalidInput(format!(
                    "embedding of track {} cannot change",
                    track.id
                )));
            }
        }

        tracks.insert(track.id.clone(), track.clone());
        Ok(())
    }

    fn get_track(&self, id: &TrackId) -> Result<Option<Track>> {
        let tracks = read(&self.tracks, "get_track")?;
        Ok(tracks.get(id).cloned())
    }

    fn get_embedding(&self, id: &TrackId) -> Result<Option<Vec<f32>>> {
        let tracks = read(&self.tracks, "get_embedding")?;
        Ok(tracks.get(id).map(|t| t.embedding.clone()))
    }

    fn candidate_features(&self, ids: &[TrackId]) -> Result<Vec<CandidateFeatures>> {
        let tracks = read(&self.tracks, "candidate_features")?;
        Ok(ids
            .iter()
            .filter_map(|id| tracks.get(id))
            .map(CandidateFeatures::from)
            .collect())
    }

    fn track_ids(&self, vibe: Option<VibeId>) -> Result<Vec<TrackId>> {
        let tracks = read(&self.tracks, "track_ids")?;
        Ok(tracks
            .values()
            .filter(|t| vibe.is_none_or(|v| t.has_vibe(v)))
            .map(|t| t.id.clone())
            .collect())
    }

    fn track_count(&self) -> Result<usize> {
        Ok(read(&self.tracks, "track_count")?.len())
    }

    fn upsert_vibe(&self, vibe: &Vibe) -> Result<()> {
        let mut vibes = write(&self.vibes, "upsert_vibe")?;

        let name = vibe.name.to_lowercase();
        if vibes
            .values()
            .any(|v| v.id != vibe.id && v.name.to_lowercase() == name)
        {
            return Err(Error::InvalidInput(format!(
                "vibe name '{}' is already in use",
                vibe.name
            )));
        }

        vibes.insert(vibe.id, vibe.clone());
        Ok(())
    }

    fn list_vibes(&self) -> Result<Vec<Vibe>> {
        let vibes = read(&self.vibes, "list_vibes")?;
        let mut result: Vec<Vibe> = vibes.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn find_vibe(&self, name: &str) -> Result<Option<Vibe>> {
        let vibes = read(&self.vibes, "find_vibe")?;
        let name = name.trim().to_lowercase();
        Ok(vibes
            .values()
            .find(|v| v.name.to_lowercase() == name)
            .cloned())
    }
}

impl ProfileBackend for InMemoryStore {
    fn create_user(&self, user: &User) -> Result<()> {
        let mut users = write(&self.users, "create_user")?;
        if users.contains_key(&user.id) {
            return Err(Error::InvalidInput(format!(
                "user {} already exists",
                user.id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let users = read(&self.users, "get_user")?;
        Ok(users.get(id).cloned())
    }

    fn get_preference(&self, id: &UserId) -> Result<Option<Vec<f32>>> {
        let users = read(&self.users, "get_preference")?;
        Ok(users.get(id).map(|u| u.preference.clone()))
    }

    fn set_preference(&self, id: &UserId, preference: &[f32], updated_at: u64) -> Result<()> {
        let mut users = write(&self.users, "set_preference")?;
        let user = users
            .get_mut(id)
            .ok_or_else(|| Error::UserNotFound(id.clone()))?;
        user.preference = preference.to_vec();
        user.updated_at = updated_at;
        Ok(())
    }

    fn seen_tracks(&self, id: &UserId) -> Result<HashSet<TrackId>> {
        let seen = read(&self.seen, "seen_tracks")?;
        Ok(seen.get(id).cloned().unwrap_or_default())
    }

    fn mark_seen(&self, id: &UserId, tracks: &[TrackId], _seen_at: u64) -> Result<()> {
        if tracks.is_empty() {
            return Ok(());
        }
        let mut seen = write(&self.seen, "mark_seen")?;
        seen.entry(id.clone())
            .or_default()
            .extend(tracks.iter().cloned());
        Ok(())
    }

    fn append_feedback(&self, feedback: NewFeedback) -> Result<FeedbackEvent> {
        let mut log = write(&self.feedback, "append_feedback")?;
        let next = log.last().map_or(1, |e| e.id.get() + 1);
        let event = FeedbackEvent::from_new(FeedbackId::new(next), feedback);
        log.push(event.clone());
        Ok(event)
    }

    fn latest_active_feedback(&self, id: &UserId) -> Result<Option<FeedbackEvent>> {
        let log = read(&self.feedback, "latest_active_feedback")?;
        Ok(log
            .iter()
            .rev()
            .find(|e| &e.user_id == id && e.is_active())
            .cloned())
    }

    fn active_feedback_count(&self, id: &UserId) -> Result<usize> {
        let log = read(&self.feedback, "active_feedback_count")?;
        Ok(log
            .iter()
            .filter(|e| &e.user_id == id && e.is_active())
            .count())
    }

    fn mark_undone(&self, feedback: FeedbackId) -> Result<()> {
        let mut log = write(&self.feedback, "mark_undone")?;
        let event = log
            .iter_mut()
            .find(|e| e.id == feedback)
            .ok_or_else(|| Error::OperationFailed {
                operation: "mark_undone".to_string(),
                cause: format!("Feedback not found: {feedback}"),
            })?;
        event.undone = true;
        Ok(())
    }

    fn liked_tracks(&self, id: &UserId) -> Result<Vec<TrackId>> {
        let log = read(&self.feedback, "liked_tracks")?;
        let mut liked: Vec<TrackId> = log
            .iter()
            .filter(|e| &e.user_id == id && e.is_active() && e.action.is_positive())
            .map(|e| e.track_id.clone())
            .collect();
        liked.sort();
        liked.dedup();
        Ok(liked)
    }

    fn feedback_history(&self, id: &UserId, limit: usize) -> Result<Vec<FeedbackEvent>> {
        let log = read(&self.feedback, "feedback_history")?;
        Ok(log
            .iter()
            .rev()
            .filter(|e| &e.user_id == id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn feedback_count(&self, id: &UserId) -> Result<usize> {
        let log = read(&self.feedback, "feedback_count")?;
        Ok(log.iter().filter(|e| &e.user_id == id).count())
    }
}
