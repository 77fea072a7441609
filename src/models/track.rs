//! Track and vibe types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Creates a new track ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for a vibe tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VibeId(i64);

impl VibeId {
    /// Creates a new vibe ID.
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

impl fmt::Display for VibeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category label tracks can be tagged with ("chill", "party", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vibe {
    /// Numeric identifier.
    pub id: VibeId,
    /// Unique lowercase name.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Display color as a hex string.
    pub color: Option<String>,
}

impl Vibe {
    /// Creates a vibe with only an id and a name.
    #[must_use]
    pub fn new(id: VibeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            color: None,
        }
    }

    /// The default vibe taxonomy, ids 1 through 6.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [
            ("energetic", "High energy, intense and powerful", "#FF6B6B"),
            ("chill", "Relaxed, calm and mellow", "#4ECDC4"),
            ("melancholic", "Sad, emotional and introspective", "#95A5A6"),
            ("upbeat", "Happy, positive and cheerful", "#FFD93D"),
            ("focus", "Concentration and productivity", "#6C5CE7"),
            ("party", "Dance, celebration and excitement", "#FD79A8"),
        ]
        .into_iter()
        .zip(1..)
        .map(|((name, description, color), id)| Self {
            id: VibeId::new(id),
            name: name.to_string(),
            description: Some(description.to_string()),
            color: Some(color.to_string()),
        })
        .collect()
    }
}

/// A track in the catalog.
///
/// The embedding is assigned once at creation and never changes afterwards;
/// stores reject upserts that would alter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier.
    pub id: TrackId,
    /// Track title.
    pub title: String,
    /// Artist label, used for diversity penalties.
    pub artist: String,
    /// Album name.
    pub album: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Unit-length audio embedding.
    pub embedding: Vec<f32>,
    /// Vibe tags.
    pub vibes: Vec<VibeId>,
}

impl Track {
    /// Creates an untagged track.
    #[must_use]
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_ms: None,
            embedding,
            vibes: Vec::new(),
        }
    }

    /// Adds a vibe tag.
    #[must_use]
    pub fn with_vibe(mut self, vibe: VibeId) -> Self {
        if !self.vibes.contains(&vibe) {
            self.vibes.push(vibe);
        }
        self
    }

    /// Sets the album name.
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Returns true if the track carries the given vibe tag.
    #[must_use]
    pub fn has_vibe(&self, vibe: VibeId) -> bool {
        self.vibes.contains(&vibe)
    }
}

/// The per-candidate attributes feed composition needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFeatures {
    /// Track identifier.
    pub id: TrackId,
    /// Artist label.
    pub artist: String,
    /// Track embedding.
    pub embedding: Vec<f32>,
}

impl From<&Track> for CandidateFeatures {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            artist: track.artist.clone(),
            embedding: track.embedding.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vibes_are_numbered_from_one() {
        let vibes = Vibe::defaults();
        assert_eq!(vibes.len(), 6);
        assert_eq!(vibes[0].id, VibeId::new(1));
        assert_eq!(vibes[0].name, "energetic");
        assert_eq!(vibes[5].id, VibeId::new(6));
        assert_eq!(vibes[5].name, "party");
    }

    #[test]
    fn test_with_vibe_deduplicates() {
        let track = Track::new("t1", "Song", "Artist", vec![1.0])
            .with_vibe(VibeId::new(2))
            .with_vibe(VibeId::new(2));
        assert_eq!(track.vibes, vec![VibeId::new(2)]);
        assert!(track.has_vibe(VibeId::new(2)));
        assert!(!track.has_vibe(VibeId::new(3)));
    }

    #[test]
    fn test_track_ids_order_lexicographically() {
        let mut ids = vec![TrackId::new("b"), TrackId::new("a"), TrackId::new("c")];
        ids.sort();
        assert_eq!(ids, vec![TrackId::new("a"), TrackId::new("b"), TrackId::new("c")]);
    }
}
