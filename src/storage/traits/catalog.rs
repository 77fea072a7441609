//! Catalog backend trait.
//!
//! The catalog holds tracks, their immutable embeddings and their vibe
//! tags. Feed composition only needs ids, artists and embeddings, so the
//! trait exposes those directly instead of whole track records.

use crate::Result;
use crate::models::{CandidateFeatures, Track, TrackId, Vibe, VibeId};

/// Trait for track catalog backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn CatalogBackend>`
/// - Use interior mutability for mutable state
/// - Id listings must be returned in ascending id order; seeded sampling
///   relies on a canonical pool order to be reproducible
pub trait CatalogBackend: Send + Sync {
    /// Inserts a track, or updates its metadata and tags if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the track exists with a
    /// different embedding, or an operation error if the write fails.
    fn upsert_track(&self, track: &Track) -> Result<()>;

    /// Gets a track by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_track(&self, id: &TrackId) -> Result<Option<Track>>;

    /// Gets a track's embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_embedding(&self, id: &TrackId) -> Result<Option<Vec<f32>>>;

    /// Returns id, artist and embedding for each known id, in input order.
    ///
    /// Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn candidate_features(&self, ids: &[TrackId]) -> Result<Vec<CandidateFeatures>>;

    /// Lists track ids in ascending order, optionally restricted to a vibe.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn track_ids(&self, vibe: Option<VibeId>) -> Result<Vec<TrackId>>;

    /// Returns the number of tracks.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn track_count(&self) -> Result<usize>;

    /// Inserts a vibe, or updates its description and color if the id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the name belongs to another id.
    fn upsert_vibe(&self, vibe: &Vibe) -> Result<()>;

    /// Lists vibes ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_vibes(&self) -> Result<Vec<Vibe>>;

    /// Finds a vibe by its (case-insensitive) name.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find_vibe(&self, name: &str) -> Result<Option<Vibe>>;
}
