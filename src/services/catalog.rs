//! Track catalog management.
//!
//! Tracks enter the catalog here so that every stored embedding has the
//! configured dimension, finite components and unit length.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::config::RecommenderConfig;
use crate::embedding::prepare_embedding;
use crate::models::{Track, TrackId, Vibe, VibeId};
use crate::storage::traits::CatalogBackend;
use crate::{Error, Result};

/// Service for adding tracks and managing the vibe taxonomy.
pub struct CatalogService {
    catalog: Arc<dyn CatalogBackend>,
    config: RecommenderConfig,
}

impl CatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogBackend>, config: RecommenderConfig) -> Self {
        Self { catalog, config }
    }

    /// Validates, normalizes and stores a track.
    ///
    /// Returns the track as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if validation fails (see
    /// [`Self::validate_track`]) or the track exists with a different
    /// embedding.
    #[instrument(skip(self, track), fields(track_id = %track.id.as_str()))]
    pub fn add_track(&self, track: Track) -> Result<Track> {
        let track = self.validate_track(track)?;
        self.catalog.upsert_track(&track)?;
        tracing::debug!(track_id = %track.id.as_str(), vibes = track.vibes.len(), "Stored track");
        Ok(track)
    }

    /// Checks a track and normalizes its embedding without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if:
    /// - The id, title or artist is blank
    /// - The embedding has the wrong dimension or non-finite values
    /// - A vibe tag does not exist
    pub fn validate_track(&self, mut track: Track) -> Result<Track> {
        if track.id.as_str().trim().is_empty() {
            return Err(Error::InvalidInput("track id cannot be empty".to_string()));
        }
        if track.title.trim().is_empty() || track.artist.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "track {} needs a title and an artist",
                track.id
            )));
        }

        track.embedding = prepare_embedding(&track.embedding, self.config.embedding_dim)?;

        if !track.vibes.is_empty() {
            let known: HashSet<VibeId> = self.catalog.list_vibes()?.iter().map(|v| v.id).collect();
            if let Some(unknown) = track.vibes.iter().find(|v| !known.contains(v)) {
                return Err(Error::InvalidInput(format!("unknown vibe id {unknown}")));
            }
        }
        Ok(track)
    }

    /// Gets a track.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrackNotFound`] for unknown ids.
    pub fn get_track(&self, id: &TrackId) -> Result<Track> {
        self.catalog
            .get_track(id)?
            .ok_or_else(|| Error::TrackNotFound(id.clone()))
    }

    /// Number of tracks in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn track_count(&self) -> Result<usize> {
        self.catalog.track_count()
    }

    /// Stores the default vibe taxonomy. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if a store write fails.
    pub fn seed_default_vibes(&self) -> Result<usize> {
        let vibes = Vibe::defaults();
        for vibe in &vibes {
            self.catalog.upsert_vibe(vibe)?;
        }
        tracing::debug!(count = vibes.len(), "Seeded default vibes");
        Ok(vibes.len())
    }

    /// Lists vibes ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn list_vibes(&self) -> Result<Vec<Vibe>> {
        self.catalog.list_vibes()
    }

    /// Resolves a vibe from its numeric id or its name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no vibe matches.
    pub fn resolve_vibe(&self, id_or_name: &str) -> Result<Vibe> {
        let key = id_or_name.trim();
        let found = match key.parse::<i64>() {
            Ok(id) => self
                .catalog
                .list_vibes()?
                .into_iter()
                .find(|v| v.id == VibeId::new(id)),
            Err(_) => self.catalog.find_vibe(key)?,
        };
        found.ok_or_else(|| Error::InvalidInput(format!("unknown vibe '{key}'")))
    }
}
