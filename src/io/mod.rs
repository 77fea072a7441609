//! Catalog import.
//!
//! Tracks are loaded in bulk from CSV exports. Each row passes through
//! [`CatalogService::validate_track`](crate::services::CatalogService::validate_track)
//! so imported embeddings obey the same rules as tracks added one at a time.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use std::sync::Arc;
//! use vibefeed::config::RecommenderConfig;
//! use vibefeed::io::{ImportOptions, import_tracks};
//! use vibefeed::services::CatalogService;
//! use vibefeed::storage::InMemoryStore;
//!
//! let config = RecommenderConfig::default().with_embedding_dim(2);
//! let catalog = CatalogService::new(Arc::new(InMemoryStore::new()), config);
//!
//! let csv = "track_id,title,artist,embedding\nt1,Song,Band,1 0\n";
//! let result = import_tracks(Cursor::new(csv), &catalog, &ImportOptions::default())?;
//! assert_eq!(result.imported, 1);
//! # Ok::<(), vibefeed::Error>(())
//! ```

pub mod csv;

pub use csv::{
    CsvTrackSource, ImportIssue, ImportOptions, ImportResult, TrackRecord, import_file,
    import_tracks, parse_embedding, parse_vibes,
};
