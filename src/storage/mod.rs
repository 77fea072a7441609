//! Storage layer abstraction.
//!
//! Two traits split the data by owner:
//! - **Catalog**: tracks, their embeddings and vibe tags ([`CatalogBackend`])
//! - **Profile**: per-user taste, seen sets and the feedback log ([`ProfileBackend`])
//!
//! Both backends here implement both traits, so one store instance can be
//! shared as `Arc<dyn CatalogBackend>` and `Arc<dyn ProfileBackend>`.

// Allow significant_drop_tightening - the connection guard is scoped by `run`.
#![allow(clippy::significant_drop_tightening)]

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CatalogBackend, ProfileBackend};
