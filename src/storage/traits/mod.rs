//! Storage backend traits.

mod catalog;
mod profile;

pub use catalog::CatalogBackend;
pub use profile::ProfileBackend;
