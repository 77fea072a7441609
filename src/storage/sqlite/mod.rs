//! `SQLite` storage.
//!
//! ## Module Structure
//!
//! - `connection`: opening, pragmas, poison-tolerant locking, metrics
//! - `schema`: table definitions applied on open
//! - `rows`: row conversion and JSON vector encoding

mod connection;
mod rows;
mod schema;
mod store;

pub use connection::{BUSY_TIMEOUT, lock_connection, open_file};
pub use rows::{decode_vector, encode_vector};
pub use store::SqliteStore;
