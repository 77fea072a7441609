//! CLI command implementations.
//!
//! Each submodule runs one command against an [`App`] and returns a report
//! that renders as the command's terminal output. The binary only parses
//! arguments and prints reports.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Create the database and seed the default vibes |
//! | `import` | Load tracks from a CSV file |
//! | `user create` | Create a guest user |
//! | `vibes` | List the vibe taxonomy |
//! | `feed` | Compose an explore or vibe feed |
//! | `feedback` | Apply `like`/`dislike`/`more_like_this`, or `undo` |
//! | `history` | Show a user's feedback log |
//! | `config` | Show the resolved configuration |

mod catalog;
mod config;
mod feed;
mod feedback;
mod users;

pub use catalog::{ImportReport, InitReport, VibeList, import, init, vibes};
pub use config::{ConfigReport, show_config};
pub use feed::{FeedReport, feed};
pub use feedback::{FeedbackCommand, FeedbackReport, HistoryReport, feedback, history};
pub use users::{UserCreated, create_user};

use std::sync::Arc;

use crate::config::VibefeedConfig;
use crate::services::{CatalogService, FeedService, FeedbackService, UserService};
use crate::storage::{CatalogBackend, ProfileBackend, SqliteStore};
use crate::Result;

/// Services wired to one store.
pub struct App {
    /// Resolved configuration.
    pub config: VibefeedConfig,
    /// Catalog service.
    pub catalog: CatalogService,
    /// User service.
    pub users: UserService,
    /// Feed service.
    pub feed: FeedService,
    /// Feedback service.
    pub feedback: FeedbackService,
}

impl App {
    /// Opens the `SQLite` database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: VibefeedConfig) -> Result<Self> {
        let path = config.database_path();
        let store = Arc::new(SqliteStore::new(&path)?);
        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self::with_store(config, store))
    }

    /// Wires services to an existing store.
    #[must_use]
    pub fn with_store<S>(config: VibefeedConfig, store: Arc<S>) -> Self
    where
        S: CatalogBackend + ProfileBackend + 'static,
    {
        let recommender = config.recommender.clone();
        Self {
            catalog: CatalogService::new(store.clone(), recommender.clone()),
            users: UserService::new(store.clone(), recommender.clone()),
            feed: FeedService::new(store.clone(), store.clone(), recommender.clone()),
            feedback: FeedbackService::new(store.clone(), store, recommender),
            config,
        }
    }
}
