//! Configuration management.
//!
//! Resolution order: built-in defaults, then the TOML config file, then
//! `VIBEFEED_*` environment variables.

mod recommender;

pub use recommender::{ConfigFileRecommender, RecommenderConfig};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for vibefeed.
#[derive(Debug, Clone)]
pub struct VibefeedConfig {
    /// Directory holding the database and log files.
    pub data_dir: PathBuf,
    /// Explicit database path; defaults to `data_dir/vibefeed.db`.
    pub database_path: Option<PathBuf>,
    /// Recommender tuning parameters.
    pub recommender: RecommenderConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `vibefeed=debug`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Optional log file path.
    pub file: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Database path.
    pub database_path: Option<String>,
    /// Recommender section.
    pub recommender: Option<ConfigFileRecommender>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl Default for VibefeedConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vibefeed"),
            database_path: None,
            recommender: RecommenderConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl VibefeedConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting recommender configuration is invalid.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Parses configuration from TOML text, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`] or
    /// the recommender values fail validation.
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let mut config = Self::from_config_file(file);
        config.apply_env_overrides();
        config.recommender.validate()?;
        Ok(config)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<platform config dir>/vibefeed/config.toml`, then
    /// `~/.config/vibefeed/config.toml`. Returns defaults (with environment
    /// overrides) if neither exists or parses.
    #[must_use]
    pub fn load_default() -> Self {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            let candidates = [
                base_dirs.config_dir().join("vibefeed").join("config.toml"),
                base_dirs
                    .home_dir()
                    .join(".config")
                    .join("vibefeed")
                    .join("config.toml"),
            ];
            for path in candidates.iter().filter(|p| p.exists()) {
                match Self::load_from_file(path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    },
                }
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Converts a `ConfigFile` to `VibefeedConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(database_path) = file.database_path {
            config.database_path = Some(PathBuf::from(database_path));
        }
        if let Some(recommender) = file.recommender {
            config.recommender.apply_file(&recommender);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies `VIBEFEED_DATA_DIR`, `VIBEFEED_DATABASE_PATH` and the
    /// recommender overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("VIBEFEED_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("VIBEFEED_DATABASE_PATH") {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path));
            }
        }
        self.recommender.apply_env_overrides();
    }

    /// Returns the resolved database path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("vibefeed.db"))
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the recommender configuration.
    #[must_use]
    pub fn with_recommender(mut self, recommender: RecommenderConfig) -> Self {
        self.recommender = recommender;
        self
    }
}
