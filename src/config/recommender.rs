//! Recommender tuning parameters.
//!
//! Every constant the engine is parameterized by lives here and is passed
//! into services explicitly, so several configurations can coexist in one
//! process (tests, A/B runs).

use serde::Deserialize;

use crate::{Error, Result};

/// Tunable recommender parameters.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `VIBEFEED_EMBEDDING_DIM` | usize | `128` | Embedding dimension `D` |
/// | `VIBEFEED_ALPHA_LIKE` | f32 | `0.3` | Learning rate for `like` |
/// | `VIBEFEED_BETA_DISLIKE` | f32 | `0.5` | Learning rate for `dislike` |
/// | `VIBEFEED_GAMMA_MORE_LIKE` | f32 | `0.6` | Learning rate for `more_like_this` |
/// | `VIBEFEED_EXPLORE_CANDIDATE_MULTIPLIER` | usize | `5` | Explore draw size per requested track |
/// | `VIBEFEED_VIBE_UNSEEN_RATIO` | f32 | `0.4` | Share of a vibe feed reserved for unseen tracks |
/// | `VIBEFEED_DIVERSITY_ARTIST_PENALTY` | f32 | `0.3` | Per-repeat artist penalty |
/// | `VIBEFEED_DEFAULT_FEED_SIZE` | usize | `10` | Feed size when none is requested |
/// | `VIBEFEED_MAX_FEED_SIZE` | usize | `50` | Upper bound on a feed request |
///
/// # Example
///
/// ```rust
/// use vibefeed::config::RecommenderConfig;
///
/// let config = RecommenderConfig::default();
/// assert_eq!(config.embedding_dim, 128);
/// assert_eq!(config.explore_candidate_multiplier, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Embedding dimension shared by tracks and taste vectors.
    pub embedding_dim: usize,
    /// Learning rate applied on `like`.
    pub alpha_like: f32,
    /// Learning rate applied (negated) on `dislike`.
    pub beta_dislike: f32,
    /// Learning rate applied on `more_like_this`.
    pub gamma_more_like: f32,
    /// Explore mode samples `limit * multiplier` candidates before ranking.
    pub explore_candidate_multiplier: usize,
    /// Fraction of a vibe feed filled from unseen tracks.
    pub vibe_unseen_ratio: f32,
    /// Score penalty per additional track by the same artist in a batch.
    pub diversity_artist_penalty: f32,
    /// Feed size used when a request does not name one.
    pub default_feed_size: usize,
    /// Largest accepted feed size.
    pub max_feed_size: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 128,
            alpha_like: 0.3,
            beta_dislike: 0.5,
            gamma_more_like: 0.6,
            explore_candidate_multiplier: 5,
            vibe_unseen_ratio: 0.4,
            diversity_artist_penalty: 0.3,
            default_feed_size: 10,
            max_feed_size: 50,
        }
    }
}

/// `[recommender]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRecommender {
    /// Embedding dimension.
    pub embedding_dim: Option<usize>,
    /// Like learning rate.
    pub alpha_like: Option<f32>,
    /// Dislike learning rate.
    pub beta_dislike: Option<f32>,
    /// More-like-this learning rate.
    pub gamma_more_like: Option<f32>,
    /// Explore candidate multiplier.
    pub explore_candidate_multiplier: Option<usize>,
    /// Vibe unseen ratio.
    pub vibe_unseen_ratio: Option<f32>,
    /// Diversity artist penalty.
    pub diversity_artist_penalty: Option<f32>,
    /// Default feed size.
    pub default_feed_size: Option<usize>,
    /// Maximum feed size.
    pub max_feed_size: Option<usize>,
}

impl RecommenderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from defaults plus environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Overlays values present in a config file section.
    pub fn apply_file(&mut self, file: &ConfigFileRecommender) {
        if let Some(v) = file.embedding_dim {
            self.embedding_dim = v;
        }
        if let Some(v) = file.alpha_like {
            self.alpha_like = v;
        }
        if let Some(v) = file.beta_dislike {
            self.beta_dislike = v;
        }
        if let Some(v) = file.gamma_more_like {
            self.gamma_more_like = v;
        }
        if let Some(v) = file.explore_candidate_multiplier {
            self.explore_candidate_multiplier = v;
        }
        if let Some(v) = file.vibe_unseen_ratio {
            self.vibe_unseen_ratio = v;
        }
        if let Some(v) = file.diversity_artist_penalty {
            self.diversity_artist_penalty = v;
        }
        if let Some(v) = file.default_feed_size {
            self.default_feed_size = v;
        }
        if let Some(v) = file.max_feed_size {
            self.max_feed_size = v;
        }
    }

    /// Overlays values from `VIBEFEED_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env("VIBEFEED_EMBEDDING_DIM") {
            self.embedding_dim = v;
        }
        if let Some(v) = parse_env("VIBEFEED_ALPHA_LIKE") {
            self.alpha_like = v;
        }
        if let Some(v) = parse_env("VIBEFEED_BETA_DISLIKE") {
            self.beta_dislike = v;
        }
        if let Some(v) = parse_env("VIBEFEED_GAMMA_MORE_LIKE") {
            self.gamma_more_like = v;
        }
        if let Some(v) = parse_env("VIBEFEED_EXPLORE_CANDIDATE_MULTIPLIER") {
            self.explore_candidate_multiplier = v;
        }
        if let Some(v) = parse_env("VIBEFEED_VIBE_UNSEEN_RATIO") {
            self.vibe_unseen_ratio = v;
        }
        if let Some(v) = parse_env("VIBEFEED_DIVERSITY_ARTIST_PENALTY") {
            self.diversity_artist_penalty = v;
        }
        if let Some(v) = parse_env("VIBEFEED_DEFAULT_FEED_SIZE") {
            self.default_feed_size = v;
        }
        if let Some(v) = parse_env("VIBEFEED_MAX_FEED_SIZE") {
            self.max_feed_size = v;
        }
    }

    /// Checks that every parameter is within its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(invalid("embedding_dim must be greater than zero"));
        }
        for (name, rate) in [
            ("alpha_like", self.alpha_like),
            ("beta_dislike", self.beta_dislike),
            ("gamma_more_like", self.gamma_more_like),
        ] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid(&format!("{name} must be a positive number, got {rate}")));
            }
        }
        if self.explore_candidate_multiplier == 0 {
            return Err(invalid("explore_candidate_multiplier must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.vibe_unseen_ratio) {
            return Err(invalid(&format!(
                "vibe_unseen_ratio must be within [0, 1], got {}",
                self.vibe_unseen_ratio
            )));
        }
        if !self.diversity_artist_penalty.is_finite() || self.diversity_artist_penalty < 0.0 {
            return Err(invalid("diversity_artist_penalty must be non-negative"));
        }
        if self.max_feed_size == 0 {
            return Err(invalid("max_feed_size must be at least 1"));
        }
        if self.default_feed_size == 0 || self.default_feed_size > self.max_feed_size {
            return Err(invalid(&format!(
                "default_feed_size must be within 1..={}, got {}",
                self.max_feed_size, self.default_feed_size
            )));
        }
        Ok(())
    }

    /// Builder method to set the embedding dimension.
    #[must_use]
    pub const fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Builder method to set the three learning rates.
    #[must_use]
    pub const fn with_learning_rates(mut self, like: f32, dislike: f32, more_like: f32) -> Self {
        self.alpha_like = like;
        self.beta_dislike = dislike;
        self.gamma_more_like = more_like;
        self
    }

    /// Builder method to set the explore candidate multiplier.
    #[must_use]
    pub const fn with_explore_candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.explore_candidate_multiplier = multiplier;
        self
    }

    /// Builder method to set the vibe unseen ratio.
    #[must_use]
    pub const fn with_vibe_unseen_ratio(mut self, ratio: f32) -> Self {
        self.vibe_unseen_ratio = ratio;
        self
    }

    /// Builder method to set the diversity penalty rate.
    #[must_use]
    pub const fn with_diversity_artist_penalty(mut self, penalty: f32) -> Self {
        self.diversity_artist_penalty = penalty;
        self
    }

    /// Builder method to set the maximum feed size.
    #[must_use]
    pub const fn with_max_feed_size(mut self, size: usize) -> Self {
        self.max_feed_size = size;
        self
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidInput(format!("recommender config: {message}"))
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < f32::EPSILON
    }

    #[test]
    fn test_defaults() {
        let config = RecommenderConfig::default();
        assert_eq!(config.embedding_dim, 128);
        assert!(approx_eq(config.alpha_like, 0.3));
        assert!(approx_eq(config.beta_dislike, 0.5));
        assert!(approx_eq(config.gamma_more_like, 0.6));
        assert!(approx_eq(config.vibe_unseen_ratio, 0.4));
        assert!(approx_eq(config.diversity_artist_penalty, 0.3));
        assert_eq!(config.default_feed_size, 10);
        assert_eq!(config.max_feed_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_file_overrides_only_present_fields() {
        let mut config = RecommenderConfig::default();
        let file = ConfigFileRecommender {
            embedding_dim: Some(9),
            vibe_unseen_ratio: Some(0.5),
            ..Default::default()
        };
        config.apply_file(&file);
        assert_eq!(config.embedding_dim, 9);
        assert!(approx_eq(config.vibe_unseen_ratio, 0.5));
        assert!(approx_eq(config.alpha_like, 0.3));
    }

    #[test_case(RecommenderConfig::default().with_embedding_dim(0) ; "zero dimension")]
    #[test_case(RecommenderConfig::default().with_learning_rates(0.0, 0.5, 0.6) ; "zero like rate")]
    #[test_case(RecommenderConfig::default().with_learning_rates(0.3, -0.5, 0.6) ; "negative dislike rate")]
    #[test_case(RecommenderConfig::default().with_learning_rates(0.3, 0.5, f32::NAN) ; "nan more like rate")]
    #[test_case(RecommenderConfig::default().with_explore_candidate_multiplier(0) ; "zero multiplier")]
    #[test_case(RecommenderConfig::default().with_vibe_unseen_ratio(1.5) ; "ratio above one")]
    #[test_case(RecommenderConfig::default().with_vibe_unseen_ratio(-0.1) ; "negative ratio")]
    #[test_case(RecommenderConfig::default().with_diversity_artist_penalty(-0.3) ; "negative penalty")]
    #[test_case(RecommenderConfig::default().with_max_feed_size(5) ; "default above max")]
    fn test_validate_rejects(config: RecommenderConfig) {
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_accepts_boundary_ratios() {
        assert!(RecommenderConfig::default().with_vibe_unseen_ratio(0.0).validate().is_ok());
        assert!(RecommenderConfig::default().with_vibe_unseen_ratio(1.0).validate().is_ok());
        assert!(
            RecommenderConfig::default()
                .with_diversity_artist_penalty(0.0)
                .validate()
                .is_ok()
        );
    }
}
