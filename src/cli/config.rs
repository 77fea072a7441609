//! `config` command.

use std::fmt;

use crate::config::VibefeedConfig;

/// Output of `config --show`, rendered as TOML.
#[derive(Debug, Clone)]
pub struct ConfigReport<'a>(pub &'a VibefeedConfig);

impl fmt::Display for ConfigReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.0;
        let r = &config.recommender;
        writeln!(f, "data_dir = \"{}\"", config.data_dir.display())?;
        writeln!(f, "database_path = \"{}\"", config.database_path().display())?;
        writeln!(f)?;
        writeln!(f, "[recommender]")?;
        writeln!(f, "embedding_dim = {}", r.embedding_dim)?;
        writeln!(f, "alpha_like = {:?}", r.alpha_like)?;
        writeln!(f, "beta_dislike = {:?}", r.beta_dislike)?;
        writeln!(f, "gamma_more_like = {:?}", r.gamma_more_like)?;
        writeln!(f, "explore_candidate_multiplier = {}", r.explore_candidate_multiplier)?;
        writeln!(f, "vibe_unseen_ratio = {:?}", r.vibe_unseen_ratio)?;
        writeln!(f, "diversity_artist_penalty = {:?}", r.diversity_artist_penalty)?;
        writeln!(f, "default_feed_size = {}", r.default_feed_size)?;
        write!(f, "max_feed_size = {}", r.max_feed_size)?;

        let logging = &config.logging;
        if logging.level.is_some() || logging.format.is_some() || logging.file.is_some() {
            write!(f, "\n\n[logging]")?;
            for (key, value) in [
                ("level", &logging.level),
                ("format", &logging.format),
                ("file", &logging.file),
            ] {
                if let Some(value) = value {
                    write!(f, "\n{key} = \"{value}\"")?;
                }
            }
        }
        Ok(())
    }
}

/// Renders the resolved configuration.
#[must_use]
pub const fn show_config(config: &VibefeedConfig) -> ConfigReport<'_> {
    ConfigReport(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    #[test]
    fn test_show_config_is_valid_toml() {
        let config = VibefeedConfig::default().with_data_dir("/tmp/vf");
        let text = show_config(&config).to_string();
        assert!(text.contains("database_path = \"/tmp/vf/vibefeed.db\""));

        let parsed: ConfigFile = toml::from_str(&text).unwrap();
        let recommender = parsed.recommender.unwrap();
        assert_eq!(recommender.embedding_dim, Some(128));
        assert_eq!(recommender.max_feed_size, Some(50));
        assert!(parsed.logging.is_none());
    }

    #[test]
    fn test_show_config_includes_logging() {
        let mut config = VibefeedConfig::default();
        config.logging.format = Some("json".to_string());
        let text = show_config(&config).to_string();
        assert!(text.ends_with("[logging]\nformat = \"json\""));
    }
}
