//! Query configuration via `snb.toml`
//!
//! Holds the default result limit of each query. A missing file section or
//! key falls back to the benchmark's standard limits; a zero or negative
//! limit is rejected when the file is parsed.

use serde::{Deserialize, Serialize};
use snb_core::{Error, Limit, QueryKind, Result};
use std::path::Path;
use tracing::debug;

/// Config file name placed next to the dataset.
pub const CONFIG_FILE_NAME: &str = "snb.toml";

/// Standard limit for every query except friend recommendation.
pub const STANDARD_LIMIT: usize = 20;

/// Standard limit for friend recommendation.
pub const FRIEND_RECOMMENDATION_LIMIT: usize = 10;

fn standard_limit() -> Limit {
    // Both constants are non-zero.
    Limit::new(STANDARD_LIMIT).unwrap_or(Limit::MIN)
}

fn friend_recommendation_limit() -> Limit {
    Limit::new(FRIEND_RECOMMENDATION_LIMIT).unwrap_or(Limit::MIN)
}

/// Default limits loaded from `snb.toml`.
///
/// # Example
///
/// ```toml
/// [limits]
/// closeness = 20
/// friend_recommendation = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default `k` per query.
    #[serde(default)]
    pub limits: QueryLimits,
}

/// One default limit per query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Closest friends by first name
    #[serde(default = "standard_limit")]
    pub closeness: Limit,
    /// Friends posting in two countries
    #[serde(default = "standard_limit")]
    pub country_pair: Limit,
    /// Forums by post count
    #[serde(default = "standard_limit")]
    pub forum_posts: Limit,
    /// Friend recommendations by shared interests
    #[serde(default = "friend_recommendation_limit")]
    pub friend_recommendation: Limit,
    /// Friends by replies within a tag class
    #[serde(default = "standard_limit")]
    pub expert_search: Limit,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            closeness: standard_limit(),
            country_pair: standard_limit(),
            forum_posts: standard_limit(),
            friend_recommendation: friend_recommendation_limit(),
            expert_search: standard_limit(),
        }
    }
}

impl QueryConfig {
    /// Default limit for `query`.
    pub fn limit(&self, query: QueryKind) -> Limit {
        match query {
            QueryKind::Closeness => self.limits.closeness,
            QueryKind::CountryPair => self.limits.country_pair,
            QueryKind::ForumPosts => self.limits.forum_posts,
            QueryKind::FriendRecommendation => self.limits.friend_recommendation,
            QueryKind::ExpertSearch => self.limits.expert_search,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Top-k query configuration
#
# Default number of results per query. Every value must be at least 1.
[limits]
closeness = 20
country_pair = 20
forum_posts = 20
friend_recommendation = 10
expert_search = 20
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML or a limit is
    /// out of range.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: QueryConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(target: "snb::config", path = %path.display(), limits = ?config.limits, "Config loaded");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snb_core::ErrorCategory;
    use tempfile::TempDir;

    #[test]
    fn default_config_uses_standard_limits() {
        let config = QueryConfig::default();
        assert_eq!(config.limit(QueryKind::Closeness).get(), 20);
        assert_eq!(config.limit(QueryKind::CountryPair).get(), 20);
        assert_eq!(config.limit(QueryKind::ForumPosts).get(), 20);
        assert_eq!(config.limit(QueryKind::FriendRecommendation).get(), 10);
        assert_eq!(config.limit(QueryKind::ExpertSearch).get(), 20);
    }

    #[test]
    fn default_toml_parses_to_default() {
        let config = QueryConfig::from_toml(QueryConfig::default_toml()).unwrap();
        assert_eq!(config, QueryConfig::default());
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config = QueryConfig::from_toml("[limits]\nexpert_search = 3\n").unwrap();
        assert_eq!(config.limit(QueryKind::ExpertSearch).get(), 3);
        assert_eq!(config.limit(QueryKind::FriendRecommendation).get(), 10);

        let empty = QueryConfig::from_toml("").unwrap();
        assert_eq!(empty, QueryConfig::default());
    }

    #[test]
    fn zero_limit_is_config_error() {
        let err = QueryConfig::from_toml("[limits]\ncloseness = 0\n").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn negative_limit_is_config_error() {
        assert!(QueryConfig::from_toml("[limits]\nforum_posts = -4\n").is_err());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        QueryConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = QueryConfig::from_file(&path).unwrap();
        assert_eq!(config, QueryConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "[limits]\ncloseness = 5\n").unwrap();
        QueryConfig::write_default_if_missing(&path).unwrap();

        let config = QueryConfig::from_file(&path).unwrap();
        assert_eq!(config.limit(QueryKind::Closeness).get(), 5);
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = QueryConfig::default();
        config.limits.country_pair = Limit::new(7).unwrap();
        config.write_to_file(&path).unwrap();

        let loaded = QueryConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = QueryConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
