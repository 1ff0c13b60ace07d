use std::path::PathBuf;
use std::time::Duration;

use crate::core::quake::fetcher::{build_client, FetchError, CONNECT_TIMEOUT, READ_TIMEOUT};
use crate::core::quake::query::{FeedQuery, OrderBy};
use crate::core::quake::source::FeedSource;

pub const ENV_FILE: &str = ".env.local";
pub const FEED_URL_ENV: &str = "QUAKE_FEED_URL";
pub const FIXTURE_ENV: &str = "QUAKE_FIXTURE";
pub const LOG_ENV: &str = "QUAKE_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// The USGS service refuses larger pages.
const MAX_QUERY_LIMIT: u32 = 20_000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid feed url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("query limit must be between 1 and 20000, got {0}")]
    LimitOutOfRange(u32),
    #[error("minimum magnitude must not be negative, got {0}")]
    NegativeMagnitude(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Network(String),
    Fixture(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub log_filter: String,
    pub utc: bool,
}

/// Values given on the command line. Unset fields defer to the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub fixture: Option<PathBuf>,
    pub min_magnitude: Option<f64>,
    pub limit: Option<u32>,
    pub order_by: Option<OrderBy>,
    pub log_level: Option<String>,
    pub utc: bool,
}

impl CliOverrides {
    fn has_query(&self) -> bool {
        self.min_magnitude.is_some() || self.limit.is_some() || self.order_by.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::Network(FeedQuery::default().to_url()),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            utc: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then `.env.local` and the process environment, then `overrides`.
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let _ = dotenvy::from_filename(ENV_FILE);
        let config = Self::from_lookup(|key| std::env::var(key).ok()).apply_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(fixture) = read(FIXTURE_ENV) {
            config.source = SourceConfig::Fixture(PathBuf::from(fixture));
        } else if let Some(url) = read(FEED_URL_ENV) {
            config.source = SourceConfig::Network(url.trim().to_string());
        }
        if let Some(filter) = read(LOG_ENV) {
            config.log_filter = filter;
        }
        config
    }

    pub fn apply_overrides(mut self, overrides: CliOverrides) -> Result<Self, ConfigError> {
        if let Some(fixture) = overrides.fixture {
            self.source = SourceConfig::Fixture(fixture);
        } else if let Some(url) = overrides.url {
            self.source = SourceConfig::Network(url);
        } else if overrides.has_query() {
            let defaults = FeedQuery::default();
            let query = FeedQuery {
                order_by: overrides.order_by.unwrap_or(defaults.order_by),
                min_magnitude: overrides.min_magnitude.unwrap_or(defaults.min_magnitude),
                limit: overrides.limit.unwrap_or(defaults.limit),
            };
            validate_query(&query)?;
            self.source = SourceConfig::Network(query.to_url());
        }
        if let Some(level) = overrides.log_level {
            self.log_filter = level;
        }
        self.utc |= overrides.utc;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let SourceConfig::Network(url) = &self.source {
            reqwest::Url::parse(url).map_err(|error| ConfigError::InvalidUrl {
                url: url.clone(),
                reason: error.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn feed_source(&self) -> Result<FeedSource, FetchError> {
        match &self.source {
            SourceConfig::Network(url) => Ok(FeedSource::Network {
                client: build_client(self.connect_timeout, self.read_timeout)?,
                url: url.clone(),
            }),
            SourceConfig::Fixture(path) => Ok(FeedSource::FixtureFile(path.clone())),
        }
    }
}

fn validate_query(query: &FeedQuery) -> Result<(), ConfigError> {
    if query.limit == 0 || query.limit > MAX_QUERY_LIMIT {
        return Err(ConfigError::LimitOutOfRange(query.limit));
    }
    if query.min_magnitude < 0.0 {
        return Err(ConfigError::NegativeMagnitude(query.min_magnitude));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_usgs_query() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(
            config.source,
            SourceConfig::Network(
                "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&orderby=time&minmag=5&limit=10"
                    .to_string()
            )
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (FEED_URL_ENV, "http://localhost:9000/feed"),
            (LOG_ENV, "debug"),
        ]));
        assert_eq!(
            config.source,
            SourceConfig::Network("http://localhost:9000/feed".to_string())
        );
        assert_eq!(config.log_filter, "debug");

        let config = AppConfig::from_lookup(lookup(&[
            (FEED_URL_ENV, "http://localhost:9000/feed"),
            (FIXTURE_ENV, "fixtures/usgs-samples/sample.geojson"),
        ]));
        assert_eq!(
            config.source,
            SourceConfig::Fixture(PathBuf::from("fixtures/usgs-samples/sample.geojson"))
        );
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[(FEED_URL_ENV, "  "), (LOG_ENV, "")]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn cli_overrides_environment() {
        let base = AppConfig::from_lookup(lookup(&[
            (FIXTURE_ENV, "from-env.geojson"),
            (LOG_ENV, "debug"),
        ]));
        let config = base
            .apply_overrides(CliOverrides {
                min_magnitude: Some(6.0),
                limit: Some(20),
                log_level: Some("trace".to_string()),
                utc: true,
                ..CliOverrides::default()
            })
            .expect("overrides should apply");

        assert_eq!(
            config.source,
            SourceConfig::Network(
                "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&orderby=time&minmag=6&limit=20"
                    .to_string()
            )
        );
        assert_eq!(config.log_filter, "trace");
        assert!(config.utc);
    }

    #[test]
    fn cli_fixture_wins_over_cli_url() {
        let config = AppConfig::default()
            .apply_overrides(CliOverrides {
                url: Some("http://example.com/feed".to_string()),
                fixture: Some(PathBuf::from("local.geojson")),
                ..CliOverrides::default()
            })
            .expect("overrides should apply");
        assert_eq!(config.source, SourceConfig::Fixture(PathBuf::from("local.geojson")));
    }

    #[test]
    fn rejects_bad_query_values() {
        let zero = AppConfig::default().apply_overrides(CliOverrides {
            limit: Some(0),
            ..CliOverrides::default()
        });
        assert_eq!(zero, Err(ConfigError::LimitOutOfRange(0)));

        let negative = AppConfig::default().apply_overrides(CliOverrides {
            min_magnitude: Some(-1.0),
            ..CliOverrides::default()
        });
        assert_eq!(negative, Err(ConfigError::NegativeMagnitude(-1.0)));
    }

    #[test]
    fn rejects_unparsable_url() {
        let config = AppConfig::default()
            .apply_overrides(CliOverrides {
                url: Some("earthquakes please".to_string()),
                ..CliOverrides::default()
            })
            .expect("url overrides are checked by validate");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn fixture_config_builds_fixture_source() {
        let config = AppConfig {
            source: SourceConfig::Fixture(PathBuf::from("quakes.geojson")),
            ..AppConfig::default()
        };
        let source = config.feed_source().expect("source should build");
        assert!(matches!(
            source,
            FeedSource::FixtureFile(path) if path == PathBuf::from("quakes.geojson")
        ));
    }
}
