//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Collect the log level, log directory and fixture path for the binary.
//! - Validate values before anything is started with them.
//!
//! # Invariants
//! - Blank variables behave like unset ones.
//! - Parsing never reads the process environment except in `from_env`.

use crate::logging::{default_log_level, normalize_level, LogSink, LoggingConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "TRIPBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TRIPBOARD_LOG_DIR";
pub const ENV_FIXTURE: &str = "TRIPBOARD_FIXTURE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => write!(
                f,
                "{ENV_LOG_LEVEL}: unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "{ENV_LOG_DIR}: must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub log_level: &'static str,
    /// Rolling log files go here; stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// JSON fixture served by the transport; demo data when unset.
    pub fixture: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            fixture: None,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).map_err(|_| ConfigError::InvalidLogLevel(raw))?,
            None => default_log_level(),
        };
        let log_dir = match read(ENV_LOG_DIR) {
            Some(raw) if Path::new(&raw).is_absolute() => Some(PathBuf::from(raw)),
            Some(raw) => return Err(ConfigError::RelativeLogDir(raw)),
            None => None,
        };
        let fixture = read(ENV_FIXTURE).map(PathBuf::from);

        Ok(Self {
            log_level,
            log_dir,
            fixture,
        })
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level,
            sink: match &self.log_dir {
                Some(dir) => LogSink::File(dir.clone()),
                None => LogSink::Stderr,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_FIXTURE, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::{default_log_level, LogSink};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.logging().sink, LogSink::Stderr);
    }

    #[test]
    fn reads_and_normalizes_values() {
        let log_dir = std::env::temp_dir().join("tripboard-logs");
        let log_dir_str = log_dir.to_str().expect("utf-8 temp dir");
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, " WARNING "),
            (ENV_LOG_DIR, log_dir_str),
            (ENV_FIXTURE, "fixtures/trip.json"),
        ]))
        .expect("valid config");

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.logging().sink, LogSink::File(log_dir));
        assert_eq!(config.fixture, Some(PathBuf::from("fixtures/trip.json")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "   "), (ENV_FIXTURE, "")])).unwrap();
        assert_eq!(config.log_dir, None);
        assert_eq!(config.fixture, None);
    }

    #[test]
    fn rejects_bad_level_and_relative_dir() {
        assert_eq!(
            CoreConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "verbose")])),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
        assert_eq!(
            CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs/dev")])),
            Err(ConfigError::RelativeLogDir("logs/dev".to_string()))
        );
    }
}
