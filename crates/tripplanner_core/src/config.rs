//! Process configuration.
//!
//! # Responsibility
//! - Resolve store location, logging and job intervals from the environment.
//!
//! # Invariants
//! - Every setting has a default; an unset variable is never an error.
//! - A set but malformed variable is rejected instead of silently defaulted.
//! - Job intervals are strictly positive.
//! - The log directory is absolute.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB: &str = "TRIPPLANNER_DB";
pub const ENV_LOG_LEVEL: &str = "TRIPPLANNER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TRIPPLANNER_LOG_DIR";
pub const ENV_ARCHIVE_INTERVAL: &str = "TRIPPLANNER_ARCHIVE_INTERVAL_SECS";
pub const ENV_SYNC_INTERVAL: &str = "TRIPPLANNER_SYNC_INTERVAL_SECS";

const DEFAULT_DB_FILE: &str = "tripplanner.db";
const DEFAULT_LOG_DIR_NAME: &str = "tripplanner-logs";
const DEFAULT_JOB_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidInterval { var: &'static str, value: String },
    Empty { var: &'static str },
    RelativePath { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInterval { var, value } => write!(
                f,
                "{var} must be a positive number of seconds, got `{value}`"
            ),
            Self::Empty { var } => write!(f, "{var} cannot be empty"),
            Self::RelativePath { var, value } => {
                write!(f, "{var} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub archive_interval: Duration,
    pub sync_interval: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
            archive_interval: DEFAULT_JOB_INTERVAL,
            sync_interval: DEFAULT_JOB_INTERVAL,
        }
    }
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolves settings through `lookup`, which returns `None` for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB) {
            config.database_path = PathBuf::from(non_empty(ENV_DB, &path)?);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = non_empty(ENV_LOG_LEVEL, &level)?.to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            let dir = non_empty(ENV_LOG_DIR, &dir)?;
            if !Path::new(dir).is_absolute() {
                return Err(ConfigError::RelativePath {
                    var: ENV_LOG_DIR,
                    value: dir.to_string(),
                });
            }
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(ENV_ARCHIVE_INTERVAL) {
            config.archive_interval = parse_interval(ENV_ARCHIVE_INTERVAL, &secs)?;
        }
        if let Some(secs) = lookup(ENV_SYNC_INTERVAL) {
            config.sync_interval = parse_interval(ENV_SYNC_INTERVAL, &secs)?;
        }

        Ok(config)
    }
}

fn non_empty<'a>(var: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    Ok(trimmed)
}

fn parse_interval(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidInterval {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_ARCHIVE_INTERVAL, ENV_DB, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn unset_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.archive_interval, Duration::from_secs(43_200));
        assert!(config.log_dir.is_absolute());
    }

    #[test]
    fn overrides_are_applied() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB, "/data/trips.db"),
            (ENV_LOG_DIR, " /var/log/trips "),
            (ENV_ARCHIVE_INTERVAL, "60"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/trips.db"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/trips"));
        assert_eq!(config.archive_interval, Duration::from_secs(60));
    }

    #[test]
    fn zero_or_malformed_interval_is_rejected() {
        for raw in ["0", "-5", "soon"] {
            let err = CoreConfig::from_lookup(lookup_from(&[(ENV_ARCHIVE_INTERVAL, raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidInterval { .. }));
        }
    }

    #[test]
    fn blank_path_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_DB, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty { var: ENV_DB });
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::RelativePath {
                var: ENV_LOG_DIR,
                value: "logs".to_string(),
            }
        );
        assert!(err.to_string().contains("absolute"));
    }
}
