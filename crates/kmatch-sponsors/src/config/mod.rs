use crate::register::DEFAULT_REGISTER_URL;
use crate::sponsors::{KeyRules, RulesError};
use crate::telemetry::Verbosity;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the maintenance tools.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: PathConfig,
    pub source: SourceConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(env_or("KMATCH_DATA_DIR", "data"));
        let registry_path = PathBuf::from(env_or("KMATCH_REGISTRY_PATH", "sponsors.json"));
        let rules_path = env::var("KMATCH_RULES_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let register_url = env_or("KMATCH_REGISTER_URL", DEFAULT_REGISTER_URL);
        let name_column = env_or("KMATCH_NAME_COLUMN", "Organisation");
        if name_column.trim().is_empty() {
            return Err(ConfigError::EmptyNameColumn);
        }
        let timeout_secs = env_or("KMATCH_HTTP_TIMEOUT_SECS", "30")
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let log_level = env_or("KMATCH_LOG_LEVEL", "info");

        Ok(Self {
            paths: PathConfig {
                data_dir,
                registry_path,
                rules_path,
            },
            source: SourceConfig {
                register_url,
                name_column,
                http_timeout: Duration::from_secs(timeout_secs),
            },
            telemetry: TelemetryConfig {
                log_level,
                verbosity: Verbosity::default(),
            },
        })
    }

    /// Rule table from `KMATCH_RULES_PATH`, or the built-in table.
    pub fn key_rules(&self) -> Result<KeyRules, RulesError> {
        match &self.paths.rules_path {
            Some(path) => KeyRules::from_path(path),
            None => Ok(KeyRules::default()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Where snapshots and the registry document live.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub data_dir: PathBuf,
    pub registry_path: PathBuf,
    pub rules_path: Option<PathBuf>,
}

/// Register endpoint and table layout.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub register_url: String,
    pub name_column: String,
    pub http_timeout: Duration,
}

/// Log filter inputs. `verbosity` is set from the command line, never from
/// the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub verbosity: Verbosity,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTimeout,
    EmptyNameColumn,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTimeout => {
                write!(f, "KMATCH_HTTP_TIMEOUT_SECS must be a positive whole number")
            }
            ConfigError::EmptyNameColumn => write!(f, "KMATCH_NAME_COLUMN must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
