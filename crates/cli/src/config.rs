//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKPOINT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `WHITELIST_CSV` - Whitelist file read by the whitelist `add` command
//!   (default: whitelist.csv)
//! - `CHECKPOINT_DB_MAX_CONNECTIONS` - Pool size (default: 2)
//! - `CHECKPOINT_DB_ACQUIRE_TIMEOUT_SECS` - Connection acquire timeout
//!   (default: 10)
//!
//! A `.env` file in the working directory is loaded first if present.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::db::PoolSettings;

const DEFAULT_WHITELIST_CSV: &str = "whitelist.csv";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Runtime configuration for `ckpt-cli`.
#[derive(Clone)]
pub struct CliConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// CSV imported by the whitelist `add` command
    pub whitelist_path: PathBuf,
    pub pool: PoolSettings,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("database_url", &"[REDACTED]")
            .field("whitelist_path", &self.whitelist_path)
            .field("pool", &self.pool)
            .finish()
    }
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`CliConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("CHECKPOINT_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("CHECKPOINT_DATABASE_URL".to_string()))?;

        let whitelist_path = lookup("WHITELIST_CSV")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WHITELIST_CSV.to_string())
            .into();

        let defaults = PoolSettings::default();
        let max_connections = parse_or(
            &lookup,
            "CHECKPOINT_DB_MAX_CONNECTIONS",
            defaults.max_connections,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKPOINT_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let acquire_timeout = parse_or(
            &lookup,
            "CHECKPOINT_DB_ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout.as_secs(),
        )?;

        Ok(Self {
            database_url,
            whitelist_path,
            pool: PoolSettings {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout),
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CHECKPOINT_DATABASE_URL", "postgres://localhost/ckpt")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://localhost/ckpt");
        assert_eq!(config.whitelist_path, PathBuf::from("whitelist.csv"));
        assert_eq!(config.pool, PoolSettings::default());
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CHECKPOINT_DATABASE_URL", "postgres://x/y"),
            ("WHITELIST_CSV", "/srv/import/list.csv"),
            ("CHECKPOINT_DB_MAX_CONNECTIONS", "4"),
            ("CHECKPOINT_DB_ACQUIRE_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.whitelist_path, PathBuf::from("/srv/import/list.csv"));
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_numbers() {
        for (key, value) in [
            ("CHECKPOINT_DB_MAX_CONNECTIONS", "lots"),
            ("CHECKPOINT_DB_MAX_CONNECTIONS", "0"),
            ("CHECKPOINT_DB_ACQUIRE_TIMEOUT_SECS", "-1"),
        ] {
            let err = load(&[("CHECKPOINT_DATABASE_URL", "postgres://x/y"), (key, value)])
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == key));
        }
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = load(&[("CHECKPOINT_DATABASE_URL", "postgres://user:hunter2@db/x")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
