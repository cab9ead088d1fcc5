//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `USER_LOOKUP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `USER_LOOKUP_HOST` - Bind address (default: 127.0.0.1)
//! - `USER_LOOKUP_PORT` - Listen port (default: 8080)
//! - `USER_LOOKUP_DB_MAX_CONNECTIONS` - Connection pool size (default: 10)
//! - `USER_LOOKUP_LOG_FOUND_USERS` - Log every found user record (default: true)
//! - `USER_LOOKUP_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DATABASE_URL_VAR: &str = "USER_LOOKUP_DATABASE_URL";
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines (local development).
    #[default]
    Text,
    /// One JSON object per event (log shippers).
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Behaviour switches for the user lookup endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupSettings {
    /// Emit one diagnostic log line with the full record whenever a lookup
    /// finds a user. The response is identical either way.
    pub log_found_users: bool,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            log_found_users: true,
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Maximum number of pooled database connections
    pub db_max_connections: u32,
    /// Log output format
    pub log_format: LogFormat,
    /// Lookup endpoint settings
    pub lookup: LookupSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get(DATABASE_URL_VAR)
            .or_else(|| get(FALLBACK_DATABASE_URL_VAR))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_string()))?;

        let host = parse_or_default(&get, "USER_LOOKUP_HOST", "127.0.0.1")?;
        let port = parse_or_default(&get, "USER_LOOKUP_PORT", "8080")?;
        let db_max_connections: u32 =
            parse_or_default(&get, "USER_LOOKUP_DB_MAX_CONNECTIONS", "10")?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "USER_LOOKUP_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let log_format = parse_or_default(&get, "USER_LOOKUP_LOG_FORMAT", "text")?;

        let log_found_users = match get("USER_LOOKUP_LOG_FOUND_USERS") {
            Some(value) => parse_bool("USER_LOOKUP_LOG_FOUND_USERS", &value)?,
            None => LookupSettings::default().log_found_users,
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            log_format,
            lookup: LookupSettings { log_found_users },
            sentry_dsn: get("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable from the source, falling back to `default` when unset.
fn parse_or_default<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag, accepting the usual spellings.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::from_source(source(&[(DATABASE_URL_VAR, "postgres://localhost/users")]))
                .unwrap();

        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.lookup.log_found_users);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let result = ServerConfig::from_source(source(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == DATABASE_URL_VAR));
    }

    #[test]
    fn test_database_url_fallback() {
        let config =
            ServerConfig::from_source(source(&[(FALLBACK_DATABASE_URL_VAR, "postgres://fly/db")]))
                .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/db");
    }

    #[test]
    fn test_primary_database_url_wins() {
        let config = ServerConfig::from_source(source(&[
            (DATABASE_URL_VAR, "postgres://primary/db"),
            (FALLBACK_DATABASE_URL_VAR, "postgres://fallback/db"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_source(source(&[
            (DATABASE_URL_VAR, "postgres://localhost/users"),
            ("USER_LOOKUP_HOST", "0.0.0.0"),
            ("USER_LOOKUP_PORT", "9000"),
            ("USER_LOOKUP_DB_MAX_CONNECTIONS", "4"),
            ("USER_LOOKUP_LOG_FORMAT", "JSON"),
            ("USER_LOOKUP_LOG_FOUND_USERS", "off"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.lookup.log_found_users);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_invalid_port() {
        let result = ServerConfig::from_source(source(&[
            (DATABASE_URL_VAR, "postgres://localhost/users"),
            ("USER_LOOKUP_PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "USER_LOOKUP_PORT"));
    }

    #[test]
    fn test_zero_max_connections_is_rejected() {
        let result = ServerConfig::from_source(source(&[
            (DATABASE_URL_VAR, "postgres://localhost/users"),
            ("USER_LOOKUP_DB_MAX_CONNECTIONS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(key, reason))
                if key == "USER_LOOKUP_DB_MAX_CONNECTIONS" && reason == "must be at least 1"
        ));
    }

    #[test]
    fn test_empty_sentry_dsn_is_disabled() {
        let config = ServerConfig::from_source(source(&[
            (DATABASE_URL_VAR, "postgres://localhost/users"),
            ("SENTRY_DSN", ""),
        ]))
        .unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_parse_bool() {
        for value in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_bool("K", value).unwrap());
        }
        for value in ["0", "false", "No", "off"] {
            assert!(!parse_bool("K", value).unwrap());
        }
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!(" json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = ServerConfig::from_source(source(&[(
            DATABASE_URL_VAR,
            "postgres://app:hunter2@db/users",
        )]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
