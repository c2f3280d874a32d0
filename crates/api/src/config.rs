//! Application configuration loaded from environment variables.

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Server and database configuration.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: read-write connection URL (required)
/// - `DATABASE_READ_ONLY_URL`: read-only replica URL (optional)
/// - `DATABASE_MAX_CONNECTIONS`: pool size per URL (default: `10`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub read_write_url: String,
    /// Replica URL. When absent every query runs on the read-write pool.
    pub read_only_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Creates a configuration with defaults for everything but the database URL.
    pub fn new(read_write_url: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            read_write_url: read_write_url.into(),
            read_only_url: None,
            max_connections: 10,
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read_write_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let mut config = Self::new(read_write_url);
        config.read_only_url =
            lookup("DATABASE_READ_ONLY_URL").filter(|url| !url.trim().is_empty());

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse("PORT", port)?;
        }
        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = level;
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = parse("DATABASE_MAX_CONNECTIONS", max)?;
        }

        Ok(config)
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<N: std::str::FromStr>(var: &'static str, value: String) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::new("postgres://localhost/app");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.read_only_url, None);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::new("postgres://localhost/app")
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_database_url_required() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://primary/app"),
            ("DATABASE_READ_ONLY_URL", "postgres://replica/app"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.read_write_url, "postgres://primary/app");
        assert_eq!(config.read_only_url.as_deref(), Some("postgres://replica/app"));
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_blank_replica_means_single_store() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://primary/app"),
            ("DATABASE_READ_ONLY_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(config.read_only_url, None);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://primary/app"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }
}
