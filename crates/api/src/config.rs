//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use application::ApplicationSettings;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `STORAGE_PATH`: JSON file backing the repositories; in-memory when unset
/// - `SEED_DEMO_DATA`: load the demo users and products (default: `true`)
/// - `LOW_STOCK_THRESHOLD`: stock level that triggers alerts (default: `5`)
/// - `RESERVATION_TTL_MINUTES`: reservation lifetime (default: `15`)
/// - `ADMIN_EMAIL`: recipient of administrative notices
/// - `INSTITUTIONAL_DOMAIN`: email domain of institutional users
///
/// Unset or unparsable values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage_path: Option<PathBuf>,
    pub seed_demo_data: bool,
    pub low_stock_threshold: u32,
    pub reservation_ttl_minutes: u64,
    pub admin_email: String,
    pub institutional_domain: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            storage_path: lookup("STORAGE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            seed_demo_data: parsed(&lookup, "SEED_DEMO_DATA").unwrap_or(defaults.seed_demo_data),
            low_stock_threshold: parsed(&lookup, "LOW_STOCK_THRESHOLD")
                .unwrap_or(defaults.low_stock_threshold),
            reservation_ttl_minutes: parsed(&lookup, "RESERVATION_TTL_MINUTES")
                .unwrap_or(defaults.reservation_ttl_minutes),
            admin_email: lookup("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            institutional_domain: lookup("INSTITUTIONAL_DOMAIN")
                .unwrap_or(defaults.institutional_domain),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Business settings handed to the use cases and handlers.
    pub fn settings(&self) -> ApplicationSettings {
        ApplicationSettings {
            low_stock_threshold: self.low_stock_threshold,
            reservation_ttl: Duration::from_secs(self.reservation_ttl_minutes * 60),
            admin_recipient: self.admin_email.clone(),
            institutional_domain: self.institutional_domain.clone(),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let settings = ApplicationSettings::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage_path: None,
            seed_demo_data: true,
            low_stock_threshold: settings.low_stock_threshold,
            reservation_ttl_minutes: settings.reservation_ttl.as_secs() / 60,
            admin_email: settings.admin_recipient,
            institutional_domain: settings.institutional_domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.storage_path.is_none());
        assert!(config.seed_demo_data);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.reservation_ttl_minutes, 15);
        assert_eq!(config.admin_email, "admin@mef.gob.pe");
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("LOG_FORMAT", "JSON"),
            ("STORAGE_PATH", "/tmp/catalog.json"),
            ("SEED_DEMO_DATA", "false"),
            ("LOW_STOCK_THRESHOLD", "2"),
            ("RESERVATION_TTL_MINUTES", "30"),
            ("ADMIN_EMAIL", "ops@example.com"),
        ]));

        assert_eq!(config.port, 8081);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/catalog.json")));
        assert!(!config.seed_demo_data);

        let settings = config.settings();
        assert_eq!(settings.low_stock_threshold, 2);
        assert_eq!(settings.reservation_ttl, Duration::from_secs(30 * 60));
        assert_eq!(settings.admin_recipient, "ops@example.com");
        assert_eq!(settings.institutional_domain, "mef.gob.pe");
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("SEED_DEMO_DATA", "maybe"),
            ("STORAGE_PATH", "  "),
        ]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.seed_demo_data);
        assert!(config.storage_path.is_none());
    }
}
