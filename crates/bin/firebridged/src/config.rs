//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `firebridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use firebridge_adapter_firestore::StoreConfig;
use firebridge_adapter_hub::HubConfig;
use firebridge_app::engine::DEFAULT_SETTLE_DELAY;
use firebridge_domain::id::{DocumentKey, EntityId};
use firebridge_domain::identity::{DeviceRef, IdentityMapper};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Hub connection.
    pub hub: HubConfig,
    /// Document store connection.
    pub store: StoreConfig,
    /// Engine tuning and identity aliases.
    pub sync: SyncConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Allowed CORS origin, `*` for any.
    pub cors_origin: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Sync engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Wait between a hub command and the verifying query, in milliseconds.
    pub settle_delay_ms: u64,
    /// Fixed document key → entity id mapping.
    pub aliases: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from `firebridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("firebridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("FIREBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("FIREBRIDGE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("FIREBRIDGE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("FIREBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("SUPERVISOR_TOKEN") {
            self.hub.token = SecretString::from(val);
        }
        if let Some(val) = var("FIREBRIDGE_HUB_URL") {
            self.hub.base_url = val;
        }
        if let Some(val) = var("FIREBASE_PROJECT_ID") {
            self.store.project_id = val;
        }
        if let Some(val) = var("FIREBRIDGE_STORE_TOKEN") {
            self.store.access_token = SecretString::from(val);
        }
        if let Some(val) = var("FIREBRIDGE_SETTLE_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                self.sync.settle_delay_ms = ms;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if let Err(err) = url::Url::parse(&self.hub.base_url) {
            return Err(ConfigError::Validation(format!(
                "hub base_url {:?} is not a valid URL: {err}",
                self.hub.base_url
            )));
        }
        self.identity_mapper()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the identity mapper from the configured aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if an alias names an entity that
    /// is malformed or outside the synchronized domains.
    pub fn identity_mapper(&self) -> Result<IdentityMapper, ConfigError> {
        self.sync
            .aliases
            .iter()
            .try_fold(IdentityMapper::new(), |mapper, (key, entity_id)| {
                let device = EntityId::parse(entity_id.as_str())
                    .and_then(DeviceRef::from_entity_id)
                    .map_err(|err| {
                        ConfigError::Validation(format!("alias {key:?} -> {entity_id:?}: {err}"))
                    })?;
                Ok(mapper.with_alias(DocumentKey::new(key.as_str()), device))
            })
    }
}

impl SyncConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: "*".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "firebridged=info,firebridge=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: u64::try_from(DEFAULT_SETTLE_DELAY.as_millis()).unwrap_or(500),
            aliases: BTreeMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origin, "*");
        assert_eq!(config.hub.base_url, "http://supervisor/core");
        assert_eq!(config.store.collection, "device");
        assert_eq!(config.sync.settle_delay(), Duration::from_millis(500));
        assert!(config.sync.aliases.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.store.is_active());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090
            cors_origin = 'http://dashboard.local'

            [logging]
            filter = 'debug'

            [hub]
            base_url = 'http://homeassistant.local:8123'
            token = 'hub-token'

            [store]
            project_id = 'home-1234'
            collection = 'devices'
            poll_interval_ms = 250

            [sync]
            settle_delay_ms = 750

            [sync.aliases]
            desk-lamp = 'light.office_desk'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.server.cors_origin, "http://dashboard.local");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.hub.base_url, "http://homeassistant.local:8123");
        assert_eq!(config.hub.token.expose_secret(), "hub-token");
        assert!(config.store.is_active());
        assert_eq!(config.store.collection, "devices");
        assert_eq!(config.store.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.sync.settle_delay(), Duration::from_millis(750));
        assert_eq!(config.identity_mapper().unwrap().alias_count(), 1);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_apply_overrides_over_file_values() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("FIREBRIDGE_BIND", "127.0.0.1:8099"),
            ("SUPERVISOR_TOKEN", "supervisor-secret"),
            ("FIREBRIDGE_HUB_URL", "http://hub.local:8123"),
            ("FIREBASE_PROJECT_ID", "home-1234"),
            ("FIREBRIDGE_STORE_TOKEN", "ya29.token"),
            ("FIREBRIDGE_SETTLE_DELAY_MS", "1000"),
        ]));

        assert_eq!(config.bind_addr(), "127.0.0.1:8099");
        assert_eq!(config.hub.token.expose_secret(), "supervisor-secret");
        assert_eq!(config.hub.base_url, "http://hub.local:8123");
        assert_eq!(config.store.project_id, "home-1234");
        assert_eq!(config.store.access_token.expose_secret(), "ya29.token");
        assert_eq!(config.sync.settle_delay(), Duration::from_secs(1));
    }

    #[test]
    fn should_prefer_rust_log_over_firebridge_log() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("FIREBRIDGE_LOG", "info"),
            ("RUST_LOG", "trace"),
        ]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("FIREBRIDGE_PORT", "http"),
            ("FIREBRIDGE_SETTLE_DELAY_MS", "soon"),
        ]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.sync.settle_delay_ms, 500);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_invalid_hub_url() {
        let mut config = Config::default();
        config.hub.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_alias_to_ineligible_entity() {
        let mut config = Config::default();
        config
            .sync
            .aliases
            .insert("thermostat".to_string(), "climate.hallway".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_malformed_alias() {
        let mut config = Config::default();
        config
            .sync
            .aliases
            .insert("lamp".to_string(), "lamp".to_string());
        assert!(config.identity_mapper().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
