//! Hub connection configuration.

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::error::HubError;
use crate::websocket::ReconnectConfig;

/// Configuration for the hub adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the hub API, e.g. `http://supervisor/core`.
    pub base_url: String,
    /// Long-lived bearer token.
    pub token: SecretString,
    /// Timeout applied to every REST request, in seconds.
    pub request_timeout_secs: u64,
    /// Delay before the first WebSocket reconnection attempt, in milliseconds.
    pub reconnect_initial_delay_ms: u64,
    /// Upper bound on the reconnection backoff, in milliseconds.
    pub reconnect_max_delay_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: "http://supervisor/core".to_string(),
            token: SecretString::from(String::new()),
            request_timeout_secs: 10,
            reconnect_initial_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

impl HubConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect_initial_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
        }
    }

    /// Absolute URL of a REST endpoint below the base, e.g. `api/states`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The `ws(s)://…/api/websocket` URL derived from the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidUrl`] if the base URL does not parse or
    /// is not http(s).
    pub fn websocket_url(&self) -> Result<Url, HubError> {
        let mut url = Url::parse(&self.base_url)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(HubError::UnsupportedScheme(other.to_string()));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| HubError::UnsupportedScheme(scheme.to_string()))?;
        let path = format!("{}/api/websocket", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(url)
    }
}
