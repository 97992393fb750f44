//! Document store configuration.

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use firebridge_domain::id::DocumentKey;

/// Configuration for the Firestore adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Set to `false` to run the bridge without the store side.
    pub enabled: bool,
    /// Firestore REST root.
    pub base_url: String,
    /// Firebase project id; the store is disabled while this is empty.
    pub project_id: String,
    /// Database id.
    pub database: String,
    /// Collection holding one document per device.
    pub collection: String,
    /// OAuth2 bearer token used for every request.
    pub access_token: SecretString,
    /// Change feed polling period, in milliseconds.
    pub poll_interval_ms: u64,
    /// Timeout applied to every request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            database: "(default)".to_string(),
            collection: "device".to_string(),
            access_token: SecretString::from(String::new()),
            poll_interval_ms: 1000,
            request_timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Whether the store side should run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.project_id.trim().is_empty()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `projects/{project}/databases/{database}/documents`
    #[must_use]
    pub fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    /// Full resource name of a device document.
    #[must_use]
    pub fn document_name(&self, key: &DocumentKey) -> String {
        format!("{}/{}/{key}", self.documents_path(), self.collection)
    }

    /// Endpoint for atomic writes.
    #[must_use]
    pub fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.root(), self.documents_path())
    }

    /// Endpoint listing the device collection.
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.root(),
            self.documents_path(),
            self.collection
        )
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> StoreConfig {
        StoreConfig {
            project_id: "home-1234".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn should_have_sensible_defaults() {
        let config = StoreConfig::default();
        assert!(config.enabled);
        assert_eq!(config.database, "(default)");
        assert_eq!(config.collection, "device");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn should_be_inactive_without_project_id() {
        assert!(!StoreConfig::default().is_active());
        assert!(configured().is_active());
        let disabled = StoreConfig {
            enabled: false,
            ..configured()
        };
        assert!(!disabled.is_active());
    }

    #[test]
    fn should_build_document_name() {
        let name = configured().document_name(&DocumentKey::new("living-room"));
        assert_eq!(
            name,
            "projects/home-1234/databases/(default)/documents/device/living-room"
        );
    }

    #[test]
    fn should_build_rest_urls() {
        let config = StoreConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..configured()
        };
        assert_eq!(
            config.commit_url(),
            "http://localhost:8080/v1/projects/home-1234/databases/(default)/documents:commit"
        );
        assert_eq!(
            config.collection_url(),
            "http://localhost:8080/v1/projects/home-1234/databases/(default)/documents/device"
        );
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            project_id = "home-1234"
            collection = "devices"
            poll_interval_ms = 250
        "#;
        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project_id, "home-1234");
        assert_eq!(config.collection, "devices");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.database, "(default)");
    }
}
