//! REST client for the hub's command/query API.
//!
//! Wraps `reqwest::Client` with bearer authentication and the hub's URL
//! layout. Reconciliation only ever issues `turn_on` / `turn_off`; other
//! services reach the hub solely through [`HubClient::forward_service`].

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;

use firebridge_app::ports::{CommandAck, HubDispatcher, Service, ServiceCall};
use firebridge_domain::entity::{EntityState, StateReading};
use firebridge_domain::error::BridgeError;
use firebridge_domain::id::EntityId;
use firebridge_domain::identity::DeviceRef;

use crate::config::HubConfig;
use crate::error::HubError;

/// HTTP client for the hub REST API.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    config: HubConfig,
}

impl HubClient {
    /// Build a client with bearer auth and the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the underlying client cannot be
    /// built, or [`HubError::Protocol`] if the token is not a valid header
    /// value.
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.expose_secret()))
            .map_err(|_| HubError::Protocol("access token is not a valid header".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("firebridge/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// `GET /api/states/{entity_id}`.
    ///
    /// # Errors
    ///
    /// [`HubError::NotFound`] on 404, [`HubError::Status`] on other failures.
    pub async fn fetch_state(&self, entity_id: &EntityId) -> Result<StateReading, HubError> {
        let url = self.config.api_url(&format!("api/states/{entity_id}"));
        tracing::debug!(%url, "GET");

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(HubError::NotFound(entity_id.clone()));
        }
        let raw: serde_json::Value = check_status(response).await?.json().await?;
        let state = raw
            .get("state")
            .and_then(serde_json::Value::as_str)
            .map_or(EntityState::Unknown, EntityState::from_hub);
        Ok(StateReading { state, raw })
    }

    /// `POST /api/services/{domain}/{service}` with `{"entity_id": ..}`.
    ///
    /// # Errors
    ///
    /// [`HubError::NotFound`] on 404 (unknown service or entity),
    /// [`HubError::Status`] on other failures.
    pub async fn send_command(
        &self,
        device: &DeviceRef,
        service: Service,
    ) -> Result<CommandAck, HubError> {
        let url = self
            .config
            .api_url(&format!("api/services/{}/{service}", device.domain()));
        tracing::debug!(%url, entity_id = %device, "POST");

        let response = self
            .http
            .post(url)
            .json(&json!({ "entity_id": device.entity_id() }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(HubError::NotFound(device.entity_id().clone()));
        }
        let response = check_status(response).await?.json().await?;
        Ok(CommandAck { service, response })
    }

    /// `POST /api/services/{domain}/{service}` with the call's data as body.
    ///
    /// # Errors
    ///
    /// [`HubError::Status`] if the hub answers with a failure (400 for an
    /// unknown service or bad data).
    pub async fn forward_service(
        &self,
        call: &ServiceCall,
    ) -> Result<serde_json::Value, HubError> {
        let url = self
            .config
            .api_url(&format!("api/services/{}/{}", call.domain, call.service));
        tracing::debug!(%url, service = %call, "POST");

        let response = self.http.post(url).json(&call.data).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// `GET /api/states`.
    ///
    /// # Errors
    ///
    /// [`HubError::Status`] if the hub answers with a failure.
    pub async fn fetch_all_states(&self) -> Result<serde_json::Value, HubError> {
        let url = self.config.api_url("api/states");
        tracing::debug!(%url, "GET");

        let response = self.http.get(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HubError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HubDispatcher for HubClient {
    async fn get_state(&self, entity_id: &EntityId) -> Result<StateReading, BridgeError> {
        self.fetch_state(entity_id)
            .await
            .map_err(|err| err.into_query(entity_id))
    }

    async fn set_state(&self, device: &DeviceRef, on: bool) -> Result<CommandAck, BridgeError> {
        let service = Service::for_state(on);
        self.send_command(device, service)
            .await
            .map_err(|err| err.into_command(device.entity_id(), service.as_str()))
    }

    async fn list_states(&self) -> Result<serde_json::Value, BridgeError> {
        Ok(self.fetch_all_states().await?)
    }

    async fn call_service(&self, call: &ServiceCall) -> Result<serde_json::Value, BridgeError> {
        self.forward_service(call)
            .await
            .map_err(|err| BridgeError::RemoteService {
                service: call.to_string(),
                source: Box::new(err),
            })
    }
}
