//! Hub port — the command dispatcher.
//!
//! Wraps the hub's query/command protocol: read the current state of one
//! entity, switch a device on or off, and, for the peripheral HTTP surface,
//! list every state and forward arbitrary service calls. All calls are remote and may fail; failures are
//! surfaced as typed [`BridgeError`]s, never swallowed.

use std::future::Future;

use firebridge_domain::entity::StateReading;
use firebridge_domain::error::BridgeError;
use firebridge_domain::id::EntityId;
use firebridge_domain::identity::DeviceRef;

/// Hub services used for reconciliation.
///
/// There is deliberately no `toggle`: reconciliation always names the
/// target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    TurnOn,
    TurnOff,
}

impl Service {
    /// The service that drives a device to `on`.
    #[must_use]
    pub fn for_state(on: bool) -> Self {
        if on { Self::TurnOn } else { Self::TurnOff }
    }

    /// Service name as used in the hub API path.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of an accepted hub command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandAck {
    pub service: Service,
    /// Whatever the hub returned (typically the list of changed states).
    pub response: serde_json::Value,
}

/// A hub service invocation forwarded as-is, e.g. `light/turn_on`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    /// Request body: service data plus any target such as `entity_id`.
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ServiceCall {
    /// Split a `<domain>/<service>` name.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidService`] if either part is missing.
    pub fn parse(
        name: &str,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, BridgeError> {
        match name.split_once('/') {
            Some((domain, service))
                if !domain.is_empty() && !service.is_empty() && !service.contains('/') =>
            {
                Ok(Self {
                    domain: domain.to_string(),
                    service: service.to_string(),
                    data,
                })
            }
            _ => Err(BridgeError::InvalidService(name.to_string())),
        }
    }
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.service)
    }
}

/// Issues commands to the hub and reads entity state.
pub trait HubDispatcher {
    /// Read the current state of an entity.
    fn get_state(
        &self,
        entity_id: &EntityId,
    ) -> impl Future<Output = Result<StateReading, BridgeError>> + Send;

    /// Switch a device on or off (`turn_on` / `turn_off`).
    fn set_state(
        &self,
        device: &DeviceRef,
        on: bool,
    ) -> impl Future<Output = Result<CommandAck, BridgeError>> + Send;

    /// List the state of every hub entity as raw JSON.
    fn list_states(&self) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send;

    /// Invoke any hub service and return the hub's raw response.
    fn call_service(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send;
}

impl<T: HubDispatcher + Send + Sync> HubDispatcher for std::sync::Arc<T> {
    fn get_state(
        &self,
        entity_id: &EntityId,
    ) -> impl Future<Output = Result<StateReading, BridgeError>> + Send {
        (**self).get_state(entity_id)
    }

    fn set_state(
        &self,
        device: &DeviceRef,
        on: bool,
    ) -> impl Future<Output = Result<CommandAck, BridgeError>> + Send {
        (**self).set_state(device, on)
    }

    fn list_states(&self) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send {
        (**self).list_states()
    }

    fn call_service(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send {
        (**self).call_service(call)
    }
}
