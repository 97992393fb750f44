//! # firebridge-adapter-hub
//!
//! Home-automation hub adapter — the hub side of the bridge.
//!
//! ## Responsibilities
//! - [`HubClient`]: REST command/query client implementing
//!   [`HubDispatcher`](firebridge_app::ports::HubDispatcher)
//!   (`GET /api/states/{id}`, `POST /api/services/{domain}/{turn_on|turn_off}`,
//!   `GET /api/states`), bearer-token authenticated
//! - [`HubEventFeed`]: authenticated WebSocket subscription to
//!   `state_changed`, forwarding every event into an mpsc channel and
//!   reconnecting with exponential backoff
//!
//! ## Dependency rule
//! Depends on `firebridge-app` (port traits) and `firebridge-domain`.

pub mod client;
pub mod config;
pub mod error;
pub mod websocket;

pub use client::HubClient;
pub use config::HubConfig;
pub use error::HubError;
pub use websocket::{HubEventFeed, HubMessage, ReconnectConfig};
