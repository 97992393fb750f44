//! Hub `state_changed` feed over WebSocket, with auto-reconnect.
//!
//! Each session performs the hub handshake:
//!
//! ```text
//! hub → auth_required
//!     ← {"type":"auth","access_token":…}
//! hub → auth_ok                      (auth_invalid is fatal)
//!     ← {"id":1,"type":"subscribe_events","event_type":"state_changed"}
//! hub → result, then one `event` message per state change
//! ```
//!
//! Every `state_changed` payload is forwarded as a [`HubEvent`] into an mpsc
//! channel. Transport failures reconnect with exponential backoff and jitter;
//! a clean close reconnects immediately and resets the backoff.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use firebridge_domain::event::HubEvent;

use crate::config::HubConfig;
use crate::error::HubError;

/// Message id of the single event subscription per session.
const SUBSCRIBE_ID: u64 = 1;

const STATE_CHANGED: &str = "state_changed";

// ── Messages ─────────────────────────────────────────────────────────

/// A message received from the hub WebSocket, classified by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        error: Option<serde_json::Value>,
    },
    Event {
        #[serde(default)]
        id: Option<u64>,
        event: EventEnvelope,
    },
    /// Anything else (pong, other commands' results, …).
    #[serde(other)]
    Other,
}

/// The `event` object of an `event` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl HubMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns the serde error for frames that are not a typed JSON object.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// What a session does in response to one message.
#[derive(Debug, PartialEq)]
enum Step {
    Reply(serde_json::Value),
    Forward(HubEvent),
    Subscribed,
    Nothing,
}

fn step(message: HubMessage, token: &SecretString) -> Result<Step, HubError> {
    match message {
        HubMessage::AuthRequired { .. } => Ok(Step::Reply(json!({
            "type": "auth",
            "access_token": token.expose_secret(),
        }))),
        HubMessage::AuthOk { ha_version } => {
            tracing::info!(version = ?ha_version, "authenticated with hub");
            Ok(Step::Reply(json!({
                "id": SUBSCRIBE_ID,
                "type": "subscribe_events",
                "event_type": STATE_CHANGED,
            })))
        }
        HubMessage::AuthInvalid { message } => Err(HubError::AuthRejected(
            message.unwrap_or_else(|| "invalid access token".to_string()),
        )),
        HubMessage::Result {
            id: SUBSCRIBE_ID,
            success: false,
            error,
        } => Err(HubError::Protocol(format!(
            "subscription refused: {}",
            error.unwrap_or_default()
        ))),
        HubMessage::Result {
            id: SUBSCRIBE_ID,
            success: true,
            ..
        } => Ok(Step::Subscribed),
        HubMessage::Event { event, .. } if event.event_type == STATE_CHANGED => {
            match serde_json::from_value::<HubEvent>(event.data) {
                Ok(hub_event) => Ok(Step::Forward(hub_event)),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed state_changed payload");
                    Ok(Step::Nothing)
                }
            }
        }
        _ => Ok(Step::Nothing),
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// `min(initial * 2^attempt, max)`, spread by a deterministic ±25% jitter.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(20)).unwrap_or(20);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── HubEventFeed ─────────────────────────────────────────────────────

/// Handle to the background feed task.
pub struct HubEventFeed {
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), HubError>>,
}

impl HubEventFeed {
    /// Spawn the feed; events are sent into `sender` until it is closed,
    /// `cancel` fires, or the hub rejects the token.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidUrl`] / [`HubError::UnsupportedScheme`] if
    /// no WebSocket URL can be derived from the config.
    pub fn spawn(
        config: &HubConfig,
        sender: mpsc::Sender<HubEvent>,
        cancel: CancellationToken,
    ) -> Result<Self, HubError> {
        let url = config.websocket_url()?;
        let token = config.token.clone();
        let reconnect = config.reconnect();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            feed_loop(url, token, reconnect, sender, task_cancel).await
        });
        Ok(Self { cancel, handle })
    }

    /// Ask the feed to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the feed task to end.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the feed, if any.
    pub async fn join(self) -> Result<(), HubError> {
        self.handle
            .await
            .map_err(|err| HubError::WebSocket(format!("feed task failed: {err}")))?
    }
}

enum SessionEnd {
    Disconnected,
    ReceiverClosed,
}

async fn feed_loop(
    url: Url,
    token: SecretString,
    reconnect: ReconnectConfig,
    sender: mpsc::Sender<HubEvent>,
    cancel: CancellationToken,
) -> Result<(), HubError> {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = run_session(&url, &token, &sender) => result,
        };

        match result {
            Ok(SessionEnd::ReceiverClosed) => {
                tracing::info!("hub event receiver closed, stopping feed");
                break;
            }
            Ok(SessionEnd::Disconnected) => {
                // Reset the backoff, but never reconnect immediately.
                tracing::info!("hub WebSocket disconnected cleanly");
                attempt = 0;
            }
            Err(err) if !err.is_retryable() => {
                tracing::error!(error = %err, "hub feed stopped");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(error = %err, attempt, "hub WebSocket error");
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("hub feed exiting");
    Ok(())
}

/// One connection: handshake, then forward events until the socket drops.
async fn run_session(
    url: &Url,
    token: &SecretString,
    sender: &mpsc::Sender<HubEvent>,
) -> Result<SessionEnd, HubError> {
    tracing::info!(%url, "connecting to hub WebSocket");
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| HubError::WebSocket(e.to_string()))?;
    tracing::info!("hub WebSocket connected");

    let (mut write, mut read) = ws_stream.split();

    while let Some(frame) = read.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "hub WebSocket close frame received");
                return Ok(SessionEnd::Disconnected);
            }
            Ok(_) => continue,
            Err(e) => return Err(HubError::WebSocket(e.to_string())),
        };

        let message = match HubMessage::parse(text.as_str()) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unparseable hub message");
                continue;
            }
        };

        match step(message, token)? {
            Step::Reply(reply) => {
                write
                    .send(Message::text(reply.to_string()))
                    .await
                    .map_err(|e| HubError::WebSocket(e.to_string()))?;
            }
            Step::Forward(event) => {
                if sender.send(event).await.is_err() {
                    return Ok(SessionEnd::ReceiverClosed);
                }
            }
            Step::Subscribed => tracing::info!("subscribed to state_changed events"),
            Step::Nothing => {}
        }
    }

    tracing::info!("hub WebSocket stream ended");
    Ok(SessionEnd::Disconnected)
}
