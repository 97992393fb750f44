//! # firebridged — firebridge daemon
//!
//! Composition root that wires all adapters together and starts the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize tracing
//! - Construct the hub client and WebSocket feed, the Firestore client and
//!   change watcher (adapters)
//! - Construct the sync engine and runtime, injecting adapters via port traits
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use firebridge_adapter_firestore::{ChangeWatcher, FirestoreClient};
use firebridge_adapter_http_axum::state::AppState;
use firebridge_adapter_hub::{HubClient, HubEventFeed};
use firebridge_app::engine::SyncEngine;
use firebridge_app::event_bus::InProcessEventBus;
use firebridge_app::memory::SyncMemory;
use firebridge_app::runtime::{SyncRuntime, mirror_events};

use crate::config::Config;

/// Capacity of the hub event and document change channels.
const FEED_CAPACITY: usize = 256;
/// Capacity of the SSE broadcast bus.
const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting firebridged");

    let shutdown = CancellationToken::new();
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let hub = Arc::new(HubClient::new(config.hub.clone())?);

    // Hub feed
    let (hub_tx, hub_rx) = mpsc::channel(FEED_CAPACITY);
    let feed = HubEventFeed::spawn(&config.hub, hub_tx, shutdown.child_token())?;
    let feed_shutdown = shutdown.clone();
    let feed_task = tokio::spawn(async move {
        let result = feed.join().await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "hub feed stopped, shutting down");
            feed_shutdown.cancel();
        }
        result
    });

    // Store side and engine
    let store_enabled = config.store.is_active();
    let (bridge, watcher) = if store_enabled {
        let store = FirestoreClient::new(config.store.clone())?;
        let (doc_tx, doc_rx) = mpsc::channel(FEED_CAPACITY);
        let watcher = ChangeWatcher::new(store.clone(), config.store.poll_interval())
            .start(doc_tx, shutdown.child_token());

        let engine = SyncEngine::new(
            Arc::clone(&hub),
            store,
            Arc::new(SyncMemory::new()),
            config.identity_mapper()?,
        )
        .with_settle_delay(config.sync.settle_delay());
        let runtime = SyncRuntime::new(Arc::new(engine), Arc::clone(&event_bus));

        tracing::info!(
            project_id = %config.store.project_id,
            collection = %config.store.collection,
            settle_delay_ms = config.sync.settle_delay_ms,
            "sync engine started"
        );
        let bridge: JoinHandle<()> = tokio::spawn(runtime.run(hub_rx, doc_rx));
        (bridge, Some(watcher))
    } else {
        if config.store.enabled {
            tracing::warn!("store project_id not set, store sync disabled");
        } else {
            tracing::info!("store sync disabled by configuration");
        }
        let bridge = tokio::spawn(mirror_events(hub_rx, Arc::clone(&event_bus)));
        (bridge, None)
    };

    // HTTP
    let state = AppState::new(Arc::clone(&hub), Arc::clone(&event_bus), store_enabled);
    let app = firebridge_adapter_http_axum::router::build(state, &config.server.cors_origin);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "firebridged listening");

    tokio::spawn(shutdown_on_signal(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    // Feeds stop on cancellation; the runtime drains once both close.
    shutdown.cancel();
    if let Some(watcher) = watcher {
        watcher.await?;
    }
    bridge.await?;
    feed_task.await??;

    tracing::info!("firebridged stopped");
    Ok(())
}

async fn shutdown_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C"),
        () = terminate => tracing::info!("received SIGTERM"),
        () = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}
