//! Axum router assembly.

use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use firebridge_app::ports::HubDispatcher;
use firebridge_domain::time::Timestamp;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and serves the health report at both `/`
/// and `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level, and a CORS layer for `cors_origin` (`*` allows any).
pub fn build<H>(state: AppState<H>, cors_origin: &str) -> Router
where
    H: HubDispatcher + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health_check::<H>))
        .route("/health", get(health_check::<H>))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else if let Ok(value) = HeaderValue::from_str(origin) {
        AllowOrigin::exact(value)
    } else {
        tracing::warn!(origin, "invalid CORS origin, cross-origin requests disabled");
        AllowOrigin::list(Vec::<HeaderValue>::new())
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[derive(Serialize)]
struct Health {
    name: &'static str,
    version: &'static str,
    status: &'static str,
    store_enabled: bool,
    timestamp: Timestamp,
}

async fn health_check<H>(State(state): State<AppState<H>>) -> Json<Health>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    Json(Health {
        name: "firebridge",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        store_enabled: state.store_enabled,
        timestamp: firebridge_domain::time::now(),
    })
}
