//! # firebridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - `GET /health`: liveness plus whether the store side is running
//! - `GET /api/states`: proxy of the hub's full state listing
//! - `GET /api/events/stream`: Server-Sent Events fan-out of every hub
//!   `state_changed` event, verbatim
//! - CORS for browser clients
//!
//! ## Dependency rule
//! Depends on `firebridge-app` (port traits, event bus) and
//! `firebridge-domain`. Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
