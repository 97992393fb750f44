//! # firebridge-adapter-firestore
//!
//! Document-store adapter over the Firestore REST API.
//!
//! ## Responsibilities
//! - [`FirestoreClient`]: implements
//!   [`DocumentWriter`](firebridge_app::ports::DocumentWriter) with a
//!   `:commit` write that merges `entity_id`, `domain` and `state` through an
//!   update mask and lets the server stamp `updatedAt`
//! - [`ChangeWatcher`]: polls the device collection and turns successive
//!   snapshots into added / modified / removed [`DocumentChange`]s
//! - [`value`]: Firestore typed values ↔ domain records
//!
//! ## Dependency rule
//! Depends on `firebridge-app` (port traits) and `firebridge-domain`.
//!
//! [`DocumentChange`]: firebridge_domain::event::DocumentChange

pub mod client;
pub mod config;
pub mod error;
pub mod value;
pub mod watcher;

pub use client::FirestoreClient;
pub use config::StoreConfig;
pub use error::FirestoreError;
pub use watcher::{ChangeWatcher, Snapshot};
