//! # firebridge-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HubDispatcher` — read entity state from the hub and issue commands
//!   - `DocumentWriter` — merge-upsert device documents into the store
//!   - `EventPublisher` — mirror hub events to external subscribers
//! - Hold the engine's **echo memory** (`SyncMemory`)
//! - Implement the **synchronization engine** (`SyncEngine`): hub → store
//!   propagation with echo suppression, store → hub reconciliation with a
//!   settle delay and verified write-back
//! - Run both inbound feeds with **per-entity serialization** (`runtime`)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `firebridge-domain` only (plus `tokio` for channels, tasks and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod engine;
pub mod event_bus;
pub mod memory;
pub mod ports;
pub mod runtime;
