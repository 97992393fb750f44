//! # firebridge-domain
//!
//! Pure domain model for the firebridge hub ↔ document-store bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **entity ids** (`<domain>.<name>`) and **document keys**, and the
//!   identity mapping between them
//! - Define **entity states** as reported by the hub
//! - Define **hub events** (`state_changed`) and **document changes**
//!   (added / modified / removed)
//! - Define the **document record** shape written to and read from the store
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod document;
pub mod entity;
pub mod event;
pub mod identity;
