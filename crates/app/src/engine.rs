//! Synchronization engine — the policy core of the bridge.
//!
//! Two paths share one echo memory:
//!
//! - **Path A, hub → store** ([`SyncEngine::handle_hub_event`]): filter to
//!   sync-eligible entities carrying a state, drop the event if it matches
//!   the remembered value (echo or no-op), otherwise remember it and upsert
//!   the document.
//! - **Path B, store → hub** ([`SyncEngine::handle_document_change`]):
//!   [`plan_document_change`](SyncEngine::plan_document_change) filters and
//!   resolves the change, then [`reconcile`](SyncEngine::reconcile) compares
//!   the desired state against the live hub state, dispatches `turn_on` /
//!   `turn_off` when they differ, waits for the settle delay, re-reads the
//!   hub and writes the verified state back.
//!
//! Every trigger is handled at most once: failures are returned to the
//! caller and never retried here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use firebridge_domain::document::DeviceUpdate;
use firebridge_domain::error::BridgeError;
use firebridge_domain::event::{ChangeKind, DocumentChange, HubEvent};
use firebridge_domain::id::{DocumentKey, EntityId};
use firebridge_domain::identity::{DeviceRef, IdentityMapper};

use crate::memory::SyncMemory;
use crate::ports::{DocumentWriter, HubDispatcher};

/// Default wait between a hub command and its verification read.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Why a hub event was not considered for propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The entity id is not `<domain>.<name>`.
    MalformedEntityId,
    /// The domain is not switch or light.
    IneligibleDomain,
    /// The event carries no new state.
    NoState,
}

/// Result of Path A for one hub event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubOutcome {
    Ignored(IgnoreReason),
    /// Same value as the last propagated one.
    EchoSuppressed,
    /// The document at `key` now holds `is_on`.
    ///
    /// `displaced` names another device that last wrote the same key.
    Propagated {
        key: DocumentKey,
        is_on: bool,
        displaced: Option<EntityId>,
    },
}

/// Result of Path B for one document change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Only `modified` changes are reconciled.
    Ignored(ChangeKind),
    /// The document has no boolean `state` field.
    NoDesiredState,
    /// The hub already matches; nothing dispatched or written.
    Converged { state: bool },
    /// A command was dispatched and the verified hub state written back.
    Reconciled { requested: bool, verified: bool },
}

/// A modified document resolved to the device it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub device: DeviceRef,
    pub key: DocumentKey,
    pub desired: bool,
}

/// What Path B does with one document change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPlan {
    /// Nothing to reconcile.
    Skip(DocumentOutcome),
    Reconcile(Reconciliation),
}

/// Bidirectional synchronization engine.
pub struct SyncEngine<H, W> {
    hub: H,
    writer: W,
    memory: Arc<SyncMemory>,
    identity: IdentityMapper,
    settle_delay: Duration,
    key_owners: Mutex<HashMap<DocumentKey, EntityId>>,
}

impl<H, W> SyncEngine<H, W>
where
    H: HubDispatcher,
    W: DocumentWriter,
{
    /// Create an engine with the default settle delay.
    pub fn new(hub: H, writer: W, memory: Arc<SyncMemory>, identity: IdentityMapper) -> Self {
        Self {
            hub,
            writer,
            memory,
            identity,
            settle_delay: DEFAULT_SETTLE_DELAY,
            key_owners: Mutex::new(HashMap::new()),
        }
    }

    /// Override the verification window used by Path B.
    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// The echo memory shared by both paths.
    #[must_use]
    pub fn memory(&self) -> &Arc<SyncMemory> {
        &self.memory
    }

    /// Resolver used for store → hub identity.
    #[must_use]
    pub fn identity(&self) -> &IdentityMapper {
        &self.identity
    }

    /// Record `device` as the last writer of `key`.
    ///
    /// Returns the previous owner when it was a different device: the key
    /// derivation drops the domain, so `switch.lamp` and `light.lamp` share
    /// the document `lamp`.
    fn claim_key(&self, key: &DocumentKey, device: &DeviceRef) -> Option<EntityId> {
        let mut owners = self.key_owners.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = owners.insert(key.clone(), device.entity_id().clone())?;
        if &previous == device.entity_id() {
            return None;
        }
        tracing::warn!(
            entity_id = %device,
            %key,
            previous = %previous,
            "document key shared by two devices, last write wins"
        );
        Some(previous)
    }

    /// Path A: propagate a hub state change into the store.
    ///
    /// The echo memory is advanced before the write, so a failed write is
    /// not retried by a redelivery of the same state.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::StoreWrite`] if the upsert fails.
    pub async fn handle_hub_event(&self, event: &HubEvent) -> Result<HubOutcome, BridgeError> {
        let Ok(entity_id) = event.parsed_entity_id() else {
            return Ok(HubOutcome::Ignored(IgnoreReason::MalformedEntityId));
        };
        let Ok(device) = DeviceRef::from_entity_id(entity_id) else {
            return Ok(HubOutcome::Ignored(IgnoreReason::IneligibleDomain));
        };
        let Some(state) = event.state() else {
            return Ok(HubOutcome::Ignored(IgnoreReason::NoState));
        };

        let is_on = state == "on";
        if !self.memory.propagate_if_changed(device.entity_id(), is_on) {
            tracing::debug!(entity_id = %device, is_on, "echo suppressed");
            return Ok(HubOutcome::EchoSuppressed);
        }

        let key = device.document_key();
        let displaced = self.claim_key(&key, &device);
        self.writer
            .upsert(&key, DeviceUpdate::new(&device, is_on))
            .await?;
        tracing::info!(entity_id = %device, %key, is_on, "hub state propagated to store");

        Ok(HubOutcome::Propagated {
            key,
            is_on,
            displaced,
        })
    }

    /// Path B, first half: decide whether a document change needs
    /// reconciling and against which device.
    ///
    /// Runs no I/O; the returned [`Reconciliation`] is executed with
    /// [`reconcile`](Self::reconcile).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownEntity`] if the document cannot be
    /// resolved to a device.
    pub fn plan_document_change(
        &self,
        change: &DocumentChange,
    ) -> Result<DocumentPlan, BridgeError> {
        if change.kind != ChangeKind::Modified {
            return Ok(DocumentPlan::Skip(DocumentOutcome::Ignored(change.kind)));
        }
        let Some(desired) = change.data.desired_state() else {
            return Ok(DocumentPlan::Skip(DocumentOutcome::NoDesiredState));
        };
        let device = self.identity.resolve(&change.key, &change.data)?;
        Ok(DocumentPlan::Reconcile(Reconciliation {
            device,
            key: change.key.clone(),
            desired,
        }))
    }

    /// Path B: reconcile a document change against the hub.
    ///
    /// # Errors
    ///
    /// Any error from [`plan_document_change`](Self::plan_document_change)
    /// or [`reconcile`](Self::reconcile).
    pub async fn handle_document_change(
        &self,
        change: &DocumentChange,
    ) -> Result<DocumentOutcome, BridgeError> {
        match self.plan_document_change(change)? {
            DocumentPlan::Skip(outcome) => Ok(outcome),
            DocumentPlan::Reconcile(job) => self.reconcile(&job).await,
        }
    }

    /// Drive the device towards the desired state and record the verified
    /// hub state in the planned document.
    ///
    /// The hub's post-command state is written even when it differs from
    /// `desired`. The echo memory is updated only after the write succeeds,
    /// so the hub event caused by the command is suppressed when the store
    /// already reflects it and re-propagated otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::RemoteQuery`] / [`BridgeError::RemoteCommand`]
    /// on hub failures (nothing is written in that case) and
    /// [`BridgeError::StoreWrite`] if the write-back fails.
    pub async fn reconcile(&self, job: &Reconciliation) -> Result<DocumentOutcome, BridgeError> {
        let Reconciliation {
            device,
            key,
            desired,
        } = job;
        let desired = *desired;
        let current = self.hub.get_state(device.entity_id()).await?.is_on();
        if current == desired {
            tracing::debug!(entity_id = %device, state = desired, "already converged");
            return Ok(DocumentOutcome::Converged { state: desired });
        }

        let ack = self.hub.set_state(device, desired).await?;
        tracing::info!(entity_id = %device, service = %ack.service, "command dispatched");

        tokio::time::sleep(self.settle_delay).await;

        let verified = self.hub.get_state(device.entity_id()).await?.is_on();
        if verified != desired {
            tracing::warn!(
                entity_id = %device,
                desired,
                verified,
                "hub did not converge to desired state"
            );
        }

        self.claim_key(key, device);
        self.writer
            .upsert(key, DeviceUpdate::new(device, verified))
            .await?;
        self.memory.record(device.entity_id(), verified);
        tracing::info!(entity_id = %device, %key, verified, "verified state written back");

        Ok(DocumentOutcome::Reconciled {
            requested: desired,
            verified,
        })
    }
}
