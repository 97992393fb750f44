//! Event routing between the two inbound feeds and the [`SyncEngine`].
//!
//! Hub events and document changes arrive on independent channels. Each
//! trigger is routed to a worker task owned by its entity, so all work for
//! one entity runs strictly in arrival order while different entities
//! proceed concurrently. In particular, the hub echo of a command issued by
//! Path B queues behind the reconciliation that caused it and is therefore
//! checked against the freshly recorded memory.
//!
//! Entity queues are unbounded: routing never waits on a busy entity, so a
//! device stuck in its settle window cannot delay any other device.
//!
//! Every hub event is published to the [`EventPublisher`] before any
//! filtering. Failures are logged with entity context and never stop the
//! runtime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;

use firebridge_domain::error::BridgeError;
use firebridge_domain::event::{DocumentChange, HubEvent};
use firebridge_domain::id::EntityId;

use crate::engine::{DocumentOutcome, DocumentPlan, HubOutcome, Reconciliation, SyncEngine};
use crate::ports::{DocumentWriter, EventPublisher, HubDispatcher};

enum Job {
    Hub(HubEvent),
    Document(Reconciliation),
}

type Workers = HashMap<EntityId, mpsc::UnboundedSender<Job>>;

/// Drives a [`SyncEngine`] from the hub feed and the document feed.
pub struct SyncRuntime<H, W, P> {
    engine: Arc<SyncEngine<H, W>>,
    publisher: P,
}

impl<H, W, P> SyncRuntime<H, W, P>
where
    H: HubDispatcher + Send + Sync + 'static,
    W: DocumentWriter + Send + Sync + 'static,
    P: EventPublisher,
{
    pub fn new(engine: Arc<SyncEngine<H, W>>, publisher: P) -> Self {
        Self { engine, publisher }
    }

    /// Consume both feeds until they are closed, then wait for every
    /// in-flight entity worker to finish.
    pub async fn run(
        self,
        mut hub_rx: mpsc::Receiver<HubEvent>,
        mut doc_rx: mpsc::Receiver<DocumentChange>,
    ) {
        let mut workers = Workers::new();
        let mut tasks = JoinSet::new();
        let mut hub_open = true;
        let mut doc_open = true;

        tracing::info!("sync runtime started");

        while hub_open || doc_open {
            tokio::select! {
                event = hub_rx.recv(), if hub_open => match event {
                    Some(event) => {
                        self.publisher.publish(event.clone()).await;
                        if let Some(entity_id) = routable_entity(&event) {
                            self.dispatch(&mut workers, &mut tasks, entity_id, Job::Hub(event));
                        }
                    }
                    None => {
                        tracing::info!("hub feed closed");
                        hub_open = false;
                    }
                },
                change = doc_rx.recv(), if doc_open => match change {
                    Some(change) => {
                        if let Some(job) = self.plan(&change) {
                            let entity_id = job.device.entity_id().clone();
                            let job = Job::Document(job);
                            self.dispatch(&mut workers, &mut tasks, entity_id, job);
                        }
                    }
                    None => {
                        tracing::info!("document feed closed");
                        doc_open = false;
                    }
                },
            }
        }

        drop(workers);
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::error!(error = %err, "entity worker panicked");
            }
        }
        tracing::info!("sync runtime stopped");
    }

    fn plan(&self, change: &DocumentChange) -> Option<Reconciliation> {
        match self.engine.plan_document_change(change) {
            Ok(DocumentPlan::Reconcile(job)) => Some(job),
            Ok(DocumentPlan::Skip(DocumentOutcome::Ignored(kind))) => {
                tracing::info!(key = %change.key, %kind, "document change observed");
                None
            }
            Ok(DocumentPlan::Skip(outcome)) => {
                tracing::debug!(key = %change.key, ?outcome, "document change skipped");
                None
            }
            Err(err) => {
                tracing::warn!(key = %change.key, error = %err, "dropping document change");
                None
            }
        }
    }

    fn dispatch(
        &self,
        workers: &mut Workers,
        tasks: &mut JoinSet<()>,
        entity_id: EntityId,
        job: Job,
    ) {
        let sender = workers.entry(entity_id.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            spawn_worker(tasks, Arc::clone(&self.engine), entity_id.clone(), rx);
            tx
        });

        if let Err(mpsc::error::SendError(job)) = sender.send(job) {
            // The worker died; start a fresh one and hand it the job.
            tracing::warn!(entity_id = %entity_id, "restarting entity worker");
            let (tx, rx) = mpsc::unbounded_channel();
            spawn_worker(tasks, Arc::clone(&self.engine), entity_id.clone(), rx);
            let _ = tx.send(job);
            workers.insert(entity_id, tx);
        }
    }
}

fn routable_entity(event: &HubEvent) -> Option<EntityId> {
    match event.parsed_entity_id() {
        Ok(entity_id) if entity_id.sync_domain().is_some() => Some(entity_id),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(entity_id = %event.entity_id, error = %err, "ignoring hub event");
            None
        }
    }
}

fn spawn_worker<H, W>(
    tasks: &mut JoinSet<()>,
    engine: Arc<SyncEngine<H, W>>,
    entity_id: EntityId,
    rx: mpsc::UnboundedReceiver<Job>,
) where
    H: HubDispatcher + Send + Sync + 'static,
    W: DocumentWriter + Send + Sync + 'static,
{
    let span = tracing::info_span!("entity", entity_id = %entity_id);
    tasks.spawn(entity_worker(engine, rx).instrument(span));
}

async fn entity_worker<H, W>(engine: Arc<SyncEngine<H, W>>, mut rx: mpsc::UnboundedReceiver<Job>)
where
    H: HubDispatcher + Send + Sync + 'static,
    W: DocumentWriter + Send + Sync + 'static,
{
    while let Some(job) = rx.recv().await {
        match job {
            Job::Hub(event) => {
                log_hub_outcome(&event, engine.handle_hub_event(&event).await);
            }
            Job::Document(job) => {
                log_document_outcome(&job, engine.reconcile(&job).await);
            }
        }
    }
}

fn log_hub_outcome(event: &HubEvent, result: Result<HubOutcome, BridgeError>) {
    match result {
        Ok(HubOutcome::Ignored(reason)) => {
            tracing::trace!(entity_id = %event.entity_id, ?reason, "hub event ignored");
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(entity_id = %event.entity_id, error = %err, "hub → store sync failed");
        }
    }
}

fn log_document_outcome(job: &Reconciliation, result: Result<DocumentOutcome, BridgeError>) {
    if let Err(err) = result {
        tracing::warn!(
            entity_id = %job.device,
            key = %job.key,
            error = %err,
            "store → hub reconciliation failed"
        );
    }
}

/// Forward hub events to `publisher` without synchronizing them.
///
/// Used when the document store is disabled. Returns once the feed closes.
pub async fn mirror_events<P: EventPublisher>(mut rx: mpsc::Receiver<HubEvent>, publisher: P) {
    while let Some(event) = rx.recv().await {
        publisher.publish(event).await;
    }
    tracing::info!("hub feed closed");
}
