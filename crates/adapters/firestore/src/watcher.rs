//! Polling change feed over the device collection.
//!
//! Every tick lists the collection and diffs it against the previous
//! snapshot by document `updateTime`:
//!
//! - first snapshot: every document is `added`
//! - new key: `added`
//! - same key, different `updateTime`: `modified`
//! - key gone: `removed` (carrying the last known data)
//!
//! Changes of one poll are emitted in key order.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use firebridge_domain::document::DocumentRecord;
use firebridge_domain::event::{ChangeKind, DocumentChange};
use firebridge_domain::id::DocumentKey;

use crate::client::FirestoreClient;
use crate::error::FirestoreError;
use crate::value::Document;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    update_time: Option<String>,
    record: DocumentRecord,
}

/// The state of the collection at one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<DocumentKey, Entry>,
}

impl Snapshot {
    /// Build a snapshot from listed documents, skipping unnamed ones.
    #[must_use]
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut entries = BTreeMap::new();
        for document in documents {
            match document.key() {
                Ok(key) => {
                    entries.insert(
                        key,
                        Entry {
                            update_time: document.update_time.clone(),
                            record: document.to_record(),
                        },
                    );
                }
                Err(err) => tracing::warn!(error = %err, "skipping document"),
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes that lead from `previous` (or nothing) to `self`.
    #[must_use]
    pub fn diff(&self, previous: Option<&Snapshot>) -> Vec<DocumentChange> {
        let Some(previous) = previous else {
            return self
                .entries
                .iter()
                .map(|(key, entry)| change(ChangeKind::Added, key, entry))
                .collect();
        };

        let mut changes: Vec<DocumentChange> = Vec::new();
        for (key, entry) in &self.entries {
            match previous.entries.get(key) {
                None => changes.push(change(ChangeKind::Added, key, entry)),
                Some(old) if old.update_time != entry.update_time => {
                    changes.push(change(ChangeKind::Modified, key, entry));
                }
                Some(_) => {}
            }
        }
        for (key, entry) in &previous.entries {
            if !self.entries.contains_key(key) {
                changes.push(change(ChangeKind::Removed, key, entry));
            }
        }
        changes.sort_by(|a, b| a.key.cmp(&b.key));
        changes
    }
}

fn change(kind: ChangeKind, key: &DocumentKey, entry: &Entry) -> DocumentChange {
    DocumentChange::new(kind, key.clone(), entry.record.clone())
}

/// Polls the collection and forwards changes into a channel.
pub struct ChangeWatcher {
    client: FirestoreClient,
    interval: Duration,
    previous: Option<Snapshot>,
}

impl ChangeWatcher {
    #[must_use]
    pub fn new(client: FirestoreClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            previous: None,
        }
    }

    /// Spawn the polling loop.
    ///
    /// The loop ends when `cancel` fires or the receiver is dropped.
    pub fn start(
        self,
        sender: mpsc::Sender<DocumentChange>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(sender, cancel))
    }

    /// List once and return the changes since the previous poll.
    ///
    /// # Errors
    ///
    /// Returns the listing error; the previous snapshot is kept so the next
    /// successful poll diffs against it.
    pub async fn poll(&mut self) -> Result<Vec<DocumentChange>, FirestoreError> {
        let documents = self.client.list_documents().await?;
        let snapshot = Snapshot::from_documents(&documents);
        let changes = snapshot.diff(self.previous.as_ref());
        self.previous = Some(snapshot);
        Ok(changes)
    }

    async fn run(mut self, sender: mpsc::Sender<DocumentChange>, cancel: CancellationToken) {
        tracing::info!(
            collection = %self.client.config().collection,
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "watching document collection"
        );

        loop {
            match self.poll().await {
                Ok(changes) => {
                    for change in changes {
                        tracing::debug!(key = %change.key, kind = %change.kind, "document change");
                        if sender.send(change).await.is_err() {
                            tracing::info!("document change receiver closed, stopping watcher");
                            return;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "listing documents failed, retrying next interval");
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::debug!("document watcher exiting");
    }
}
