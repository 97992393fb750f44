//! Document port — idempotent merge-upsert of device documents.

use std::future::Future;

use firebridge_domain::document::DeviceUpdate;
use firebridge_domain::error::BridgeError;
use firebridge_domain::id::DocumentKey;

/// Writes observed device state into the document store.
///
/// Implementations must merge (fields not named in [`DeviceUpdate`] are left
/// untouched) and let the store assign `updatedAt`. Repeating an upsert with
/// identical fields has no observable effect beyond the timestamp.
pub trait DocumentWriter {
    /// Merge `update` into the document at `key`, creating it if missing.
    fn upsert(
        &self,
        key: &DocumentKey,
        update: DeviceUpdate,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: DocumentWriter + Send + Sync> DocumentWriter for std::sync::Arc<T> {
    fn upsert(
        &self,
        key: &DocumentKey,
        update: DeviceUpdate,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).upsert(key, update)
    }
}
