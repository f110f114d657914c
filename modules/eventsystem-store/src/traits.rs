//! The storage contract the dispatch engine depends on.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::EventRecord;

/// Durable storage for event records.
///
/// Implemented by `PgDatastore` (postgres) and `MemoryDatastore` (tests).
/// Also implemented for `Arc<D>` so a store can be shared for assertions.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Upsert a record. Assigns `event.id` when it is empty, updates the
    /// stored copy otherwise. Saving the same record twice is harmless.
    async fn save_event(&self, event: &mut EventRecord) -> StoreResult<()>;

    /// The next candidate to process: the oldest record, in publish order,
    /// that has not finished. Errored records are still candidates so the
    /// engine can refuse to move past them.
    async fn get_event(&self) -> StoreResult<Option<EventRecord>>;
}
