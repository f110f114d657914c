//! In-memory datastore and the `Arc<D>` blanket.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::traits::Datastore;
use crate::types::EventRecord;

// ---------------------------------------------------------------------------
// MemoryDatastore (tests, embedded use — no database required)
// ---------------------------------------------------------------------------

/// In-memory datastore. Records are kept in publish order; ids are UUID v4.
/// Thread-safe.
#[derive(Default)]
pub struct MemoryDatastore {
    events: Mutex<Vec<EventRecord>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, oldest first (for assertions).
    pub fn events(&self) -> Vec<EventRecord> {
        self.lock().clone()
    }

    /// Read a single record by id.
    pub fn read_event(&self, id: &str) -> Option<EventRecord> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    // Every write swaps in a whole record, so a panic while the lock is held
    // cannot leave a half-written one behind. Poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<EventRecord>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn save_event(&self, event: &mut EventRecord) -> StoreResult<()> {
        let mut events = self.lock();

        if event.is_unsaved() {
            event.id = Uuid::new_v4().to_string();
        }

        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => events.push(event.clone()),
        }

        Ok(())
    }

    async fn get_event(&self) -> StoreResult<Option<EventRecord>> {
        let events = self.lock();
        Ok(events.iter().find(|e| e.finished_at.is_none()).cloned())
    }
}

// ---------------------------------------------------------------------------
// Arc<D> blanket — lets tests share the store for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<D: Datastore + ?Sized> Datastore for Arc<D> {
    async fn save_event(&self, event: &mut EventRecord) -> StoreResult<()> {
        (**self).save_event(event).await
    }

    async fn get_event(&self) -> StoreResult<Option<EventRecord>> {
        (**self).get_event().await
    }
}
