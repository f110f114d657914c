//! Durable storage for published events and their processing lifecycle.
//!
//! Records carry an opaque JSON payload plus the timestamps and error that
//! describe where they are in the dispatch state machine. The dispatch engine
//! only needs two operations from a store (`save_event`, `get_event`); this
//! crate defines that contract and ships an in-memory and a Postgres backend.

pub mod error;
pub mod memory;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryDatastore;
pub use store::PgDatastore;
pub use traits::Datastore;
pub use types::{EventRecord, EventStatus};
