//! Event dispatch engine.
//!
//! Publish persists an event and nudges a background task; the task picks the
//! oldest unfinished record from the datastore, marks it started, runs every
//! handler registered for its name, and records the outcome. A failed record
//! halts the pipeline until `restart` clears it.
//!
//! Consumers build a `HandlerRegistry` up front and hand it, together with a
//! `Datastore`, to `EventSystem::new`.

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;

pub use config::EngineConfig;
pub use engine::EventSystem;
pub use error::{EngineError, EngineResult};
pub use registry::{Handler, HandlerRegistry};

pub use eventsystem_store::{Datastore, EventRecord, EventStatus, MemoryDatastore, StoreError};
