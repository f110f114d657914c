//! The dispatch state machine.

use std::sync::Arc;

use chrono::Utc;
use eventsystem_store::{Datastore, EventRecord};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::registry::HandlerRegistry;

/// Emit a tracing event only when the engine was built with logging on.
macro_rules! diag {
    ($inner:expr, $level:ident, $($arg:tt)+) => {
        if $inner.config.log_enabled {
            tracing::$level!($($arg)+);
        }
    };
}

/// Durable event dispatch engine.
///
/// Publish → persist → trigger a background attempt. Each attempt takes the
/// datastore's oldest unfinished record and walks it through
/// pending → started → finished, or → errored on the first handler failure.
/// An errored record blocks every later record until [`restart`](Self::restart).
///
/// Cloning is cheap; clones share the datastore, registry and in-flight guard.
pub struct EventSystem<D: Datastore> {
    inner: Arc<Inner<D>>,
}

struct Inner<D: Datastore> {
    datastore: D,
    registry: HandlerRegistry,
    config: EngineConfig,
    in_flight: Mutex<()>,
}

impl<D: Datastore> Clone for EventSystem<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Datastore + 'static> EventSystem<D> {
    pub fn new(datastore: D, registry: HandlerRegistry, config: EngineConfig) -> Self {
        let inner = Inner {
            datastore,
            registry,
            config,
            in_flight: Mutex::new(()),
        };

        for name in inner.registry.event_names() {
            diag!(inner, info, event = name, "Registered handler");
        }

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Persist a new event and schedule one processing attempt.
    ///
    /// Returns the id the datastore assigned. If the save fails the error is
    /// returned and nothing is scheduled. The scheduled attempt handles
    /// whichever record is next in line, which is not necessarily this one.
    pub async fn publish(
        &self,
        name: impl Into<String>,
        payload: serde_json::Value,
    ) -> EngineResult<String> {
        let mut event = EventRecord::new(name, payload);
        diag!(self.inner, info, event = %event.name, "Publishing event");

        if let Err(e) = self.inner.datastore.save_event(&mut event).await {
            diag!(self.inner, error, event = %event.name, error = %e, "Failed to save event");
            return Err(e.into());
        }

        self.trigger();
        Ok(event.id)
    }

    /// Clear the error on the blocking record, if there is one, and schedule
    /// a processing attempt.
    ///
    /// Handlers that succeeded before the failing one will run again when the
    /// record is reprocessed. If the candidate cannot be fetched, or the
    /// cleared record cannot be saved, nothing is scheduled.
    pub async fn restart(&self) {
        diag!(self.inner, info, "Restarting event pipeline");

        if self.inner.clear_blocking().await {
            self.trigger();
        }
    }

    pub fn datastore(&self) -> &D {
        &self.inner.datastore
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Fire-and-forget: the caller never sees the attempt's outcome.
    fn trigger(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.process_next().await;
        });
    }
}

impl<D: Datastore> Inner<D> {
    /// Held for the whole read-modify-write of a record when single-flight
    /// is on, so restarts and attempts never interleave their saves.
    async fn claim(&self) -> Option<MutexGuard<'_, ()>> {
        if self.config.single_flight {
            Some(self.in_flight.lock().await)
        } else {
            None
        }
    }

    /// Clear the error on the candidate if it has one. Returns false when
    /// the candidate could not be fetched or the cleared copy not saved.
    async fn clear_blocking(&self) -> bool {
        let _guard = self.claim().await;

        let candidate = match self.datastore.get_event().await {
            Ok(candidate) => candidate,
            Err(e) => {
                diag!(self, error, error = %e, "Failed to get event");
                return false;
            }
        };

        let Some(mut event) = candidate.filter(EventRecord::is_blocking) else {
            return true;
        };

        diag!(
            self,
            info,
            event_id = %event.id,
            event = %event.name,
            error = ?event.error,
            "Restarting failed event"
        );
        event.error = None;
        self.save(&mut event).await
    }

    /// One processing attempt. Every failure is terminal to this attempt and
    /// only visible in the logs and in the persisted record.
    async fn process_next(&self) {
        let _guard = self.claim().await;

        let mut event = match self.datastore.get_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                diag!(self, debug, "No event available");
                return;
            }
            Err(e) => {
                diag!(self, error, error = %e, "Failed to get event");
                return;
            }
        };

        // Halt-on-error: never move past a failed record.
        if let Some(error) = event.error.as_deref() {
            diag!(
                self,
                warn,
                event_id = %event.id,
                event = %event.name,
                error,
                "Last event aborted with error"
            );
            return;
        }

        event.started_at = Some(Utc::now());
        if !self.save(&mut event).await {
            return;
        }

        let mut failure = None;
        for handler in self.registry.handlers_for(&event.name) {
            if let Err(e) = handler.handle(&event.payload).await {
                failure = Some(e);
                break;
            }
        }

        match failure {
            Some(e) => {
                let message = format!("{e:#}");
                diag!(
                    self,
                    warn,
                    event_id = %event.id,
                    event = %event.name,
                    error = %message,
                    "Failed to handle event"
                );
                event.error = Some(message);
            }
            None => {
                event.finished_at = Some(Utc::now());
            }
        }

        self.save(&mut event).await;
    }

    async fn save(&self, event: &mut EventRecord) -> bool {
        match self.datastore.save_event(event).await {
            Ok(()) => true,
            Err(e) => {
                diag!(self, error, event_id = %event.id, error = %e, "Failed to save event");
                false
            }
        }
    }
}
