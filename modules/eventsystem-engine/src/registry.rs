//! Handler registry: event name → handlers, in registration order.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Reacts to an event's payload. May perform I/O.
///
/// Several handlers can share an event name, and a handler can run again for
/// the same record after a restart, so implementations should be idempotent.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: &serde_json::Value) -> Result<()>;
}

// Any async closure taking the payload is a handler.
#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, payload: &serde_json::Value) -> Result<()> {
        (self)(payload.clone()).await
    }
}

struct Binding {
    event: String,
    handler: Arc<dyn Handler>,
}

/// Ordered list of (event name, handler) bindings.
///
/// Built at setup time and handed to the engine. Names are not unique; every
/// binding whose name matches runs, in the order it was registered.
#[derive(Default)]
pub struct HandlerRegistry {
    bindings: Vec<Binding>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding for `event`.
    pub fn register(
        &mut self,
        event: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        self.bindings.push(Binding {
            event: event.into(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn on(mut self, event: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.register(event, handler);
        self
    }

    /// Handlers bound to `event`, in registration order.
    pub fn handlers_for<'a>(
        &'a self,
        event: &'a str,
    ) -> impl Iterator<Item = &'a dyn Handler> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.event == event)
            .map(|b| b.handler.as_ref())
    }

    /// Bound event names in registration order, duplicates included.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.event.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.event_names()).finish()
    }
}
