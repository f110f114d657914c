//! Diagnostics are emitted only when the engine is built with logging on.
//!
//! Each test installs a thread-local subscriber that writes into a buffer.
//! `#[tokio::test]` runs on a current-thread runtime, so spawned processing
//! attempts log through the same subscriber.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use eventsystem_engine::{
    EngineConfig, EventStatus, EventSystem, Handler, HandlerRegistry, MemoryDatastore,
};
use serde_json::{json, Value};
use tracing::subscriber::DefaultGuard;

// ---------------------------------------------------------------------------
// Capturing writer
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (Captured, DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn failing(message: &'static str) -> impl Handler + 'static {
    move |_payload: Value| async move { Err::<(), _>(anyhow!(message)) }
}

/// Publish one event whose only handler fails, and wait until it is errored.
async fn run_failing_event(config: EngineConfig) {
    let store = Arc::new(MemoryDatastore::new());
    let registry = HandlerRegistry::new().on("order.created", failing("insufficient stock"));
    let system = EventSystem::new(store.clone(), registry, config);

    let id = system.publish("order.created", json!({"id": 1})).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while store.read_event(&id).map(|e| e.status()) != Some(EventStatus::Errored) {
        assert!(tokio::time::Instant::now() < deadline, "event never errored");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Restart clears the error; the handler fails again on reprocessing.
    system.restart().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn default_config_emits_nothing() {
    let (captured, _guard) = capture();

    run_failing_event(EngineConfig::default()).await;

    assert_eq!(captured.contents(), "");
}

#[tokio::test]
async fn disabled_logging_emits_nothing() {
    let (captured, _guard) = capture();

    run_failing_event(EngineConfig::builder().log_enabled(false).build()).await;

    assert_eq!(captured.contents(), "");
}

#[tokio::test]
async fn enabled_logging_reports_lifecycle_and_failures() {
    let (captured, _guard) = capture();

    run_failing_event(EngineConfig::builder().log_enabled(true).build()).await;

    let logs = captured.contents();
    assert!(logs.contains("Registered handler"), "{logs}");
    assert!(logs.contains("Publishing event"), "{logs}");
    assert!(logs.contains("Failed to handle event"), "{logs}");
    assert!(logs.contains("insufficient stock"), "{logs}");
    assert!(logs.contains("Restarting event pipeline"), "{logs}");
}
