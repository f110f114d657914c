//! The persisted event record. Payload-agnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published event and its processing lifecycle.
///
/// The datastore owns `id`; the dispatch engine owns the timestamps and
/// `error`. An empty `id` means "not saved yet, assign on save".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Where a record is in the dispatch state machine. Exactly one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Started,
    Finished,
    Errored,
}

impl EventRecord {
    /// A fresh, unsaved record stamped with the current time.
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            payload,
            published_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// True until a datastore has assigned an id.
    pub fn is_unsaved(&self) -> bool {
        self.id.is_empty()
    }

    /// An errored record halts the pipeline until it is restarted.
    pub fn is_blocking(&self) -> bool {
        self.error.is_some()
    }

    /// Error wins over the timestamps: a record that failed after being
    /// started reports `Errored`, not `Started`.
    pub fn status(&self) -> EventStatus {
        if self.error.is_some() {
            EventStatus::Errored
        } else if self.finished_at.is_some() {
            EventStatus::Finished
        } else if self.started_at.is_some() {
            EventStatus::Started
        } else {
            EventStatus::Pending
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Pending => "pending",
            EventStatus::Started => "started",
            EventStatus::Finished => "finished",
            EventStatus::Errored => "errored",
        };
        f.pad(s)
    }
}
