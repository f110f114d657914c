use eventsystem_store::StoreError;
use thiserror::Error;

/// Errors returned to callers of the synchronous engine surface.
///
/// Failures inside the background processing step are never returned; they
/// are logged and left visible in the persisted record.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to persist event: {0}")]
    Store(#[from] StoreError),

    #[error("invalid configuration: {key}={value}")]
    InvalidConfig { key: String, value: String },
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
