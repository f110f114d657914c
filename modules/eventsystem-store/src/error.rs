//! Typed errors for datastore operations.

use thiserror::Error;

/// Errors a datastore can surface. The dispatch engine passes these through
/// unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure in the Postgres backend
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record id that the backend cannot interpret
    #[error("invalid event id: {id}")]
    InvalidId { id: String },

    /// Backend is not able to serve the request right now
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for datastore operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
