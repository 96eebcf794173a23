//! Error types for the request observer
//!
//! Datastore failures are carried as [`StoreError`] and wrapped into an
//! [`ObserverError`] whose prefix names the failing operation. The original
//! cause is always reachable through `source()`.

use thiserror::Error;

/// Reasons a [`RequestContext`](crate::observer::RequestContext) stopped a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("context canceled")]
    Cancelled,
}

/// Failure reported by an [`EventStore`](crate::observer::EventStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error returned by the MongoDB driver
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    /// Event could not be encoded as a BSON document
    #[error("failed to encode event document: {0}")]
    Encode(#[from] bson::ser::Error),

    /// The execution context ended before the round trip completed
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Store is not reachable (used by substitute stores)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`Observer`](crate::observer::Observer) operations
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("failed to connect to MongoDB: {0}")]
    Connect(#[source] StoreError),

    #[error("failed to insert event: {0}")]
    Insert(#[source] StoreError),

    #[error("failed to ping MongoDB: {0}")]
    Ping(#[source] StoreError),
}

impl ObserverError {
    /// The underlying store failure
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Connect(e) | Self::Insert(e) | Self::Ping(e) => e,
        }
    }
}
