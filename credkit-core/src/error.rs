//! Error types for store backends, the orchestrator, and the sync
//! reconciler.

use thiserror::Error;

/// Result alias for individual store backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a single store backend.
///
/// Inside a multi-store fan-out these are caught by the orchestrator, logged,
/// and the failing backend is omitted from the aggregate; sibling backends
/// proceed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote store was used before a valid access token was configured,
    /// or token validation failed.
    #[error("store not configured: {reason}")]
    NotConfigured {
        /// Why the store considers itself unconfigured.
        reason: String,
    },

    /// A network round-trip to a remote backend failed.
    #[error("network error for {url} (status {status:?}): {error}")]
    Network {
        /// Request URL.
        url: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Failure detail.
        error: String,
    },

    /// A `byPath` filter expression failed to parse.
    #[error("invalid filter expression '{expression}': {reason}")]
    InvalidFilter {
        /// The offending expression.
        expression: String,
        /// Parser detail.
        reason: String,
    },

    /// Encoding or decoding stored data failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A token-shaped value could not be decoded by the credential codec.
    #[error("credential decode failed: {0}")]
    Codec(String),

    /// The host state backend failed to load or persist account state.
    #[error("state store error: {0}")]
    State(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            status: err.status().map(|status| status.as_u16()),
            error: err.to_string(),
        }
    }
}

/// Fatal orchestrator errors.
///
/// A selected store name missing from the registry is the only condition
/// that aborts a multi-store call; it is raised while resolving the
/// selector, before any backend is touched. All backend-level failures are
/// recovered locally instead.
#[derive(Debug, Error)]
pub enum DataManagerError {
    /// A selected store name is not present in the registry.
    #[error("store '{name}' is not registered")]
    StoreNotFound {
        /// The unknown name as given in the selector.
        name: String,
    },
}

/// Errors from the local/remote sync reconciler.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote collection file does not exist.
    ///
    /// Unlike plain store operations, sync does not treat a missing remote
    /// file as an empty collection.
    #[error("remote collection is unavailable: {0}")]
    RemoteMissing(String),

    /// A store operation inside the reconciler failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
