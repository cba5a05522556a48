//! Multi-backend credential store orchestration.
//!
//! This crate lets a caller save, query, delete, and clear opaque credential
//! records across one or more independently-implemented storage backends,
//! using a uniform filter language and per-backend failure isolation.
//!
//! # Architecture
//!
//! The system has four layers:
//!
//! 1. **Store backends** — polymorphic [`CredentialStore`] implementations
//!    over one physical medium each: [`LocalStore`] (host-managed per-account
//!    keyed state) and [`GoogleDriveStore`] (a single JSON document in a
//!    cloud drive file).
//!
//! 2. **Filter resolver** — a tagged [`Filter`] expression resolved
//!    identically inside every backend against that backend's full decoded
//!    record set.
//!
//! 3. **Data manager** — the public-facing [`DataManager`] orchestrator;
//!    resolves which backends a call targets, fans the call out sequentially,
//!    aggregates results in selector order, and isolates per-backend
//!    failures.
//!
//! 4. **Sync reconciler** — [`SyncReconciler`] diffs the local store against
//!    the remote document store and merges remote-only records into the
//!    local store.
//!
//! # Host integration
//!
//! The crate depends on host-provided capabilities through traits:
//!
//! - [`AccountStateStore`] — keyed per-account state for the local store
//! - [`CredentialCodec`] — decodes token-shaped values from the remote store
//! - [`SyncConfirmer`] — caller confirmation before a sync merge
//!
//! [`AccountStateStore`]: platform::AccountStateStore

pub mod codec;
pub mod error;
pub mod filter;
mod http_request;
pub mod manager;
pub mod platform;
pub mod store;
pub mod sync;
pub mod types;

pub use codec::{CredentialCodec, JwtCodec};
pub use error::{DataManagerError, StoreError, StoreResult, SyncError};
pub use filter::Filter;
pub use manager::DataManager;
pub use store::{CredentialStore, GoogleDriveStore, LocalStore, DRIVE_COLLECTION_FILE};
pub use sync::{SyncConfirmer, SyncReconciler};
pub use types::{
    ClearResult, CredentialRecord, DeleteResult, OneOrMany, QueryMetadata, QueryOptions,
    QueryResult, RecordMap, SaveRecord, SaveResult, StoreContext, StoreEntry, StoreOptions,
    StoreSelector,
};
