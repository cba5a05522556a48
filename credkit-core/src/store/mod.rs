//! Store backend capability contract and the shipped implementations.

mod gdrive;
mod local;

pub use gdrive::{GoogleDriveStore, DRIVE_COLLECTION_FILE};
pub use local::LocalStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::filter::Filter;
use crate::types::{CredentialRecord, StoreContext, StoreEntry};

/// Capability implemented by every storage backend.
///
/// A backend persists opaque credential records keyed by id for the
/// account named in the call context. Record ids are assigned by the
/// orchestrator before the fan-out reaches a backend; backends never mint
/// ids themselves.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists `records`, returning the ids actually used, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be written.
    async fn save(
        &self,
        ctx: &StoreContext,
        records: &[CredentialRecord],
    ) -> StoreResult<Vec<String>>;

    /// Returns the records matching `filter`, resolved against this
    /// backend's full decoded record set.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be read or the
    /// filter expression is invalid.
    async fn query(&self, ctx: &StoreContext, filter: &Filter) -> StoreResult<Vec<StoreEntry>>;

    /// Deletes one record.
    ///
    /// `Ok(true)` iff the record existed and was removed; a missing id is
    /// `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be read or written.
    async fn delete(&self, ctx: &StoreContext, id: &str) -> StoreResult<bool>;

    /// Removes records in bulk.
    ///
    /// Both shipped backends ignore `filter` and wipe the whole per-account
    /// collection; callers must treat clear as destructive at full-backend
    /// granularity.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be written.
    async fn clear(&self, ctx: &StoreContext, filter: &Filter) -> StoreResult<bool>;
}
