//! Host platform boundary for the local store.
//!
//! The local store keeps records in host-managed per-account keyed state;
//! the host loads and persists the whole collection atomically at each call
//! boundary, so there is no intermediate crash window inside the store.

mod fs;
mod memory;

pub use fs::FsStateStore;
pub use memory::MemoryStateStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::RecordMap;

/// Host-managed keyed state, one credential collection per account.
///
/// Implementations MUST make `persist` atomic with respect to crashes:
/// after a call boundary the stored state is either the complete old
/// collection or the complete new one, never a partial write.
#[async_trait]
pub trait AccountStateStore: Send + Sync {
    /// Loads the full collection for `account`.
    ///
    /// An account with no stored state yields an empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot read the state.
    async fn load(&self, account: &str) -> StoreResult<RecordMap>;

    /// Atomically replaces the full collection for `account`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot persist the state.
    async fn persist(&self, account: &str, records: &RecordMap) -> StoreResult<()>;
}
