//! One-directional reconciliation of the local store from the remote
//! document store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::SyncError;
use crate::store::{GoogleDriveStore, LocalStore};
use crate::types::StoreContext;

/// Caller hook deciding whether a computed difference may be merged.
///
/// The host surfaces the remote-only ids to the user — a confirmation
/// dialog in wallet environments — and reports the decision.
#[async_trait]
pub trait SyncConfirmer: Send + Sync {
    /// Returns whether the listed remote-only ids may be merged locally.
    async fn confirm(&self, missing_ids: &[String]) -> bool;
}

/// Diffs the local store against the remote document store, merges the
/// remote-only records into the local store, and mirrors the merged
/// collection back to the remote file.
///
/// The merge is one-directional enrichment: local-only records are never
/// deleted. Merged values are copied exactly as stored remotely — tokens
/// stay tokens — so the local collection mirrors the remote representation.
pub struct SyncReconciler {
    local: Arc<LocalStore>,
    remote: Arc<GoogleDriveStore>,
}

impl SyncReconciler {
    /// Creates a reconciler over the two stores.
    #[must_use]
    pub fn new(local: Arc<LocalStore>, remote: Arc<GoogleDriveStore>) -> Self {
        Self { local, remote }
    }

    /// Runs one reconciliation pass.
    ///
    /// Returns `Ok(false)` without mutating either store when the confirmer
    /// declines, `Ok(true)` after a merge (or when there was nothing to
    /// merge).
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteMissing`] when the remote collection file does
    /// not exist — unlike plain store operations, sync does not treat a
    /// missing file as an empty collection. Store failures on either side
    /// surface as [`SyncError::Store`].
    #[tracing::instrument(skip_all, fields(account = %ctx.account))]
    pub async fn sync(
        &self,
        ctx: &StoreContext,
        confirmer: &dyn SyncConfirmer,
    ) -> Result<bool, SyncError> {
        let remote_records = self
            .remote
            .collection(ctx)
            .await?
            .ok_or_else(|| SyncError::RemoteMissing("collection file not found".to_string()))?;
        let local_records = self.local.records(ctx).await?;

        let missing: Vec<String> = remote_records
            .keys()
            .filter(|id| !local_records.contains_key(*id))
            .cloned()
            .collect();
        if missing.is_empty() {
            info!(account = %ctx.account, "collections already reconciled");
            return Ok(true);
        }

        if !confirmer.confirm(&missing).await {
            return Ok(false);
        }

        let mut merged = local_records;
        for id in &missing {
            if let Some(value) = remote_records.get(id) {
                merged.insert(id.clone(), value.clone());
            }
        }
        self.local.replace(ctx, &merged).await?;
        self.remote.upload(&merged).await?;
        info!(
            account = %ctx.account,
            merged = missing.len(),
            "merged remote records into the local store"
        );
        Ok(true)
    }
}
