//! Local store: records in host-managed per-account keyed state.

use std::sync::Arc;

use async_trait::async_trait;

use super::CredentialStore;
use crate::error::StoreResult;
use crate::filter::{self, Filter};
use crate::platform::AccountStateStore;
use crate::types::{CredentialRecord, RecordMap, StoreContext, StoreEntry};

/// Store backend over the host's per-account keyed state.
///
/// Every operation is one load, an in-memory mutation, and one atomic
/// persist; the host guarantees there is no intermediate crash window.
/// Values are stored exactly as given — this backend does not decode
/// token-shaped payloads.
pub struct LocalStore {
    state: Arc<dyn AccountStateStore>,
}

impl LocalStore {
    /// Creates a local store over `state`.
    #[must_use]
    pub fn new(state: Arc<dyn AccountStateStore>) -> Self {
        Self { state }
    }

    /// Reads the raw collection for the context's account.
    pub(crate) async fn records(&self, ctx: &StoreContext) -> StoreResult<RecordMap> {
        self.state.load(&ctx.account).await
    }

    /// Replaces the raw collection for the context's account.
    pub(crate) async fn replace(&self, ctx: &StoreContext, records: &RecordMap) -> StoreResult<()> {
        self.state.persist(&ctx.account, records).await
    }
}

#[async_trait]
impl CredentialStore for LocalStore {
    async fn save(
        &self,
        ctx: &StoreContext,
        records: &[CredentialRecord],
    ) -> StoreResult<Vec<String>> {
        let mut collection = self.state.load(&ctx.account).await?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            collection.insert(record.id.clone(), record.data.clone());
            ids.push(record.id.clone());
        }
        self.state.persist(&ctx.account, &collection).await?;
        Ok(ids)
    }

    async fn query(&self, ctx: &StoreContext, filter: &Filter) -> StoreResult<Vec<StoreEntry>> {
        let collection = self.state.load(&ctx.account).await?;
        let entries = collection
            .into_iter()
            .map(|(id, data)| StoreEntry { id, data })
            .collect();
        filter::resolve(filter, entries)
    }

    async fn delete(&self, ctx: &StoreContext, id: &str) -> StoreResult<bool> {
        let mut collection = self.state.load(&ctx.account).await?;
        if collection.remove(id).is_none() {
            return Ok(false);
        }
        self.state.persist(&ctx.account, &collection).await?;
        Ok(true)
    }

    async fn clear(&self, ctx: &StoreContext, _filter: &Filter) -> StoreResult<bool> {
        // The filter is accepted by the contract but not honored here; clear
        // wipes the whole per-account collection.
        self.state.persist(&ctx.account, &RecordMap::new()).await?;
        Ok(true)
    }
}
