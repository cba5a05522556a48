//! Data manager: store selection, sequential fan-out, aggregation, and
//! per-backend failure isolation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::{DataManagerError, StoreResult};
use crate::filter::Filter;
use crate::store::CredentialStore;
use crate::types::{
    ClearResult, CredentialRecord, DeleteResult, OneOrMany, QueryMetadata, QueryOptions,
    QueryResult, SaveRecord, SaveResult, StoreContext, StoreOptions, StoreSelector,
};

/// The public-facing orchestrator over the registered store backends.
///
/// Constructed with a fixed name → backend registry, immutable for the
/// manager's lifetime. Fan-outs run sequentially in selector order and the
/// aggregate result preserves that order — selection order, not completion
/// order. A backend failure is logged and its contribution omitted while
/// sibling backends proceed; the only fatal condition is a selected name
/// missing from the registry, raised before any backend is touched.
pub struct DataManager {
    stores: BTreeMap<String, Arc<dyn CredentialStore>>,
}

impl DataManager {
    /// Creates a manager over a fixed store registry.
    ///
    /// When the caller omits a selector, the fan-out covers every
    /// registered store in registry order (sorted by name), keeping the
    /// default aggregate order deterministic.
    #[must_use]
    pub fn new(stores: BTreeMap<String, Arc<dyn CredentialStore>>) -> Self {
        Self { stores }
    }

    /// Names of the registered stores, in registry order.
    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Resolves a selector to (name, store) pairs in selector order.
    ///
    /// Every name is validated before any backend is touched, so an unknown
    /// name cannot leave partial effects across the other selected
    /// backends.
    fn resolve(
        &self,
        selector: Option<&StoreSelector>,
    ) -> Result<Vec<(String, Arc<dyn CredentialStore>)>, DataManagerError> {
        match selector {
            None => Ok(self
                .stores
                .iter()
                .map(|(name, store)| (name.clone(), Arc::clone(store)))
                .collect()),
            Some(selector) => selector
                .iter()
                .map(|name| {
                    self.stores
                        .get(name)
                        .map(|store| (name.clone(), Arc::clone(store)))
                        .ok_or_else(|| DataManagerError::StoreNotFound { name: name.clone() })
                })
                .collect(),
        }
    }

    /// Saves `records` to every selected backend, sequentially in selector
    /// order.
    ///
    /// Records without an id receive one freshly generated identifier here
    /// — never inside a backend — and the same id is used for every backend
    /// in the fan-out, so one logical record written to N backends shares
    /// one id.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::StoreNotFound`] when a selected name is not
    /// registered. Backend write failures are logged and omitted from the
    /// aggregate instead.
    #[tracing::instrument(skip_all, fields(account = %ctx.account))]
    pub async fn save(
        &self,
        ctx: &StoreContext,
        records: Vec<SaveRecord>,
        options: &StoreOptions,
    ) -> Result<Vec<SaveResult>, DataManagerError> {
        let selected = self.resolve(options.store.as_ref())?;
        let records: Vec<CredentialRecord> = records
            .into_iter()
            .map(|record| CredentialRecord {
                id: record.id.unwrap_or_else(generate_record_id),
                data: record.data,
            })
            .collect();

        let mut results = Vec::new();
        for (name, store) in selected {
            match store.save(ctx, &records).await {
                Ok(ids) => results.extend(ids.into_iter().map(|id| SaveResult {
                    id,
                    store: name.clone(),
                })),
                Err(error) => {
                    warn!(store = %name, %error, "save failed; omitting store from the aggregate");
                }
            }
        }
        Ok(results)
    }

    /// Queries every selected backend and concatenates the results in
    /// selection order, with no cross-backend de-duplication or sorting.
    ///
    /// `options.return_store` (default `true`) controls whether each
    /// result's metadata names its producing backend.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::StoreNotFound`] when a selected name is not
    /// registered. Backend query failures are logged and omitted from the
    /// aggregate instead.
    #[tracing::instrument(skip_all, fields(account = %ctx.account))]
    pub async fn query(
        &self,
        ctx: &StoreContext,
        filter: &Filter,
        options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, DataManagerError> {
        let selected = self.resolve(options.store.as_ref())?;
        let return_store = options.return_store.unwrap_or(true);

        let mut results = Vec::new();
        for (name, store) in selected {
            match store.query(ctx, filter).await {
                Ok(entries) => results.extend(entries.into_iter().map(|entry| QueryResult {
                    data: entry.data,
                    metadata: QueryMetadata {
                        id: entry.id,
                        store: return_store.then(|| name.clone()),
                    },
                })),
                Err(error) => {
                    warn!(store = %name, %error, "query failed; omitting store from the aggregate");
                }
            }
        }
        Ok(results)
    }

    /// Deletes the given ids from every selected backend.
    ///
    /// Emits one result per backend regardless of how many ids were
    /// requested: `removed` is true iff every requested id existed in that
    /// backend and was removed.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::StoreNotFound`] when a selected name is not
    /// registered. Backend delete failures are logged and omitted from the
    /// aggregate instead.
    #[tracing::instrument(skip_all, fields(account = %ctx.account))]
    pub async fn delete(
        &self,
        ctx: &StoreContext,
        ids: &OneOrMany<String>,
        options: &StoreOptions,
    ) -> Result<Vec<DeleteResult>, DataManagerError> {
        let selected = self.resolve(options.store.as_ref())?;

        let mut results = Vec::new();
        for (name, store) in selected {
            match delete_all(store.as_ref(), ctx, ids).await {
                Ok(removed) => results.push(DeleteResult {
                    id: ids.clone(),
                    removed,
                    store: name,
                }),
                Err(error) => {
                    warn!(store = %name, %error, "delete failed; omitting store from the aggregate");
                }
            }
        }
        Ok(results)
    }

    /// Clears every selected backend.
    ///
    /// The filter is passed through to each backend; both shipped backends
    /// ignore it and wipe their whole per-account collection (see the store
    /// contract), so this is destructive at full-backend granularity.
    ///
    /// # Errors
    ///
    /// [`DataManagerError::StoreNotFound`] when a selected name is not
    /// registered. Backend clear failures are logged and omitted from the
    /// aggregate instead.
    #[tracing::instrument(skip_all, fields(account = %ctx.account))]
    pub async fn clear(
        &self,
        ctx: &StoreContext,
        filter: &Filter,
        options: &StoreOptions,
    ) -> Result<Vec<ClearResult>, DataManagerError> {
        let selected = self.resolve(options.store.as_ref())?;

        let mut results = Vec::new();
        for (name, store) in selected {
            match store.clear(ctx, filter).await {
                Ok(removed) => results.push(ClearResult {
                    removed,
                    store: name,
                }),
                Err(error) => {
                    warn!(store = %name, %error, "clear failed; omitting store from the aggregate");
                }
            }
        }
        Ok(results)
    }
}

/// Deletes each id in turn; true only when every id existed and was
/// removed.
async fn delete_all(
    store: &dyn CredentialStore,
    ctx: &StoreContext,
    ids: &OneOrMany<String>,
) -> StoreResult<bool> {
    let mut removed = true;
    for id in ids.iter() {
        removed &= store.delete(ctx, id).await?;
    }
    Ok(removed)
}

/// Generates a fresh globally-random record identifier.
fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}
