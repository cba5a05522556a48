//! In-memory implementation of the host state boundary.
//!
//! Designed for unit and integration testing of the store layer; nothing is
//! persisted across process restarts.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::AccountStateStore;
use crate::error::{StoreError, StoreResult};
use crate::types::RecordMap;

/// In-memory account state, keyed by account name.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    accounts: RwLock<HashMap<String, RecordMap>>,
}

impl MemoryStateStore {
    /// Creates an empty state store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStateStore for MemoryStateStore {
    async fn load(&self, account: &str) -> StoreResult<RecordMap> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::State("state lock poisoned".to_string()))?;
        Ok(accounts.get(account).cloned().unwrap_or_default())
    }

    async fn persist(&self, account: &str, records: &RecordMap) -> StoreResult<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::State("state lock poisoned".to_string()))?;
        accounts.insert(account.to_string(), records.clone());
        Ok(())
    }
}
