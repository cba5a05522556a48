//! Filesystem implementation of the host state boundary.

use std::path::PathBuf;

use async_trait::async_trait;

use super::AccountStateStore;
use crate::error::{StoreError, StoreResult};
use crate::types::RecordMap;

/// One JSON file per account under a root directory.
///
/// Writes use the write-to-temp-then-rename pattern, so the on-disk state is
/// always either the complete old collection or the complete new one.
#[derive(Debug)]
pub struct FsStateStore {
    root: PathBuf,
}

impl FsStateStore {
    /// Creates a store rooted at `root`. The directory is created on first
    /// persist if it does not exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn account_path(&self, account: &str) -> StoreResult<PathBuf> {
        let filename_safe = !account.is_empty()
            && !account.starts_with('.')
            && account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !filename_safe {
            return Err(StoreError::State(format!(
                "account name '{account}' is not filename-safe"
            )));
        }
        Ok(self.root.join(format!("{account}.json")))
    }
}

#[async_trait]
impl AccountStateStore for FsStateStore {
    async fn load(&self, account: &str) -> StoreResult<RecordMap> {
        let path = self.account_path(account)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RecordMap::new());
            }
            Err(err) => {
                return Err(StoreError::State(format!(
                    "read {}: {err}",
                    path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map_err(|err| {
            StoreError::Serialization(format!("account state is not a JSON object: {err}"))
        })
    }

    async fn persist(&self, account: &str, records: &RecordMap) -> StoreResult<()> {
        let path = self.account_path(account)?;
        std::fs::create_dir_all(&self.root)
            .map_err(|err| StoreError::State(format!("create {}: {err}", self.root.display())))?;
        let bytes = serde_json::to_vec(records)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes)
            .map_err(|err| StoreError::State(format!("write {}: {err}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|err| StoreError::State(format!("rename {}: {err}", tmp.display())))?;
        Ok(())
    }
}
