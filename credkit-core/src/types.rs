//! Shared data model for orchestrator requests, results, and store records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A backend's full collection for one account, keyed by record id.
///
/// `serde_json::Map` keeps keys sorted, so iteration order is deterministic
/// across loads and uploads.
pub type RecordMap = serde_json::Map<String, Value>;

/// Request-scoped context threaded through every orchestrator and store
/// call.
///
/// Carries the account whose collection is being operated on, replacing the
/// ambient "current account" global of host wallet environments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContext {
    /// Account identifier; scopes each backend's keyed state.
    pub account: String,
}

impl StoreContext {
    /// Creates a context for `account`.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

/// One credential record: a stable identifier plus an opaque payload.
///
/// An id is globally meaningful only within one backend; there is no
/// cross-backend identity guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Stable identifier within a backend.
    pub id: String,
    /// Opaque credential payload — a structured object or a compact token
    /// serialized as a JSON string.
    pub data: Value,
}

/// Save input: an optional caller-chosen id plus the payload.
///
/// Records without an id receive one freshly generated identifier from the
/// orchestrator; backends never assign ids themselves, so one logical record
/// written to N backends shares one id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRecord {
    /// Caller-chosen identifier, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Opaque credential payload.
    pub data: Value,
}

/// One record as returned by a backend query, before orchestrator wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    /// Record identifier within the producing backend.
    pub id: String,
    /// Decoded credential payload.
    pub data: Value,
}

/// Either a single value or an ordered list.
///
/// Matches the wire shapes `"local"` and `["local", "gdrive"]`. Duplicates
/// in a list are not de-duplicated; repeating a name fans the call out to
/// that backend twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// An ordered list.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Iterates the values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(values) => values.iter(),
        }
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// True when the list form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store selector: one name or an ordered list of names.
///
/// An omitted selector (`None` at the call site) means every registered
/// store.
pub type StoreSelector = OneOrMany<String>;

/// Options for save, delete, and clear.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Backend selection; omitted means all registered stores.
    #[serde(default)]
    pub store: Option<StoreSelector>,
}

/// Options for query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Backend selection; omitted means all registered stores.
    #[serde(default)]
    pub store: Option<StoreSelector>,
    /// Whether each result's metadata names its producing backend.
    /// Defaults to `true`.
    #[serde(default)]
    pub return_store: Option<bool>,
}

/// One record written to one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveResult {
    /// Identifier the backend stored the record under.
    pub id: String,
    /// Name of the backend that was written.
    pub store: String,
}

/// Provenance attached to each query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMetadata {
    /// Record identifier within the producing backend.
    pub id: String,
    /// Producing backend name; omitted when the caller suppressed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// One record returned from one backend by a query fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Decoded credential payload.
    pub data: Value,
    /// Identifier and provenance.
    pub metadata: QueryMetadata,
}

/// Per-backend outcome of a delete fan-out.
///
/// One result per backend regardless of how many ids were requested:
/// aggregation is backend-level, not per-id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// The requested id selection, echoed back.
    pub id: OneOrMany<String>,
    /// True iff every requested id existed in this backend and was removed.
    pub removed: bool,
    /// Name of the backend.
    pub store: String,
}

/// Per-backend outcome of a clear fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearResult {
    /// Whether the backend reported its collection cleared.
    pub removed: bool,
    /// Name of the backend.
    pub store: String,
}
