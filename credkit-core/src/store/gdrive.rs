//! Remote document store backed by the Google Drive files API.
//!
//! The entire collection for one account lives in a single named JSON file;
//! every mutation is a full download, an in-memory modification, and a full
//! re-upload. There is no partial-write or append primitive, no
//! optimistic-concurrency token, and no versioning: two overlapping
//! operations against the same file can race and the later upload wins.
//!
//! Missing-file policy: query, delete, and clear treat a missing collection
//! file as an empty collection; `save` creates the file empty before the
//! first write.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::codec::CredentialCodec;
use crate::error::{StoreError, StoreResult};
use crate::filter::{self, Filter};
use crate::http_request::Request;
use crate::types::{CredentialRecord, RecordMap, StoreContext, StoreEntry};

/// Name of the drive file holding the credential collection.
pub const DRIVE_COLLECTION_FILE: &str = "credential-collection.json";

const API_BASE: &str = "https://www.googleapis.com";

/// Boundary used for the multipart upload body.
const MULTIPART_BOUNDARY: &str = "314159265358979323846";

/// Remote document store over a single cloud drive file.
///
/// [`configure`](Self::configure) must succeed before any operation; an
/// unconfigured or invalidated store fails every call with
/// [`StoreError::NotConfigured`].
///
/// On read, token-shaped values (JSON strings) are decoded through the
/// credential codec before filtering or returning, so callers never see raw
/// tokens from this backend.
pub struct GoogleDriveStore {
    http: Request,
    base_url: String,
    file_name: String,
    codec: Arc<dyn CredentialCodec>,
    access_token: RwLock<Option<String>>,
}

/// Response shape of the drive file listing endpoint.
#[derive(Deserialize)]
struct FileListing {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Deserialize)]
struct FileRef {
    id: String,
}

/// Response shape of the multipart upload endpoint.
#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

impl GoogleDriveStore {
    /// Creates an unconfigured store that decodes tokens through `codec`.
    #[must_use]
    pub fn new(codec: Arc<dyn CredentialCodec>) -> Self {
        Self {
            http: Request::new(),
            base_url: API_BASE.to_string(),
            file_name: DRIVE_COLLECTION_FILE.to_string(),
            codec,
            access_token: RwLock::new(None),
        }
    }

    /// Validates `access_token` with the drive service and stores it for
    /// subsequent operations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConfigured`] when the service rejects the
    /// token; the store then keeps failing every operation until a later
    /// `configure` succeeds.
    pub async fn configure(&self, access_token: &str) -> StoreResult<()> {
        let url = format!("{}/oauth2/v3/tokeninfo", self.base_url);
        let outcome = self
            .http
            .handle(self.http.get(&url).query(&[("access_token", access_token)]))
            .await;
        match outcome {
            Ok(_) => {
                *self.access_token.write().await = Some(access_token.to_string());
                Ok(())
            }
            Err(err) => {
                *self.access_token.write().await = None;
                Err(StoreError::NotConfigured {
                    reason: format!("token validation failed: {err}"),
                })
            }
        }
    }

    async fn token(&self) -> StoreResult<String> {
        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::NotConfigured {
                reason: "configure must succeed before the drive store is used".to_string(),
            })
    }

    /// Finds the collection file's id, if the file exists.
    async fn find_file_id(&self, token: &str) -> StoreResult<Option<String>> {
        let url = format!("{}/drive/v3/files", self.base_url);
        let query = format!("name = '{}'", self.file_name);
        let response = self
            .http
            .handle(
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("q", query.as_str()), ("fields", "files(id, name)")]),
            )
            .await?;
        let listing: FileListing = response.json().await?;
        Ok(listing.files.into_iter().next().map(|file| file.id))
    }

    /// Downloads the raw collection; `Ok(None)` when the file does not
    /// exist. Values are returned exactly as stored, tokens included.
    pub(crate) async fn collection(&self, _ctx: &StoreContext) -> StoreResult<Option<RecordMap>> {
        let token = self.token().await?;
        let Some(file_id) = self.find_file_id(&token).await? else {
            return Ok(None);
        };
        let url = format!("{}/drive/v3/files/{file_id}", self.base_url);
        let response = self
            .http
            .handle(self.http.get(&url).bearer_auth(&token).query(&[("alt", "media")]))
            .await?;
        let body = response.text().await?;
        let collection = serde_json::from_str(&body).map_err(|err| {
            StoreError::Serialization(format!("collection file is not a JSON object: {err}"))
        })?;
        Ok(Some(collection))
    }

    /// Uploads the full serialized collection, returning the drive file id.
    pub(crate) async fn upload(&self, collection: &RecordMap) -> StoreResult<String> {
        let token = self.token().await?;
        let content = serde_json::to_string(collection)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;

        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id",
            self.base_url
        );
        let metadata =
            serde_json::json!({ "name": self.file_name, "mimeType": "application/json" });
        let response = self
            .http
            .handle(
                self.http
                    .post(&url)
                    .bearer_auth(&token)
                    .header(
                        "Content-Type",
                        format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
                    )
                    .body(multipart_body(&metadata.to_string(), &content)),
            )
            .await?;
        let uploaded: UploadedFile = response.json().await?;
        Ok(uploaded.id)
    }

    /// Decodes token-shaped values and wraps the collection as entries.
    fn decode_entries(&self, collection: RecordMap) -> StoreResult<Vec<StoreEntry>> {
        collection
            .into_iter()
            .map(|(id, value)| {
                let data = match value {
                    Value::String(token) => self.codec.decode(&token)?,
                    structured => structured,
                };
                Ok(StoreEntry { id, data })
            })
            .collect()
    }
}

/// Builds the two-part `multipart/related` body: a JSON metadata part and
/// the full serialized collection.
fn multipart_body(metadata: &str, content: &str) -> String {
    let delimiter = format!("\r\n--{MULTIPART_BOUNDARY}\r\n");
    let close = format!("\r\n--{MULTIPART_BOUNDARY}--");
    format!(
        "{delimiter}Content-Type: application/json\r\n\r\n{metadata}\
         {delimiter}Content-Type: application/json\r\n\r\n{content}{close}"
    )
}

#[async_trait]
impl CredentialStore for GoogleDriveStore {
    async fn save(
        &self,
        ctx: &StoreContext,
        records: &[CredentialRecord],
    ) -> StoreResult<Vec<String>> {
        let mut collection = match self.collection(ctx).await? {
            Some(existing) => existing,
            None => {
                // The file must exist before the first write.
                self.upload(&RecordMap::new()).await?;
                RecordMap::new()
            }
        };
        for record in records {
            collection.insert(record.id.clone(), record.data.clone());
        }
        self.upload(&collection).await?;
        Ok(records.iter().map(|record| record.id.clone()).collect())
    }

    async fn query(&self, ctx: &StoreContext, filter: &Filter) -> StoreResult<Vec<StoreEntry>> {
        let Some(collection) = self.collection(ctx).await? else {
            tracing::debug!(file = %self.file_name, "collection file missing; treating as empty");
            return Ok(Vec::new());
        };
        let entries = self.decode_entries(collection)?;
        filter::resolve(filter, entries)
    }

    async fn delete(&self, ctx: &StoreContext, id: &str) -> StoreResult<bool> {
        let Some(mut collection) = self.collection(ctx).await? else {
            return Ok(false);
        };
        if collection.remove(id).is_none() {
            return Ok(false);
        }
        self.upload(&collection).await?;
        Ok(true)
    }

    async fn clear(&self, _ctx: &StoreContext, _filter: &Filter) -> StoreResult<bool> {
        // The filter is ignored outright: clear always wipes the whole
        // collection file.
        self.upload(&RecordMap::new()).await?;
        Ok(true)
    }
}

#[cfg(test)]
impl GoogleDriveStore {
    /// Creates a store pointed at a custom base URL (for testing).
    #[must_use]
    pub(crate) fn with_base_url(base_url: &str, codec: Arc<dyn CredentialCodec>) -> Self {
        Self {
            http: Request::new(),
            base_url: base_url.to_string(),
            file_name: DRIVE_COLLECTION_FILE.to_string(),
            codec,
            access_token: RwLock::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JwtCodec;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn encode_jwt(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    fn ctx() -> StoreContext {
        StoreContext::new("0xabc")
    }

    async fn configured_store(server: &mut ServerGuard) -> GoogleDriveStore {
        server
            .mock("GET", "/oauth2/v3/tokeninfo")
            .match_query(Matcher::UrlEncoded(
                "access_token".into(),
                "test-token".into(),
            ))
            .with_status(200)
            .with_body(r#"{"aud":"clientid","scope":"drive.file"}"#)
            .create_async()
            .await;

        let store = GoogleDriveStore::with_base_url(&server.url(), Arc::new(JwtCodec));
        store.configure("test-token").await.unwrap();
        store
    }

    fn mock_file_listing(server: &mut ServerGuard, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "name = 'credential-collection.json'".into()),
                Matcher::UrlEncoded("fields".into(), "files(id, name)".into()),
            ]))
            .with_status(200)
            .with_body(body)
    }

    fn mock_download(server: &mut ServerGuard, file_id: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/drive/v3/files/{file_id}").as_str())
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(200)
            .with_body(body)
    }

    fn mock_upload(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/upload/drive/v3/files?uploadType=multipart&fields=id")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/related.*".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"id":"file-1"}"#)
    }

    #[tokio::test]
    async fn configure_rejects_an_invalid_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/oauth2/v3/tokeninfo")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let store = GoogleDriveStore::with_base_url(&server.url(), Arc::new(JwtCodec));
        let err = store.configure("bad-token").await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured { .. }));

        // The store stays unusable afterwards.
        let err = store.query(&ctx(), &Filter::None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn unconfigured_store_fails_every_operation() {
        let store = GoogleDriveStore::with_base_url("http://127.0.0.1:1", Arc::new(JwtCodec));
        let err = store.delete(&ctx(), "vc-1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn query_decodes_token_shaped_values() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;

        let payload = json!({ "type": ["VerifiableCredential"], "issuer": "did:example:1" });
        let collection = json!({
            "vc-token": encode_jwt(&payload),
            "vc-object": { "type": ["Passport"] },
        });
        mock_file_listing(
            &mut server,
            r#"{"files":[{"id":"file-1","name":"credential-collection.json"}]}"#,
        )
        .create_async()
        .await;
        mock_download(&mut server, "file-1", &collection.to_string())
            .create_async()
            .await;

        let mut entries = store.query(&ctx(), &Filter::None).await.unwrap();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, "vc-token");
        assert_eq!(entries[1].data, payload);
        assert_eq!(entries[0].data, json!({ "type": ["Passport"] }));
    }

    #[tokio::test]
    async fn query_treats_a_missing_file_as_empty() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        mock_file_listing(&mut server, r#"{"files":[]}"#)
            .create_async()
            .await;

        let entries = store.query(&ctx(), &Filter::None).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn save_creates_the_file_before_the_first_write() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        mock_file_listing(&mut server, r#"{"files":[]}"#)
            .create_async()
            .await;
        let upload = mock_upload(&mut server).expect(2).create_async().await;

        let records = [CredentialRecord {
            id: "vc-1".to_string(),
            data: json!({ "type": ["Passport"] }),
        }];
        let ids = store.save(&ctx(), &records).await.unwrap();

        assert_eq!(ids, vec!["vc-1".to_string()]);
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn save_merges_into_the_existing_collection() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        mock_file_listing(
            &mut server,
            r#"{"files":[{"id":"file-1","name":"credential-collection.json"}]}"#,
        )
        .create_async()
        .await;
        mock_download(&mut server, "file-1", r#"{"vc-old":{"a":1}}"#)
            .create_async()
            .await;
        let upload = mock_upload(&mut server)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("vc-old".to_string()),
                Matcher::Regex("vc-new".to_string()),
            ]))
            .create_async()
            .await;

        let records = [CredentialRecord {
            id: "vc-new".to_string(),
            data: json!({ "b": 2 }),
        }];
        store.save(&ctx(), &records).await.unwrap();
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn delete_of_a_missing_id_is_false_without_an_upload() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        mock_file_listing(
            &mut server,
            r#"{"files":[{"id":"file-1","name":"credential-collection.json"}]}"#,
        )
        .create_async()
        .await;
        mock_download(&mut server, "file-1", r#"{"vc-1":{"a":1}}"#)
            .create_async()
            .await;
        let upload = mock_upload(&mut server).expect(0).create_async().await;

        assert!(!store.delete(&ctx(), "vc-9").await.unwrap());
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn delete_removes_the_record_and_reuploads() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        mock_file_listing(
            &mut server,
            r#"{"files":[{"id":"file-1","name":"credential-collection.json"}]}"#,
        )
        .create_async()
        .await;
        mock_download(&mut server, "file-1", r#"{"vc-1":{"a":1},"vc-2":{"b":2}}"#)
            .create_async()
            .await;
        let upload = mock_upload(&mut server)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("vc-2".to_string()),
            ]))
            .create_async()
            .await;

        assert!(store.delete(&ctx(), "vc-1").await.unwrap());
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn clear_wipes_the_collection_even_with_a_filter() {
        let mut server = Server::new_async().await;
        let store = configured_store(&mut server).await;
        let upload = mock_upload(&mut server)
            .match_body(Matcher::Regex(r"\r\n\{\}\r\n--".to_string()))
            .create_async()
            .await;

        // A filter that would only match a subset still wipes everything.
        let removed = store
            .clear(&ctx(), &Filter::ByType("Passport".to_string()))
            .await
            .unwrap();
        assert!(removed);
        upload.assert_async().await;
    }
}
