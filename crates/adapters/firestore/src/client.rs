//! Firestore REST client.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;

use firebridge_app::ports::DocumentWriter;
use firebridge_domain::document::DeviceUpdate;
use firebridge_domain::error::BridgeError;
use firebridge_domain::id::DocumentKey;

use crate::config::StoreConfig;
use crate::error::FirestoreError;
use crate::value::{Document, ListDocumentsResponse, encode_update};

/// Page size requested when listing the collection.
const PAGE_SIZE: u32 = 300;

/// HTTP client for one Firestore collection.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl FirestoreClient {
    /// Build a client with bearer auth and the configured timeout.
    ///
    /// An empty access token sends no `Authorization` header (emulator).
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::InvalidToken`] or
    /// [`FirestoreError::Transport`] if the client cannot be built.
    pub fn new(config: StoreConfig) -> Result<Self, FirestoreError> {
        let mut headers = HeaderMap::new();
        let token = config.access_token.expose_secret();
        if !token.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| FirestoreError::InvalidToken)?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("firebridge/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Merge `update` into the document at `key` in a single commit.
    ///
    /// The update mask limits the write to the fields in the update, so any
    /// other field on the document survives; `updatedAt` is set by the server.
    ///
    /// # Errors
    ///
    /// [`FirestoreError::Status`] if Firestore rejects the commit.
    pub async fn commit_update(
        &self,
        key: &DocumentKey,
        update: &DeviceUpdate,
    ) -> Result<(), FirestoreError> {
        let body = json!({
            "writes": [{
                "update": {
                    "name": self.config.document_name(key),
                    "fields": encode_update(update),
                },
                "updateMask": { "fieldPaths": DeviceUpdate::field_names() },
                "updateTransforms": [{
                    "fieldPath": "updatedAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });
        let url = self.config.commit_url();
        tracing::debug!(%url, %key, "POST");

        let response = self.http.post(url).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// List every document in the collection, following pagination.
    ///
    /// # Errors
    ///
    /// [`FirestoreError::Status`] if any page request fails.
    pub async fn list_documents(&self) -> Result<Vec<Document>, FirestoreError> {
        let url = self.config.collection_url();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = check_status(request.send().await?).await?;
            let page: ListDocumentsResponse = response.json().await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::trace!(count = documents.len(), "listed documents");
        Ok(documents)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FirestoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FirestoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl DocumentWriter for FirestoreClient {
    async fn upsert(&self, key: &DocumentKey, update: DeviceUpdate) -> Result<(), BridgeError> {
        self.commit_update(key, &update)
            .await
            .map_err(|err| err.into_write(key))
    }
}
