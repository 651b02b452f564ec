//! HTTP client for the Notion databases and pages endpoints.
//!
//! Wraps `GET /v1/databases/{id}` (schema) and `POST /v1/pages` (record
//! creation) using [`reqwest`]. Nothing is retried here.

use async_trait::async_trait;
use formgate_core::{ColumnSchema, ConvertedRecord, RecordStore, SchemaSource, StoreError};

use crate::wire::{CreatePageRequest, DatabaseResponse, ErrorBody};

/// Public Notion API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// API version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Errors from the Notion API layer.
#[derive(Debug, thiserror::Error)]
pub enum NotionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Notion answered with its structured error object.
    #[error("Notion API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A non-2xx response without a recognisable error object.
    #[error("Notion returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl From<NotionApiError> for StoreError {
    fn from(err: NotionApiError) -> Self {
        match err {
            NotionApiError::Api { code, message, .. } => StoreError::Api { code, message },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Classify a failed response from its status and body text.
pub fn api_error(status: u16, body: &str) -> NotionApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { code, message }) => NotionApiError::Api {
            status,
            code,
            message,
        },
        Err(_) => NotionApiError::Http {
            status,
            body: body.to_string(),
        },
    }
}

/// Authenticated client for one Notion integration.
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    /// Create a client for the public API with an integration token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_BASE_URL, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`] and base URL.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retrieve a database object, including its property schema.
    pub async fn retrieve_database(
        &self,
        database_id: &str,
    ) -> Result<DatabaseResponse, NotionApiError> {
        let response = self
            .client
            .get(format!("{}/v1/databases/{}", self.base_url, database_id))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.json::<DatabaseResponse>().await?)
    }

    /// Create a page in `database_id` from a converted record.
    pub async fn create_page(
        &self,
        database_id: &str,
        record: &ConvertedRecord,
    ) -> Result<(), NotionApiError> {
        let response = self
            .client
            .post(format!("{}/v1/pages", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&CreatePageRequest::new(database_id, record))
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, NotionApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(api_error(status.as_u16(), &body))
    }
}

#[async_trait]
impl SchemaSource for NotionClient {
    async fn fetch_schema(&self, database_id: &str) -> Result<ColumnSchema, StoreError> {
        let database = self.retrieve_database(database_id).await.map_err(|e| {
            tracing::warn!(database_id, error = %e, "Failed to retrieve Notion database");
            StoreError::from(e)
        })?;
        Ok(database.into_schema())
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn create(&self, database_id: &str, record: &ConvertedRecord) -> Result<(), StoreError> {
        self.create_page(database_id, record).await.map_err(|e| {
            tracing::warn!(database_id, error = %e, "Failed to create Notion page");
            StoreError::from(e)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
