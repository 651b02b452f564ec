#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use formgate_api::config::{CorsConfig, NotionConfig, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use formgate_api::router::build_app_router;
use formgate_api::state::AppState;
use formgate_core::{
    Attachment, BlobStore, Column, ColumnSchema, ConvertedRecord, FormService, RecordStore,
    SchemaSource, StoreError, TypeRegistry,
};

pub const DATABASE_ID: &str = "db-test";
pub const FILES_BASE_URL: &str = "https://files.example.com";
const BOUNDARY: &str = "formgate-test-boundary";

/// Build a test `ServerConfig` with the default CORS values.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        notion: NotionConfig {
            database_id: DATABASE_ID.to_string(),
            integration_token: "secret_test".to_string(),
            required_columns: Vec::new(),
        },
        cors: CorsConfig::default(),
        storage: None,
    }
}

/// Name, Message, Attachments, Email and Title columns.
pub fn contact_schema() -> ColumnSchema {
    [
        Column::new("Name", "rich_text"),
        Column::new("Message", "rich_text"),
        Column::new("Attachments", "files"),
        Column::new("Email", "email"),
        Column::new("Title", "title"),
    ]
    .into_iter()
    .collect()
}

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

/// Serves a fixed schema (or a fixed failure) and records created pages.
pub struct MemoryDatabase {
    schema: Result<ColumnSchema, StoreError>,
    create_error: Option<StoreError>,
    pub created: Mutex<Vec<(String, ConvertedRecord)>>,
}

impl MemoryDatabase {
    pub fn with_schema(schema: ColumnSchema) -> Self {
        Self {
            schema: Ok(schema),
            create_error: None,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            schema: Err(StoreError::Backend("connection refused".into())),
            create_error: None,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_create(mut self, err: StoreError) -> Self {
        self.create_error = Some(err);
        self
    }

    pub fn records(&self) -> Vec<ConvertedRecord> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl SchemaSource for MemoryDatabase {
    async fn fetch_schema(&self, _database_id: &str) -> Result<ColumnSchema, StoreError> {
        self.schema.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryDatabase {
    async fn create(&self, database_id: &str, record: &ConvertedRecord) -> Result<(), StoreError> {
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        self.created
            .lock()
            .unwrap()
            .push((database_id.to_string(), record.clone()));
        Ok(())
    }
}

/// Keeps uploaded attachments in memory.
#[derive(Default)]
pub struct MemoryBlobs {
    pub stored: Mutex<Vec<(String, Attachment)>>,
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, key: &str, attachment: Attachment) -> Result<String, StoreError> {
        self.stored
            .lock()
            .unwrap()
            .push((key.to_string(), attachment));
        Ok(format!("{FILES_BASE_URL}/{key}"))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Router plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub database: Arc<MemoryDatabase>,
    pub blobs: Option<Arc<MemoryBlobs>>,
}

pub struct TestAppBuilder {
    config: ServerConfig,
    database: MemoryDatabase,
    required: Vec<String>,
    uploads: bool,
}

impl TestAppBuilder {
    pub fn new(database: MemoryDatabase) -> Self {
        Self {
            config: test_config(),
            database,
            required: Vec::new(),
            uploads: false,
        }
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_uploads(mut self) -> Self {
        self.uploads = true;
        self
    }

    pub fn config(mut self, f: impl FnOnce(&mut ServerConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the router with the same middleware stack production uses.
    pub fn build(self) -> TestApp {
        let database = Arc::new(self.database);
        let mut forms = FormService::new(
            Arc::new(TypeRegistry::standard()),
            DATABASE_ID,
            database.clone(),
            database.clone(),
        )
        .with_required_columns(self.required);

        let blobs = self.uploads.then(|| Arc::new(MemoryBlobs::default()));
        if let Some(blobs) = &blobs {
            forms = forms.with_blob_store(blobs.clone());
        }

        let router = build_app_router(AppState::new(self.config.clone(), forms), &self.config);
        TestApp {
            router,
            database,
            blobs,
        }
    }
}

/// Contact-form app without uploads or required columns.
pub fn build_test_app() -> TestApp {
    TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema())).build()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One multipart part: plain text or a file.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Encode `parts` as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// `POST /` with a multipart body built from `parts`.
pub async fn post_form(app: &TestApp, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

/// Send an arbitrary request through the router.
pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

/// Send a bodiless request with `method` to `uri`.
pub async fn request(app: &TestApp, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Header value as `&str`, panicking when absent.
pub fn header_str<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}
