//! [`BlobStore`] backed by an S3-compatible bucket.
//!
//! Objects are written with the attachment's content type and its original
//! file name as `filename` metadata. The returned reference is the public
//! URL `{public_base_url}/{key}`; the bucket itself is expected to be
//! publicly readable through that URL.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use formgate_core::{Attachment, BlobStore, StoreError};

/// Region used when none is configured (R2 accepts `auto`).
pub const DEFAULT_REGION: &str = "auto";

/// Metadata key holding the submitted file name.
pub const FILENAME_METADATA_KEY: &str = "filename";

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Public URL prefix under which stored objects are readable.
    pub public_base_url: String,
    /// Custom endpoint (R2, MinIO). `None` uses the AWS endpoint for the region.
    pub endpoint_url: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
            endpoint_url: None,
            region: DEFAULT_REGION.to_string(),
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Static credentials, when both halves are configured.
    pub fn static_credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "formgate-static",
            )),
            _ => None,
        }
    }
}

/// Join the public base URL and an object key with exactly one `/`.
pub fn object_url(public_base_url: &str, key: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), key)
}

/// Uploads attachments into one bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Build a client from `config`.
    ///
    /// Static credentials win when configured; otherwise the default AWS
    /// provider chain (environment, profile, instance metadata) is used.
    pub async fn connect(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(credentials) = config.static_credentials() {
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        tracing::info!(
            bucket = %config.bucket,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 blob store configured"
        );

        Self::with_client(
            Client::from_conf(s3_config),
            config.bucket.clone(),
            config.public_base_url.clone(),
        )
    }

    /// Wrap an existing client.
    pub fn with_client(
        client: Client,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn url_for(&self, key: &str) -> String {
        object_url(&self.public_base_url, key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, attachment: Attachment) -> Result<String, StoreError> {
        let size = attachment.data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(attachment.data))
            .set_content_type(attachment.content_type)
            .metadata(FILENAME_METADATA_KEY, attachment.file_name)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(bucket = %self.bucket, key, error = %DisplayErrorContext(&e), "Object upload failed");
                StoreError::Backend(DisplayErrorContext(&e).to_string())
            })?;

        tracing::debug!(bucket = %self.bucket, key, size, "Object uploaded");
        Ok(self.url_for(key))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
