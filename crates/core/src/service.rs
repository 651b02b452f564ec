//! Per-deployment orchestration: fetch schema, convert, create record.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConversionError, StoreError};
use crate::record::{convert, ConvertedRecord};
use crate::registry::TypeRegistry;
use crate::types::{ColumnSchema, FormPayload};
use crate::upload::BlobStore;

/// Source of the target database's column schema.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_schema(&self, database_id: &str) -> Result<ColumnSchema, StoreError>;
}

/// Remote database that receives converted records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, database_id: &str, record: &ConvertedRecord) -> Result<(), StoreError>;
}

/// Accepts form submissions for one target database.
///
/// Holds only immutable configuration and shared collaborators; every
/// submission allocates its own state.
#[derive(Clone)]
pub struct FormService {
    registry: Arc<TypeRegistry>,
    database_id: String,
    required_columns: Vec<String>,
    schema_source: Arc<dyn SchemaSource>,
    record_store: Arc<dyn RecordStore>,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl FormService {
    pub fn new(
        registry: Arc<TypeRegistry>,
        database_id: impl Into<String>,
        schema_source: Arc<dyn SchemaSource>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            registry,
            database_id: database_id.into(),
            required_columns: Vec::new(),
            schema_source,
            record_store,
            blob_store: None,
        }
    }

    /// Columns that must carry a non-empty value in every submission.
    pub fn with_required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    /// Enable attachment uploads for Files columns.
    pub fn with_blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    pub fn uploads_enabled(&self) -> bool {
        self.blob_store.is_some()
    }

    /// Fetch the schema, convert `payload` and create the record.
    pub async fn submit(&self, payload: FormPayload) -> Result<ConvertedRecord, ConversionError> {
        let schema = self
            .schema_source
            .fetch_schema(&self.database_id)
            .await
            .map_err(|e| {
                tracing::error!(database_id = %self.database_id, error = %e, "Schema fetch failed");
                ConversionError::SchemaUnavailable(e)
            })?;
        tracing::debug!(columns = schema.len(), fields = payload.len(), "Fetched schema");

        let record = convert(
            &self.registry,
            payload,
            &schema,
            &self.required_columns,
            self.blob_store.as_deref(),
        )
        .await?;

        self.record_store
            .create(&self.database_id, &record)
            .await
            .map_err(|e| {
                tracing::error!(database_id = %self.database_id, error = %e, "Record creation failed");
                ConversionError::RecordCreation(e)
            })?;

        tracing::info!(
            database_id = %self.database_id,
            properties = record.properties.len(),
            "Form submission stored"
        );
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
