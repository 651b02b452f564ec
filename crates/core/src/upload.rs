//! Attachment upload capability.
//!
//! [`BlobStore`] is the narrow interface to external blob storage. The engine
//! only calls it for Files columns, one attachment at a time, in submission
//! order, so a failure always points at exactly one attachment.

use async_trait::async_trait;

use crate::error::{ConversionError, StoreError};
use crate::types::{Attachment, RawField, RawValue};

/// Longest file extension carried over into an object key.
const MAX_KEY_EXTENSION_LEN: usize = 8;

/// External blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `attachment` under `key` and return a durable reference (URL).
    async fn put(&self, key: &str, attachment: Attachment) -> Result<String, StoreError>;
}

/// Fresh, collision-resistant object key for an attachment.
///
/// A UUIDv4, suffixed with the file's extension when it is short and
/// alphanumeric (`3f0c…e1.png`).
pub fn object_key(attachment: &Attachment) -> String {
    let id = uuid::Uuid::new_v4();
    match file_extension(&attachment.file_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_KEY_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Replace every attachment in `field` with its stored reference.
///
/// Uploads run sequentially in submission order; text values pass through.
/// Without a store, attachments are dropped and only text survives.
pub async fn materialize(
    column: &str,
    field: RawField,
    store: Option<&dyn BlobStore>,
) -> Result<Vec<String>, ConversionError> {
    let mut materialized = Vec::with_capacity(field.len());

    for (index, value) in field.into_values().into_iter().enumerate() {
        match (value, store) {
            (RawValue::Text(text), _) => materialized.push(text),
            (RawValue::Binary(attachment), Some(store)) => {
                let key = object_key(&attachment);
                let file_name = attachment.file_name.clone();
                tracing::debug!(column, %key, file_name = %file_name, size = attachment.data.len(), "Uploading attachment");

                let reference = store.put(&key, attachment).await.map_err(|cause| {
                    tracing::warn!(column, file_name = %file_name, error = %cause, "Attachment upload failed");
                    ConversionError::UploadFailure {
                        column: column.to_string(),
                        file_name,
                        index,
                        cause,
                    }
                })?;
                materialized.push(reference);
            }
            (RawValue::Binary(attachment), None) => {
                tracing::debug!(column, file_name = %attachment.file_name, "Dropping attachment, uploads disabled");
            }
        }
    }

    Ok(materialized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
