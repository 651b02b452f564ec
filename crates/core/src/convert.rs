//! Single-field conversion.
//!
//! Two phases per field: an async materialize step (uploads, Files columns
//! only) that yields plain strings, then the pure rule for the column type.

use serde_json::Value;

use crate::error::ConversionError;
use crate::registry::{ColumnType, TypeRegistry};
use crate::types::{Column, RawField};
use crate::upload::{materialize, BlobStore};

/// The outcome of converting one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedField {
    /// Structured property value (e.g. `{"email": "…"}`).
    pub value: Value,
    /// The values the rule ran on, after upload substitution.
    pub values: Vec<String>,
}

/// Converts one column's raw values according to its declared type.
#[derive(Clone, Copy)]
pub struct FieldConverter<'a> {
    registry: &'a TypeRegistry,
    uploader: Option<&'a dyn BlobStore>,
}

impl<'a> FieldConverter<'a> {
    pub fn new(registry: &'a TypeRegistry, uploader: Option<&'a dyn BlobStore>) -> Self {
        Self { registry, uploader }
    }

    /// Whether attachments for Files columns will be uploaded.
    pub fn can_upload(&self) -> bool {
        self.uploader.is_some()
    }

    /// Convert `field` for `column`.
    ///
    /// Uploads happen only when the column is a Files column and an uploader
    /// is configured. Rule failures (arity, unparseable number, bad
    /// reference, unknown type) become [`ConversionError::TypeConversionFailure`]
    /// carrying the column, its type, the values and the cause.
    pub async fn convert(
        &self,
        column: &Column,
        field: RawField,
    ) -> Result<ConvertedField, ConversionError> {
        let is_files = matches!(ColumnType::from_tag(&column.column_type), Ok(ColumnType::Files));
        let store = if is_files { self.uploader } else { None };

        let values = materialize(&column.name, field, store).await?;

        let value = self
            .registry
            .apply(&column.column_type, &values)
            .map_err(|cause| ConversionError::TypeConversionFailure {
                column: column.name.clone(),
                column_type: column.column_type.clone(),
                values: values.clone(),
                cause,
            })?;

        Ok(ConvertedField { value, values })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
