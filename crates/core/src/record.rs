//! Record assembly and the engine entry point.
//!
//! [`convert`] runs extraction, then converts every submitted column in
//! schema order, aborting on the first conversion failure. A successful
//! build adds the fixed `title` property and a block rendering of every
//! submitted field for auditability.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::convert::FieldConverter;
use crate::error::ConversionError;
use crate::extract::extract_fields;
use crate::registry::TypeRegistry;
use crate::types::{ColumnSchema, FormPayload, RawField};
use crate::upload::BlobStore;

/// Key of the synthesized title property.
pub const TITLE_PROPERTY: &str = "title";

/// Constant label stored in the title property.
pub const SUBMISSION_TITLE: &str = "Form Submission";

/// Text of the heading block that opens the rendered submission.
pub const SUBMISSION_HEADING: &str = "Form";

/// A typed record ready for the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedRecord {
    /// Column name -> structured property value, plus [`TITLE_PROPERTY`].
    pub properties: IndexMap<String, Value>,
    /// Heading, then one label/value block pair per submitted field.
    pub children: Vec<Value>,
}

/// Convert a form submission into a record.
///
/// `uploader` is the optional upload capability: when present, attachments
/// on Files columns are stored and replaced by their references; when absent
/// they are dropped.
pub async fn convert(
    registry: &TypeRegistry,
    payload: FormPayload,
    schema: &ColumnSchema,
    required: &[String],
    uploader: Option<&dyn BlobStore>,
) -> Result<ConvertedRecord, ConversionError> {
    let fields = extract_fields(payload, schema, required, uploader.is_some())?;
    RecordBuilder::new(FieldConverter::new(registry, uploader))
        .build(schema, fields)
        .await
}

/// Assembles a [`ConvertedRecord`] from extracted fields.
pub struct RecordBuilder<'a> {
    converter: FieldConverter<'a>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(converter: FieldConverter<'a>) -> Self {
        Self { converter }
    }

    /// Convert every schema column that has a field, in schema order.
    ///
    /// The first failing column aborts the build; later columns are not
    /// attempted and uploads already issued are not rolled back.
    pub async fn build(
        &self,
        schema: &ColumnSchema,
        mut fields: IndexMap<String, RawField>,
    ) -> Result<ConvertedRecord, ConversionError> {
        let submitted: Vec<String> = fields.keys().cloned().collect();
        let mut properties = IndexMap::with_capacity(fields.len() + 1);
        let mut rendered: HashMap<String, Vec<String>> = HashMap::with_capacity(fields.len());

        for column in schema.columns() {
            let Some(field) = fields.shift_remove(&column.name) else {
                continue;
            };

            let converted = self.converter.convert(column, field).await?;
            properties.insert(column.name.clone(), converted.value);
            rendered.insert(column.name.clone(), converted.values);
        }

        properties.insert(
            TITLE_PROPERTY.to_string(),
            json!({ "title": [{ "text": { "content": SUBMISSION_TITLE } }] }),
        );

        let mut children = Vec::with_capacity(1 + submitted.len() * 2);
        children.push(heading_block(SUBMISSION_HEADING));
        for name in &submitted {
            let values = rendered.get(name).map(Vec::as_slice).unwrap_or_default();
            children.push(label_block(name));
            children.push(quote_block(&values.join(", ")));
        }

        tracing::debug!(
            properties = properties.len(),
            blocks = children.len(),
            "Built record"
        );

        Ok(ConvertedRecord {
            properties,
            children,
        })
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn text_run(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

fn heading_block(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_1",
        "heading_1": { "rich_text": [text_run(content)] },
    })
}

fn label_block(content: &str) -> Value {
    let mut run = text_run(content);
    run["annotations"] = json!({ "bold": true });
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [run] },
    })
}

fn quote_block(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "quote",
        "quote": { "rich_text": [text_run(content)] },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
