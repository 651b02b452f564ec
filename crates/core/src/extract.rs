//! Field extraction: payload -> per-column raw fields.
//!
//! Pure filtering. Required and unexpected fields are checked up front and
//! reported as a batch before anything is converted or uploaded.

use indexmap::IndexMap;

use crate::error::ConversionError;
use crate::registry::ColumnType;
use crate::types::{ColumnSchema, FormPayload, RawField, RawValue};

/// Split a comma-separated column list (as found in configuration) into names.
///
/// Surrounding whitespace is trimmed and empty entries are skipped.
pub fn parse_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract the raw fields of every submitted column.
///
/// 1. Every required column needs at least one non-empty value.
/// 2. Every submitted name must be a schema column.
/// 3. Binary values survive only for Files columns when `can_upload` is set;
///    empty strings are always dropped.
///
/// The result is keyed by column name in submission order.
pub fn extract_fields(
    payload: FormPayload,
    schema: &ColumnSchema,
    required: &[String],
    can_upload: bool,
) -> Result<IndexMap<String, RawField>, ConversionError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !payload.get_all(name).any(|value| !value.is_empty()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ConversionError::RequiredFieldMissing(missing));
    }

    let unexpected: Vec<String> = payload
        .keys()
        .into_iter()
        .filter(|name| !schema.contains(name))
        .map(str::to_string)
        .collect();
    if !unexpected.is_empty() {
        return Err(ConversionError::UnexpectedField(unexpected));
    }

    let mut fields: IndexMap<String, RawField> = IndexMap::new();
    for (name, value) in payload.into_entries() {
        let keeps_binary = can_upload
            && schema
                .get(&name)
                .is_some_and(|column| {
                    matches!(ColumnType::from_tag(&column.column_type), Ok(ColumnType::Files))
                });

        let field = fields.entry(name).or_default();
        match value {
            RawValue::Binary(_) if !keeps_binary => {}
            RawValue::Text(ref text) if text.is_empty() => {}
            value => field.push(value),
        }
    }

    Ok(fields)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
