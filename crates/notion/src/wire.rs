//! Request and response bodies exchanged with the Notion API.

use formgate_core::{Column, ColumnSchema, ConvertedRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Subset of `GET /v1/databases/{id}` the engine needs.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseResponse {
    pub id: String,
    /// Property key -> property schema, in the order Notion returned them.
    pub properties: IndexMap<String, PropertySchema>,
}

/// One database property (column) definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
}

impl DatabaseResponse {
    /// Column schema keyed by property name.
    pub fn into_schema(self) -> ColumnSchema {
        self.properties
            .into_values()
            .map(|property| Column::new(property.name, property.property_type))
            .collect()
    }
}

/// Body of `POST /v1/pages` for a page inside a database.
#[derive(Debug, Serialize)]
pub struct CreatePageRequest<'a> {
    pub parent: DatabaseParent<'a>,
    pub properties: &'a IndexMap<String, Value>,
    pub children: &'a [Value],
}

#[derive(Debug, Serialize)]
pub struct DatabaseParent<'a> {
    pub database_id: &'a str,
}

impl<'a> CreatePageRequest<'a> {
    pub fn new(database_id: &'a str, record: &'a ConvertedRecord) -> Self {
        Self {
            parent: DatabaseParent { database_id },
            properties: &record.properties,
            children: &record.children,
        }
    }
}

/// Error object returned with every non-2xx Notion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
