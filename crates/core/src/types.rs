//! Request-scoped data types: column schema, form payload and raw fields.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

/// A named, typed slot in the target record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Open type tag as reported by the schema source (e.g. `rich_text`).
    #[serde(rename = "type")]
    pub column_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Column name -> column, in the order the schema source reported them.
///
/// Built once per request and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    columns: IndexMap<String, Column>,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any earlier column with the same name.
    pub fn insert(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<Column> for ColumnSchema {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut schema = Self::new();
        for column in iter {
            schema.insert(column);
        }
        schema
    }
}

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// An uploaded file as received in the form submission.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    /// Declared media type, if the client sent one.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data: data.into(),
        }
    }
}

// Attachments can be megabytes; keep the payload out of debug logs.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One unconverted submitted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Binary(Attachment),
}

impl RawValue {
    /// `true` only for an empty text value. Attachments always count as a value.
    pub fn is_empty(&self) -> bool {
        matches!(self, RawValue::Text(text) if text.is_empty())
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, RawValue::Binary(_))
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        RawValue::Text(text)
    }
}

impl From<Attachment> for RawValue {
    fn from(attachment: Attachment) -> Self {
        RawValue::Binary(attachment)
    }
}

// ---------------------------------------------------------------------------
// Form payload
// ---------------------------------------------------------------------------

/// Ordered multi-map of submitted `(name, value)` pairs.
///
/// Submission order is preserved; a name may appear any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    entries: Vec<(String, RawValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// All values submitted under `name`, in submission order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawValue> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Distinct submitted names, in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|(key, _)| key.as_str())
            .collect::<IndexSet<&str>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, RawValue)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for FormPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (name, value) in iter {
            payload.append(name, value);
        }
        payload
    }
}

/// The filtered values of one submitted column, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawField {
    values: Vec<RawValue>,
}

impl RawField {
    pub fn new(values: Vec<RawValue>) -> Self {
        Self { values }
    }

    pub fn push(&mut self, value: RawValue) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<RawValue> {
        self.values
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
