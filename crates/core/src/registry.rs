//! Column types and their conversion rules.
//!
//! The schema source reports column types as open string tags; they are
//! parsed into the closed [`ColumnType`] enum here, and unknown tags take a
//! single explicit [`RuleError::UnknownType`] path. [`TypeRegistry`] is an
//! immutable table built once at start-up and passed by reference.

use std::collections::HashMap;

use serde_json::{json, Value};
use url::Url;

use crate::error::RuleError;

// ---------------------------------------------------------------------------
// Column types
// ---------------------------------------------------------------------------

/// Whether a column accepts at most one value or any number of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    Multi,
}

/// Every column type with a registered conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    RichText,
    PhoneNumber,
    Url,
    Email,
    Date,
    Files,
    Select,
    MultiSelect,
    Status,
    People,
    Number,
    Checkbox,
}

impl ColumnType {
    pub const ALL: [ColumnType; 12] = [
        ColumnType::RichText,
        ColumnType::PhoneNumber,
        ColumnType::Url,
        ColumnType::Email,
        ColumnType::Date,
        ColumnType::Files,
        ColumnType::Select,
        ColumnType::MultiSelect,
        ColumnType::Status,
        ColumnType::People,
        ColumnType::Number,
        ColumnType::Checkbox,
    ];

    /// Wire tag, also used as the key of the converted property object.
    pub fn tag(self) -> &'static str {
        match self {
            Self::RichText => "rich_text",
            Self::PhoneNumber => "phone_number",
            Self::Url => "url",
            Self::Email => "email",
            Self::Date => "date",
            Self::Files => "files",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::People => "people",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
        }
    }

    /// Parse a type tag.
    ///
    /// Accepts exactly the snake_case wire tag (`rich_text`), its camelCase
    /// form (`richText`) or the PascalCase variant name (`RichText`).
    pub fn from_tag(tag: &str) -> Result<Self, RuleError> {
        Self::ALL
            .into_iter()
            .find(|ty| {
                let wire = ty.tag();
                tag == wire || tag == camel_case(wire, false) || tag == camel_case(wire, true)
            })
            .ok_or_else(|| RuleError::UnknownType(tag.to_string()))
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::RichText | Self::Files | Self::MultiSelect | Self::People => Arity::Multi,
            Self::PhoneNumber
            | Self::Url
            | Self::Email
            | Self::Date
            | Self::Select
            | Self::Status
            | Self::Number
            | Self::Checkbox => Arity::Single,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A pure conversion from a column's values to its structured property.
pub type ColumnRule = fn(&[String]) -> Result<Value, RuleError>;

/// Immutable table of conversion rules keyed by column type.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    rules: HashMap<ColumnType, ColumnRule>,
}

impl TypeRegistry {
    /// The registry with a rule for every [`ColumnType`].
    pub fn standard() -> Self {
        let mut rules: HashMap<ColumnType, ColumnRule> = HashMap::new();
        rules.insert(ColumnType::Email, convert_email);
        rules.insert(ColumnType::Url, convert_url);
        rules.insert(ColumnType::PhoneNumber, convert_phone_number);
        rules.insert(ColumnType::RichText, convert_rich_text);
        rules.insert(ColumnType::Date, convert_date);
        rules.insert(ColumnType::Files, convert_files);
        rules.insert(ColumnType::Select, convert_select);
        rules.insert(ColumnType::MultiSelect, convert_multi_select);
        rules.insert(ColumnType::Status, convert_status);
        rules.insert(ColumnType::People, convert_people);
        rules.insert(ColumnType::Number, convert_number);
        rules.insert(ColumnType::Checkbox, convert_checkbox);
        Self { rules }
    }

    /// Look up the rule for a type tag.
    pub fn resolve(&self, tag: &str) -> Result<(ColumnType, ColumnRule), RuleError> {
        let column_type = ColumnType::from_tag(tag)?;
        self.rules
            .get(&column_type)
            .map(|rule| (column_type, *rule))
            .ok_or_else(|| RuleError::UnknownType(tag.to_string()))
    }

    /// Resolve and apply the rule for `tag` in one step.
    pub fn apply(&self, tag: &str, values: &[String]) -> Result<Value, RuleError> {
        let (_, rule) = self.resolve(tag)?;
        rule(values)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Sole value of a single-arity column, or `None` when nothing was submitted.
/// `rich_text` -> `richText`, or `RichText` when `upper_first` is set.
fn camel_case(snake: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = upper_first;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn sole_value(values: &[String]) -> Result<Option<&str>, RuleError> {
    match values {
        [] => Ok(None),
        [value] => Ok(Some(value.as_str())),
        _ => Err(RuleError::TooManyValues {
            count: values.len(),
        }),
    }
}

fn convert_email(values: &[String]) -> Result<Value, RuleError> {
    Ok(json!({ "email": sole_value(values)? }))
}

fn convert_url(values: &[String]) -> Result<Value, RuleError> {
    Ok(json!({ "url": sole_value(values)? }))
}

fn convert_phone_number(values: &[String]) -> Result<Value, RuleError> {
    Ok(json!({ "phone_number": sole_value(values)? }))
}

fn convert_rich_text(values: &[String]) -> Result<Value, RuleError> {
    let entries: Vec<Value> = values
        .iter()
        .map(|v| json!({ "text": { "content": v } }))
        .collect();
    Ok(json!({ "rich_text": entries }))
}

fn convert_date(values: &[String]) -> Result<Value, RuleError> {
    let date = sole_value(values)?.map(|start| {
        json!({
            "start": start,
            "end": null,
            "time_zone": null,
        })
    });
    Ok(json!({ "date": date }))
}

fn convert_files(values: &[String]) -> Result<Value, RuleError> {
    let files = values
        .iter()
        .map(|reference| {
            let name = reference_basename(reference)?;
            Ok(json!({
                "external": { "url": reference },
                "name": name,
            }))
        })
        .collect::<Result<Vec<Value>, RuleError>>()?;
    Ok(json!({ "files": files }))
}

/// Last non-empty path segment of a URL reference.
fn reference_basename(reference: &str) -> Result<String, RuleError> {
    let invalid = |reason: String| RuleError::InvalidReference {
        value: reference.to_string(),
        reason,
    };

    let url = Url::parse(reference).map_err(|e| invalid(e.to_string()))?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| invalid("no file name in URL path".to_string()))
}

fn convert_select(values: &[String]) -> Result<Value, RuleError> {
    let option = sole_value(values)?.map(|name| json!({ "name": name }));
    Ok(json!({ "select": option }))
}

fn convert_multi_select(values: &[String]) -> Result<Value, RuleError> {
    let options: Vec<Value> = values.iter().map(|v| json!({ "name": v })).collect();
    Ok(json!({ "multi_select": options }))
}

fn convert_status(values: &[String]) -> Result<Value, RuleError> {
    let option = sole_value(values)?.map(|name| json!({ "name": name }));
    Ok(json!({ "status": option }))
}

// People can't be looked up by name or email remotely, so values are ids.
fn convert_people(values: &[String]) -> Result<Value, RuleError> {
    let people: Vec<Value> = values.iter().map(|v| json!({ "id": v })).collect();
    Ok(json!({ "people": people }))
}

fn convert_number(values: &[String]) -> Result<Value, RuleError> {
    let number = match sole_value(values)? {
        None => Value::Null,
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| RuleError::InvalidNumber(raw.to_string()))?,
    };
    Ok(json!({ "number": number }))
}

// Only "1" and "true" are truthy; "0", "false" and anything else map to false.
fn convert_checkbox(values: &[String]) -> Result<Value, RuleError> {
    let checked = matches!(sole_value(values)?, Some("1") | Some("true"));
    Ok(json!({ "checkbox": checked }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
