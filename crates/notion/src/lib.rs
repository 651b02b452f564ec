//! Notion REST API client.
//!
//! Implements the engine's [`SchemaSource`](formgate_core::SchemaSource) and
//! [`RecordStore`](formgate_core::RecordStore) against the Notion databases
//! and pages endpoints.

pub mod api;
pub mod wire;

pub use api::{NotionApiError, NotionClient, DEFAULT_BASE_URL, NOTION_VERSION};
