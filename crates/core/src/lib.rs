//! Schema-driven form conversion engine.
//!
//! Turns an untyped, multi-valued form submission into a typed database
//! record, given a column schema fetched at request time. Pure logic plus
//! three narrow collaborator traits ([`SchemaSource`], [`BlobStore`],
//! [`RecordStore`]); no HTTP or vendor SDK dependencies.

pub mod convert;
pub mod error;
pub mod extract;
pub mod record;
pub mod registry;
pub mod service;
pub mod types;
pub mod upload;

pub use error::{ConversionError, ErrorClass, ErrorReport, RuleError, StoreError};
pub use record::{convert, ConvertedRecord};
pub use registry::{Arity, ColumnType, TypeRegistry};
pub use service::{FormService, RecordStore, SchemaSource};
pub use types::{Attachment, Column, ColumnSchema, FormPayload, RawField, RawValue};
pub use upload::BlobStore;
