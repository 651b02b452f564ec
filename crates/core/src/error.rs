//! Error taxonomy and the aggregator that turns errors into reports.
//!
//! Extraction-phase errors carry every offending name; conversion-phase errors
//! carry the column, its type, the values that triggered the failure and the
//! underlying cause. [`ConversionError::report`] maps each kind onto a stable,
//! caller-facing [`ErrorReport`].

use std::fmt;

/// Message for a request body that could not be decoded as form data.
pub const MALFORMED_PAYLOAD_MESSAGE: &str =
    "Failed to parse request body as form data. Send multipart/form-data.";

/// Message for a request body over the configured size limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str =
    "Request body exceeds the maximum upload size.";

/// Message for a failed schema fetch.
pub const SCHEMA_UNAVAILABLE_MESSAGE: &str = "Unable to fetch database schema";

/// Leading message for a failed attachment upload.
pub const UPLOAD_FAILURE_MESSAGE: &str = "Failed to upload files";

/// Message for a record-creation failure without a recognised error code.
pub const UNKNOWN_SERVER_ERROR_MESSAGE: &str = "Unknown server error";

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Failure reported by a collaborator (schema source, blob store, record store).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The remote API answered with a recognisable error code.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// Transport or backend failure without a structured code.
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// The remote error code, when the failure carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Api { code, .. } => Some(code),
            StoreError::Backend(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule errors
// ---------------------------------------------------------------------------

/// Failure raised by a single column-type rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Too many values given ({count})")]
    TooManyValues { count: usize },

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("Cannot use '{value}' as a file reference: {reason}")]
    InvalidReference { value: String, reason: String },

    #[error("{0} does not correspond to a known column type")]
    UnknownType(String),
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

/// Every failure the engine can surface for one request.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The request body was not decodable form data.
    #[error("Malformed form payload: {0}")]
    MalformedPayload(String),

    /// The request body hit the size limit while being decoded.
    #[error("Form payload too large: {0}")]
    PayloadTooLarge(String),

    /// Required columns without a non-empty value.
    #[error("The following fields must contain a value: {}", .0.join(", "))]
    RequiredFieldMissing(Vec<String>),

    /// Submitted names that are not columns of the schema.
    #[error("The following fields were unexpected: {}", .0.join(", "))]
    UnexpectedField(Vec<String>),

    /// A column's values could not be converted to its declared type.
    #[error("Unexpected value '{}' for '{column}' ({column_type})", .values.join(","))]
    TypeConversionFailure {
        column: String,
        column_type: String,
        values: Vec<String>,
        #[source]
        cause: RuleError,
    },

    /// An attachment could not be stored.
    #[error("Failed to upload '{file_name}' (#{index}) for '{column}'")]
    UploadFailure {
        column: String,
        file_name: String,
        /// Position of the attachment within the column's submitted values.
        index: usize,
        #[source]
        cause: StoreError,
    },

    /// The column schema could not be fetched.
    #[error("Unable to fetch database schema: {0}")]
    SchemaUnavailable(#[source] StoreError),

    /// The record store rejected or failed the create call.
    #[error("Failed to create record: {0}")]
    RecordCreation(#[source] StoreError),
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Severity class of a reported error, mirroring HTTP semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid submission (400).
    BadRequest,
    /// Body was not form data (415).
    UnsupportedMediaType,
    /// Upstream or unexpected failure (500).
    Internal,
}

impl ErrorClass {
    /// HTTP-equivalent status code.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::UnsupportedMediaType => 415,
            ErrorClass::Internal => 500,
        }
    }

    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorClass::Internal)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::BadRequest => write!(f, "bad_request"),
            ErrorClass::UnsupportedMediaType => write!(f, "unsupported_media_type"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

/// One error class plus every message the caller should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub class: ErrorClass,
    pub messages: Vec<String>,
}

impl ErrorReport {
    fn new(class: ErrorClass, messages: Vec<String>) -> Self {
        Self { class, messages }
    }
}

impl ConversionError {
    /// Classify this error and render its caller-facing messages.
    pub fn report(&self) -> ErrorReport {
        match self {
            ConversionError::MalformedPayload(_) => ErrorReport::new(
                ErrorClass::UnsupportedMediaType,
                vec![MALFORMED_PAYLOAD_MESSAGE.to_string()],
            ),
            ConversionError::PayloadTooLarge(_) => ErrorReport::new(
                ErrorClass::UnsupportedMediaType,
                vec![PAYLOAD_TOO_LARGE_MESSAGE.to_string()],
            ),
            ConversionError::RequiredFieldMissing(_) | ConversionError::UnexpectedField(_) => {
                ErrorReport::new(ErrorClass::BadRequest, vec![self.to_string()])
            }
            ConversionError::TypeConversionFailure { cause, .. } => ErrorReport::new(
                ErrorClass::BadRequest,
                vec![self.to_string(), cause.to_string()],
            ),
            ConversionError::UploadFailure { cause, .. } => ErrorReport::new(
                ErrorClass::Internal,
                vec![
                    UPLOAD_FAILURE_MESSAGE.to_string(),
                    self.to_string(),
                    cause.to_string(),
                ],
            ),
            ConversionError::SchemaUnavailable(_) => ErrorReport::new(
                ErrorClass::Internal,
                vec![SCHEMA_UNAVAILABLE_MESSAGE.to_string()],
            ),
            ConversionError::RecordCreation(cause) => {
                let message = cause
                    .code()
                    .map(str::to_string)
                    .unwrap_or_else(|| UNKNOWN_SERVER_ERROR_MESSAGE.to_string());
                ErrorReport::new(ErrorClass::Internal, vec![message])
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
