use axum::http::header::ALLOW;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use formgate_core::{ConversionError, ErrorClass};
use serde_json::json;

/// Methods accepted on the submission endpoint, as sent in `Allow`.
pub const ALLOWED_METHODS: &str = "OPTIONS, POST";

/// Body message for any method other than [`ALLOWED_METHODS`].
pub const FORBIDDEN_METHOD_MESSAGE: &str = "Forbidden request method.";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`ConversionError`] for submission failures and adds the
/// HTTP-only method check. Every variant renders as `{"errors": [...]}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Conversion(err) => {
                let report = err.report();
                if report.class == ErrorClass::Internal {
                    tracing::error!(error = %err, "Submission failed");
                } else {
                    tracing::debug!(error = %err, class = %report.class, "Submission rejected");
                }

                let status = StatusCode::from_u16(report.class.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, axum::Json(json!({ "errors": report.messages }))).into_response()
            }
            AppError::MethodNotAllowed(method) => {
                tracing::debug!(%method, "Rejected request method");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(ALLOW, ALLOWED_METHODS)],
                    axum::Json(json!({ "errors": [FORBIDDEN_METHOD_MESSAGE] })),
                )
                    .into_response()
            }
        }
    }
}
