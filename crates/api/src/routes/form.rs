//! Submission endpoint at `/`.
//!
//! `POST` accepts `multipart/form-data` and answers 204 once the record is
//! created. `OPTIONS` answers CORS preflights and plain capability probes.
//! Every other method is rejected with 405.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
    ALLOW, ORIGIN,
};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use formgate_core::{Attachment, ConversionError, FormPayload};

use crate::error::{AppError, AppResult, ALLOWED_METHODS};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        post(submit_form)
            .options(form_options)
            .fallback(method_not_allowed),
    )
}

/// Convert and store one form submission.
async fn submit_form(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<StatusCode> {
    let multipart = multipart.map_err(|rejection| {
        ConversionError::MalformedPayload(rejection.body_text())
    })?;
    let payload = read_payload(multipart).await?;

    state.forms.submit(payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn form_options(headers: HeaderMap) -> Response {
    if is_preflight(&headers) {
        (StatusCode::NO_CONTENT, [(ACCESS_CONTROL_ALLOW_HEADERS, "*")]).into_response()
    } else {
        (StatusCode::NO_CONTENT, [(ALLOW, ALLOWED_METHODS)]).into_response()
    }
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}

/// A CORS preflight carries `Origin` and both `Access-Control-Request-*` headers.
fn is_preflight(headers: &HeaderMap) -> bool {
    headers.contains_key(ORIGIN)
        && headers.contains_key(ACCESS_CONTROL_REQUEST_METHOD)
        && headers.contains_key(ACCESS_CONTROL_REQUEST_HEADERS)
}

/// Read every multipart part into a [`FormPayload`], keeping submission order.
///
/// Parts with a file name become attachments; the rest are text. An empty
/// file input (no name, no bytes) is skipped.
async fn read_payload(mut multipart: Multipart) -> Result<FormPayload, ConversionError> {
    let mut payload = FormPayload::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                if let Some(attachment) = read_attachment(field, file_name).await? {
                    payload.append(name, attachment);
                }
            }
            None => {
                let text = field.text().await.map_err(malformed)?;
                payload.append(name, text);
            }
        }
    }

    tracing::debug!(parts = payload.len(), "Decoded form payload");
    Ok(payload)
}

async fn read_attachment(
    field: Field<'_>,
    file_name: String,
) -> Result<Option<Attachment>, ConversionError> {
    let content_type = field.content_type().map(str::to_owned);
    let data = field.bytes().await.map_err(malformed)?;

    if file_name.is_empty() && data.is_empty() {
        return Ok(None);
    }
    Ok(Some(Attachment::new(file_name, content_type, data.to_vec())))
}

fn malformed(err: MultipartError) -> ConversionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConversionError::PayloadTooLarge(err.body_text())
    } else {
        ConversionError::MalformedPayload(err.body_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
