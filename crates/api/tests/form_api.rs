//! Integration tests for form submission through `POST /`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    body_bytes, body_json, build_test_app, contact_schema, post_form, send, MemoryDatabase, Part,
    TestAppBuilder, FILES_BASE_URL,
};
use formgate_core::{Column, ColumnSchema, StoreError};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: valid submission returns 204 and creates one record
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_submission_creates_record() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Name", "Email", "Message"])
        .build();

    let response = post_form(
        &app,
        &[
            Part::Text("Name", "Tester"),
            Part::Text("Email", "hi@example.com"),
            Part::Text("Message", "Nice to meet you!"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());

    let records = app.database.records();
    assert_eq!(records.len(), 1);
    let properties = &records[0].properties;
    assert_eq!(properties["Email"], json!({ "email": "hi@example.com" }));
    assert_eq!(
        properties["Name"],
        json!({ "rich_text": [{ "text": { "content": "Tester" } }] })
    );
    assert_eq!(
        properties["title"],
        json!({ "title": [{ "text": { "content": "Form Submission" } }] })
    );

    let created = app.database.created.lock().unwrap();
    assert_eq!(created[0].0, common::DATABASE_ID);
}

// ---------------------------------------------------------------------------
// Test: missing required columns are reported together
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_required_fields_return_400() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Email", "Message"])
        .build();

    let response = post_form(&app, &[Part::Text("Email", "hi@example.com")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({ "errors": ["The following fields must contain a value: Message"] })
    );
    assert!(app.database.records().is_empty());
}

#[tokio::test]
async fn empty_required_value_counts_as_missing() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Email"])
        .build();

    let response = post_form(&app, &[Part::Text("Email", "")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["errors"][0],
        "The following fields must contain a value: Email"
    );
}

// ---------------------------------------------------------------------------
// Test: unknown columns are rejected even when required ones are present
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unexpected_fields_return_400() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Email"])
        .build();

    let response = post_form(
        &app,
        &[
            Part::Text("Email", "hi@example.com"),
            Part::Text("Nickname", "tess"),
            Part::Text("Phone", "555"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({ "errors": ["The following fields were unexpected: Nickname, Phone"] })
    );
}

// ---------------------------------------------------------------------------
// Test: type conversion failures carry both messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn too_many_values_return_400_with_cause() {
    let app = build_test_app();

    let response = post_form(
        &app,
        &[
            Part::Text("Email", "a@example.com"),
            Part::Text("Email", "b@example.com"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = body_json(response).await["errors"].clone();
    let errors = errors.as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[0],
        "Unexpected value 'a@example.com,b@example.com' for 'Email' (email)"
    );
}

#[tokio::test]
async fn invalid_number_returns_400() {
    let schema: ColumnSchema = [Column::new("Age", "number")].into_iter().collect();
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(schema)).build();

    let response = post_form(&app, &[Part::Text("Age", "twelve")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0], "Unexpected value 'twelve' for 'Age' (number)");
}

// ---------------------------------------------------------------------------
// Test: attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attachments_are_uploaded_in_order() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Name"])
        .with_uploads()
        .build();

    let response = post_form(
        &app,
        &[
            Part::Text("Name", "Test Name"),
            Part::File {
                name: "Attachments",
                file_name: "attachment1.webp",
                content_type: "image/webp",
                data: b"first",
            },
            Part::File {
                name: "Attachments",
                file_name: "attachment2.webp",
                content_type: "image/webp",
                data: b"second",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let blobs = app.blobs.as_ref().unwrap();
    let stored = blobs.stored.lock().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].1.file_name, "attachment1.webp");
    assert_eq!(stored[0].1.content_type.as_deref(), Some("image/webp"));
    assert_eq!(stored[0].1.data, b"first");
    assert_eq!(stored[1].1.file_name, "attachment2.webp");

    let records = app.database.records();
    let files = records[0].properties["Attachments"]["files"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(files.len(), 2);
    assert_eq!(
        files[0]["external"]["url"],
        format!("{FILES_BASE_URL}/{}", stored[0].0)
    );
    assert_eq!(files[0]["name"], stored[0].0.as_str());
}

#[tokio::test]
async fn attachments_without_uploads_are_dropped() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .required(&["Name"])
        .build();

    let response = post_form(
        &app,
        &[
            Part::Text("Name", "Test Name"),
            Part::File {
                name: "Attachments",
                file_name: "attachment1.webp",
                content_type: "image/webp",
                data: b"first",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let records = app.database.records();
    assert_eq!(records[0].properties["Attachments"], json!({ "files": [] }));
}

#[tokio::test]
async fn empty_file_input_is_ignored() {
    let app = TestAppBuilder::new(MemoryDatabase::with_schema(contact_schema()))
        .with_uploads()
        .build();

    let response = post_form(
        &app,
        &[
            Part::Text("Name", "Test Name"),
            Part::File {
                name: "Attachments",
                file_name: "",
                content_type: "application/octet-stream",
                data: b"",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.blobs.as_ref().unwrap().stored.lock().unwrap().is_empty());
    assert!(!app.database.records()[0].properties.contains_key("Attachments"));
}

// ---------------------------------------------------------------------------
// Test: body that is not form data returns 415
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_multipart_body_returns_415() {
    let app = build_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"Email":"hi@example.com"}"#))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({ "errors": ["Failed to parse request body as form data. Send multipart/form-data."] })
    );
    assert!(app.database.records().is_empty());
}

// ---------------------------------------------------------------------------
// Test: upstream failures return 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn schema_failure_returns_500() {
    let app = TestAppBuilder::new(MemoryDatabase::unavailable()).build();

    let response = post_form(&app, &[Part::Text("Email", "hi@example.com")]).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json, json!({ "errors": ["Unable to fetch database schema"] }));
}

#[tokio::test]
async fn record_store_error_code_is_reported() {
    let database = MemoryDatabase::with_schema(contact_schema()).failing_create(StoreError::Api {
        code: "validation_error".into(),
        message: "Title is not a property that exists.".into(),
    });
    let app = TestAppBuilder::new(database).build();

    let response = post_form(&app, &[Part::Text("Email", "hi@example.com")]).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json, json!({ "errors": ["validation_error"] }));
}

#[tokio::test]
async fn record_store_backend_error_is_generic() {
    let database = MemoryDatabase::with_schema(contact_schema())
        .failing_create(StoreError::Backend("socket closed".into()));
    let app = TestAppBuilder::new(database).build();

    let response = post_form(&app, &[Part::Text("Email", "hi@example.com")]).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json, json!({ "errors": ["Unknown server error"] }));
}
