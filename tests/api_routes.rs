mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::Portal;
use lab_portal::api::{AppState, create_router};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let portal = Portal::seeded().await;
    create_router(AppState::new(portal.pool, portal.config))
}

async fn send(app: &Router, method: &str, uri: &str, actor: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("X-User", actor);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_the_database() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn login_hides_credentials_and_rejects_bad_passwords() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "handle": "admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "handle": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn actor_header_is_required() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/users", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/users?role=admin", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/users/library", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "library_admin");
    let (status, _) = send(&app, "GET", "/users/ghost", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enrollment_flow_over_http() {
    let app = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({
            "handle": "T01",
            "name": "Ben Reyes",
            "password": "pw",
            "role": "teacher",
            "registration_code": "AMACC2025"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "handle": "S001", "name": "Ana Cruz", "password": "pw", "role": "student" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/subjects", Some("T01"), Some(json!({ "name": "Algebra" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, enrollment) = send(
        &app,
        "POST",
        "/enrollments",
        Some("S001"),
        Some(json!({ "teacher": "T01", "subject": "Algebra" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(enrollment["status"], "Pending");
    let id = enrollment["id"].as_i64().unwrap();

    let (status, pending) = send(
        &app,
        "GET",
        "/enrollments?teacher_usn=T01&status=pending",
        Some("T01"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let uri = format!("/enrollments/{id}/action");
    let (status, body) = send(&app, "POST", &uri, Some("T01"), Some(json!({ "action": "promote" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("promote"));

    let (status, body) = send(&app, "POST", &uri, Some("S001"), Some(json!({ "action": "approve" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "POST", &uri, Some("T01"), Some(json!({ "action": "approve" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Approved");

    let (status, _) = send(&app, "POST", &uri, Some("T01"), Some(json!({ "action": "decline" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_status_filter_is_a_bad_request() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/requests?status=lost", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalogue_and_facilities_are_public() {
    let app = app().await;
    let (status, labs) = send(&app, "GET", "/labs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labs.as_array().unwrap().len(), 3);

    let (status, rooms) = send(&app, "GET", "/rooms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 3);

    let (status, books) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(books.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/books/BC404", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_desk_over_http() {
    let app = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/books",
        Some("library"),
        Some(json!({ "title": "Clean Code", "author": "Robert Martin", "barcode": "BC100" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, record) = send(
        &app,
        "POST",
        "/lend",
        Some("library"),
        Some(json!({ "barcode": "BC100", "borrower": "admin", "due_in_days": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["borrower"], "admin");

    let (status, books) = send(&app, "GET", "/books?status=Borrowed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);

    let (status, receipt) = send(&app, "POST", "/return", Some("library"), Some(json!({ "barcode": "BC100" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["book"]["status"], "Available");

    let (status, _) = send(&app, "POST", "/return", Some("library"), Some(json!({ "barcode": "BC100" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn dashboard_follows_the_role() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/dashboard", Some("library"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"], "library");
    assert_eq!(body["total_books"], 0);

    let (status, body) = send(&app, "GET", "/audit", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some());

    let (status, _) = send(&app, "GET", "/audit", Some("library"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
