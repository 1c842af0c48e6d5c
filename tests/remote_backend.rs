mod common;

use common::Portal;
use lab_portal::api::{AppState, create_router};
use lab_portal::backend::{LocalBackend, PortalBackend, RemoteBackend};
use lab_portal::database::models::{Decision, RequestStatus, Role};
use lab_portal::error::PortalError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn error_replies_map_onto_the_taxonomy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid handle or password" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/enrollments"))
        .and(header("X-User", "S001"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "error": "already exists" })))
        .mount(&server)
        .await;

    let backend = RemoteBackend::new(server.uri()).unwrap();
    let err = backend.login("admin", "nope").await.unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized(ref msg) if msg == "Invalid handle or password"));

    let err = backend.request_enrollment("S001", "T01", "Algebra").await.unwrap_err();
    assert!(matches!(err, PortalError::Conflict(_)));
}

#[tokio::test]
async fn unexpected_replies_are_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/labs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = RemoteBackend::new(server.uri()).unwrap();
    assert!(matches!(backend.labs().await.unwrap_err(), PortalError::Transport(_)));
    assert!(matches!(backend.rooms().await.unwrap_err(), PortalError::Transport(_)));
}

#[tokio::test]
async fn queries_carry_filters_and_the_actor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enrollments"))
        .and(query_param("teacher_usn", "T01"))
        .and(query_param("status", "Pending"))
        .and(header("X-User", "T01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RemoteBackend::new(format!("{}/", server.uri())).unwrap();
    let pending = backend
        .enrollments("T01", "T01", Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert!(pending.is_empty());
}

async fn exercise<B: PortalBackend>(backend: &B, student: &str) -> RequestStatus {
    let enrollment = backend.request_enrollment(student, "admin", "Exam").await.unwrap();
    assert_eq!(enrollment.status, RequestStatus::Pending);
    let queue = backend
        .enrollments("admin", "admin", Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert!(queue.iter().any(|e| e.id == enrollment.id));
    backend
        .decide_enrollment("admin", enrollment.id, Decision::Approve)
        .await
        .unwrap()
        .status
}

#[tokio::test]
async fn local_and_remote_backends_agree() {
    let portal = Portal::seeded().await;
    portal.student("S001", "Ana Cruz").await;
    portal.student("S002", "Cy Lim").await;

    let state = AppState::new(portal.pool.clone(), portal.config.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    let local = LocalBackend::new(portal.pool.clone(), portal.config.clone());
    let remote = RemoteBackend::new(format!("http://{address}")).unwrap();

    assert_eq!(exercise(&local, "S001").await, RequestStatus::Approved);
    assert_eq!(exercise(&remote, "S002").await, RequestStatus::Approved);

    let user = remote.login("S002", "password").await.unwrap();
    assert_eq!(user.role, Role::Student);
    assert_eq!(remote.labs().await.unwrap().len(), local.labs().await.unwrap().len());

    let students = remote.users("admin", Some(Role::Student)).await.unwrap();
    assert_eq!(students.len(), 2);
}
