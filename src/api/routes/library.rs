use crate::api::routes::parse_status;
use crate::api::{Actor, AppState};
use crate::database::models::BookStatus;
use crate::error::PortalError;
use crate::workflows::lending::{BookForm, BorrowDecision};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BookQuery {
    pub status: Option<BookStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct BorrowPayload {
    pub barcode: String,
}

#[derive(Debug, Deserialize)]
pub struct LendPayload {
    pub barcode: String,
    pub borrower: String,
    pub due_in_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub open_only: bool,
}

// Catalogue

pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let books = state
        .lending()
        .list_books(query.status, query.search.as_deref())
        .await?;
    Ok(Json(books))
}

pub async fn lookup_book(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.lending().lookup_book(&barcode).await?))
}

pub async fn add_book(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<BookForm>,
) -> Result<impl IntoResponse, PortalError> {
    let books = state.lending().add_book(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(barcode): Path<String>,
    Json(payload): Json<BookUpdate>,
) -> Result<impl IntoResponse, PortalError> {
    let book = state
        .lending()
        .update_book(&actor, &barcode, &payload.title, &payload.author)
        .await?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse, PortalError> {
    state.lending().delete_book(&actor, &barcode).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Borrow requests

pub async fn list_borrow_requests(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let status = parse_status(query.status.as_deref())?;
    Ok(Json(state.lending().borrow_requests(&actor, status).await?))
}

pub async fn request_borrow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<BorrowPayload>,
) -> Result<impl IntoResponse, PortalError> {
    let request = state.lending().request_borrow(&actor, &payload.barcode).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn decide_borrow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(decision): Json<BorrowDecision>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.lending().decide_borrow(&actor, id, &decision).await?))
}

// Scan desk

pub async fn lend(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<LendPayload>,
) -> Result<impl IntoResponse, PortalError> {
    let record = state
        .lending()
        .lend_direct(&actor, &payload.barcode, &payload.borrower, payload.due_in_days)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn scan_return(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<BorrowPayload>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.lending().scan_return(&actor, &payload.barcode).await?))
}

pub async fn list_borrow_records(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<RecordQuery>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.lending().borrow_records(&actor, query.open_only).await?))
}

pub async fn overdue(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    if !actor.role.manages_library() {
        return Err(PortalError::forbidden("Only library staff can list overdue loans"));
    }
    Ok(Json(state.lending().overdue(Utc::now()).await?))
}
