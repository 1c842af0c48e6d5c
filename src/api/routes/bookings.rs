use crate::api::routes::{ActionBody, parse_status};
use crate::api::{Actor, AppState};
use crate::error::PortalError;
use crate::workflows::booking::BookingForm;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
}

pub async fn list_requests(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<RequestQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let status = parse_status(query.status.as_deref())?;
    Ok(Json(state.booking().list(&actor, status).await?))
}

/// The caller's own queue of undecided requests.
pub async fn pending_requests(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.booking().pending_for_teacher(&actor.handle).await?))
}

pub async fn create_request(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<BookingForm>,
) -> Result<impl IntoResponse, PortalError> {
    let request = state.booking().create_request(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn decide_request(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(body): Json<ActionBody>,
) -> Result<impl IntoResponse, PortalError> {
    let decision = body.decision()?;
    Ok(Json(state.booking().decide(&actor, id, decision).await?))
}
