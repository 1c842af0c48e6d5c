use crate::api::{Actor, AppState};
use crate::error::PortalError;
use crate::workflows::schedule::ReservationForm;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<ReservationQuery>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.schedule().list(&actor, query.date).await?))
}

pub async fn reserve(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<ReservationForm>,
) -> Result<impl IntoResponse, PortalError> {
    let reservation = state.schedule().reserve(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    state.schedule().cancel(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's classes for the current school day.
pub async fn today(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.schedule().today_classes(&actor.handle, Utc::now()).await?))
}
