use crate::api::{Actor, AppState};
use crate::database::models::PcStatus;
use crate::error::PortalError;
use crate::workflows::facilities::FacilityForm;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RenameLab {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PcStatusUpdate {
    pub status: PcStatus,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

// Labs

pub async fn list_labs(State(state): State<AppState>) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.facilities().list_labs().await?))
}

pub async fn get_lab(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.facilities().get_lab(id).await?))
}

pub async fn add_lab(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<FacilityForm>,
) -> Result<impl IntoResponse, PortalError> {
    let lab = state.facilities().add_lab(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(lab)))
}

pub async fn rename_lab(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(payload): Json<RenameLab>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.facilities().rename_lab(&actor, id, &payload.name).await?))
}

pub async fn delete_lab(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    state.facilities().delete_lab(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every PC with its derived availability.
pub async fn lab_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.sessions().lab_status(id).await?))
}

pub async fn available_pcs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.booking().available_pcs(id).await?))
}

pub async fn set_pc_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((id, number)): Path<(i64, i64)>,
    Json(payload): Json<PcStatusUpdate>,
) -> Result<impl IntoResponse, PortalError> {
    let pc = state
        .facilities()
        .set_pc_status(&actor, id, number, payload.status)
        .await?;
    Ok(Json(pc))
}

pub async fn pc_history(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Path((id, number)): Path<(i64, i64)>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.sessions().pc_history(id, number, query.limit).await?))
}

// Rooms

pub async fn list_rooms(State(state): State<AppState>) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.facilities().list_rooms().await?))
}

pub async fn add_room(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<FacilityForm>,
) -> Result<impl IntoResponse, PortalError> {
    let room = state.facilities().add_room(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update_room(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(form): Json<FacilityForm>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.facilities().update_room(&actor, id, &form).await?))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    state.facilities().delete_room(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
