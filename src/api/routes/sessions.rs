use crate::api::{Actor, AppState};
use crate::error::PortalError;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.sessions().list(&actor, query.active_only).await?))
}

pub async fn end_session(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.sessions().end_session(&actor, id).await?))
}
