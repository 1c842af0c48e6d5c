use crate::api::{Actor, AppState};
use crate::database::models::Role;
use crate::error::PortalError;
use crate::workflows::identity::RegisterForm;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

/// Any signed-in user may browse accounts; credentials are never serialized.
pub async fn list_users(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.identity().list_users(query.role).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.identity().get_user(&handle).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, PortalError> {
    let user = state.identity().create_user(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, PortalError> {
    state.identity().delete_user(&actor, &handle).await?;
    Ok(StatusCode::NO_CONTENT)
}
