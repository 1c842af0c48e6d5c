use crate::api::{Actor, AppState};
use crate::error::PortalError;
use crate::workflows::identity::RegisterForm;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub handle: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let user = state.identity().login(&payload.handle, &payload.password).await?;
    Ok(Json(user))
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, PortalError> {
    let user = state.identity().register(&form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    state.identity().logout(&actor).await?;
    Ok(Json(json!({ "message": "Signed out" })))
}
