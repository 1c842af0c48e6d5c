use crate::api::{Actor, AppState};
use crate::database::queries::audit::AuditFilter;
use crate::error::PortalError;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub limit: Option<i64>,
}

pub async fn audit_log(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let filter = AuditFilter {
        actor: query.actor.as_deref(),
        action: query.action.as_deref(),
    };
    Ok(Json(state.audit().list(&actor, &filter, query.limit).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.dashboard().for_actor(&actor, Utc::now()).await?))
}
