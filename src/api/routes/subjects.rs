use crate::api::{Actor, AppState};
use crate::error::PortalError;
use crate::workflows::subjects::ScheduleForm;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub teacher: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub teacher: Option<String>,
}

pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let subjects = state.subjects().list_subjects(query.teacher.as_deref()).await?;
    Ok(Json(subjects))
}

pub async fn add_subject(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<NewSubject>,
) -> Result<impl IntoResponse, PortalError> {
    let subject = state
        .subjects()
        .add_subject(&actor, payload.teacher.as_deref(), &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    state.subjects().delete_subject(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_schedule(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(form): Json<ScheduleForm>,
) -> Result<impl IntoResponse, PortalError> {
    let entry = state.subjects().add_schedule(&actor, id, &form).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_schedule(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    state.subjects().remove_schedule(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
