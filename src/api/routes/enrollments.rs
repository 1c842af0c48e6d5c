use crate::api::routes::{ActionBody, parse_status};
use crate::api::{Actor, AppState};
use crate::error::PortalError;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EnrollmentQuery {
    pub teacher_usn: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub teacher: String,
    pub subject: String,
}

/// A teacher's enrollment queue; defaults to the caller's own.
pub async fn list_enrollments(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<EnrollmentQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let status = parse_status(query.status.as_deref())?;
    let teacher = query.teacher_usn.as_deref().unwrap_or(&actor.handle);
    let enrollments = state.enrollment().for_teacher(&actor, teacher, status).await?;
    Ok(Json(enrollments))
}

pub async fn my_enrollments(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, PortalError> {
    Ok(Json(state.enrollment().for_student(&actor.handle).await?))
}

#[derive(Debug, Deserialize)]
pub struct StudentsQuery {
    pub subject: Option<String>,
}

/// Students with an approved enrollment under the caller.
pub async fn approved_students(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<StudentsQuery>,
) -> Result<impl IntoResponse, PortalError> {
    let students = state
        .enrollment()
        .approved_students(&actor.handle, query.subject.as_deref())
        .await?;
    Ok(Json(students))
}

pub async fn request_enrollment(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<impl IntoResponse, PortalError> {
    let enrollment = state
        .enrollment()
        .request(&actor, &payload.teacher, &payload.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn decide_enrollment(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(body): Json<ActionBody>,
) -> Result<impl IntoResponse, PortalError> {
    let decision = body.decision()?;
    Ok(Json(state.enrollment().decide(&actor, id, decision).await?))
}
