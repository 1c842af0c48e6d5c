use crate::config::Config;
use crate::database::models::{
    BookingRequest, Decision, PcStatus, RequestStatus, ResourceKind, Role, Session, User,
};
use crate::database::queries::bookings::{self, BookingFilter, NewBookingRequest};
use crate::database::queries::sessions::{self as session_queries, NewPcHistory};
use crate::database::queries::{enrollments, facilities, users};
use crate::error::{PortalError, Result};
use crate::utils::validation::{optional_text, require, validate_time_order};
use crate::workflows::{audit, is_unique_violation, require_role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

/// What a booking asks for: one PC in a lab, or a whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceSelection {
    Lab { lab_id: i64, pc_number: i64 },
    Room { room_id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingForm {
    pub teacher: String,
    pub subject: String,
    pub resource: ResourceSelection,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDecision {
    pub request: BookingRequest,
    pub session: Option<Session>,
}

struct ResolvedResource {
    kind: ResourceKind,
    lab_id: Option<i64>,
    room_id: Option<i64>,
    name: String,
    pc_number: Option<i64>,
}

pub struct BookingWorkflow {
    pool: SqlitePool,
    config: Config,
}

impl BookingWorkflow {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    pub async fn create_request(&self, actor: &User, form: &BookingForm) -> Result<BookingRequest> {
        require_role(actor, actor.role == Role::Student, "request a booking")?;
        let teacher = require("teacher", &form.teacher)?;
        let subject = require("subject", &form.subject)?;
        validate_time_order(form.start_time, form.end_time)?;

        if !enrollments::has_approved_enrollment(&self.pool, &actor.handle, teacher, subject).await? {
            return Err(PortalError::validation(format!(
                "You need an approved enrollment in {subject} under {teacher} before booking"
            )));
        }

        let reason = optional_text(form.reason.as_deref());
        if reason.is_none() && self.config.personal_use.applies_to(teacher, subject) {
            return Err(PortalError::validation(format!(
                "A reason is required for {subject} bookings"
            )));
        }

        let mut tx = self.pool.begin().await?;
        session_queries::deactivate_expired(&mut *tx, Utc::now()).await?;
        let resource = match form.resource {
            ResourceSelection::Lab { lab_id, pc_number } => {
                let lab = facilities::get_lab(&mut *tx, lab_id)
                    .await?
                    .ok_or_else(|| PortalError::not_found(format!("Lab {lab_id} not found")))?;
                let pc = facilities::get_pc(&mut *tx, lab_id, pc_number)
                    .await?
                    .ok_or_else(|| {
                        PortalError::not_found(format!("{} has no PC {pc_number}", lab.name))
                    })?;
                if pc.status == PcStatus::OutOfService {
                    return Err(PortalError::conflict(format!(
                        "PC {pc_number} in {} is out of service",
                        lab.name
                    )));
                }
                if session_queries::active_session_on_pc(&mut *tx, lab_id, pc_number)
                    .await?
                    .is_some()
                {
                    return Err(PortalError::conflict(format!(
                        "PC {pc_number} in {} is in use",
                        lab.name
                    )));
                }
                ResolvedResource {
                    kind: ResourceKind::Lab,
                    lab_id: Some(lab.id),
                    room_id: None,
                    name: lab.name,
                    pc_number: Some(pc_number),
                }
            }
            ResourceSelection::Room { room_id } => {
                let room = facilities::get_room(&mut *tx, room_id)
                    .await?
                    .ok_or_else(|| PortalError::not_found(format!("Room {room_id} not found")))?;
                ResolvedResource {
                    kind: ResourceKind::Room,
                    lab_id: None,
                    room_id: Some(room.id),
                    name: room.name,
                    pc_number: None,
                }
            }
        };

        let new_request = NewBookingRequest {
            student: &actor.handle,
            teacher,
            subject,
            resource_kind: resource.kind,
            lab_id: resource.lab_id,
            room_id: resource.room_id,
            resource_name: &resource.name,
            pc_number: resource.pc_number,
            start_time: form.start_time,
            end_time: form.end_time,
            reason,
        };
        let request = bookings::insert_request(&mut *tx, &new_request, Utc::now()).await?;
        audit::record(
            &mut *tx,
            "Request Created",
            &actor.handle,
            json!({
                "id": request.id,
                "subject": request.subject,
                "resource": request.resource_name,
                "pc": request.pc_number,
            }),
        )
        .await?;
        tx.commit().await?;

        info!(
            "{} requested {} for {} under {}",
            actor.handle, request.resource_name, subject, teacher
        );
        Ok(request)
    }

    /// Approving spawns exactly one session (and a PC history entry for
    /// labs) in the same transaction as the status change.
    pub async fn decide(&self, actor: &User, id: i64, decision: Decision) -> Result<BookingDecision> {
        let request = self.get(id).await?;
        require_role(
            actor,
            request.teacher == actor.handle || actor.role == Role::Admin,
            "decide another teacher's booking",
        )?;

        let now = Utc::now();
        let outcome = decision.outcome();
        let mut tx = self.pool.begin().await?;
        let changed =
            bookings::transition_request(&mut *tx, id, outcome, &actor.handle, now).await?;
        if changed == 0 {
            let status = bookings::get_request(&mut *tx, id)
                .await?
                .map(|r| r.status)
                .unwrap_or(request.status);
            return Err(PortalError::conflict(format!("Request {id} is already {status}")));
        }

        let mut session = None;
        if decision == Decision::Approve {
            session_queries::deactivate_expired(&mut *tx, now).await?;
            if let (Some(lab_id), Some(pc_number)) = (request.lab_id, request.pc_number) {
                if let Some(holder) =
                    session_queries::active_session_on_pc(&mut *tx, lab_id, pc_number).await?
                {
                    warn!(
                        "Request {} refused: PC {} in {} held by session {}",
                        id, pc_number, request.resource_name, holder.id
                    );
                    return Err(PortalError::conflict(format!(
                        "PC {pc_number} in {} is already in use",
                        request.resource_name
                    )));
                }
            }

            let created = session_queries::insert_session_for_request(&mut *tx, &request)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        PortalError::conflict(format!(
                            "PC {} in {} is already in use",
                            request.pc_number.unwrap_or_default(),
                            request.resource_name
                        ))
                    } else {
                        e.into()
                    }
                })?;

            if let (Some(lab_id), Some(pc_number)) = (request.lab_id, request.pc_number) {
                let student_name = users::find_by_handle(&mut *tx, &request.student)
                    .await?
                    .map(|u| u.name)
                    .unwrap_or_else(|| request.student.clone());
                let entry = NewPcHistory {
                    lab_id,
                    lab_name: &request.resource_name,
                    pc_number,
                    student: &request.student,
                    student_name: &student_name,
                    teacher: &request.teacher,
                    subject: &request.subject,
                    start_time: request.start_time,
                    end_time: request.end_time,
                };
                session_queries::insert_pc_history(&mut *tx, &entry, now).await?;
            }
            session = Some(created);
        }

        let action = match decision {
            Decision::Approve => "Request Approved",
            Decision::Decline => "Request Declined",
        };
        audit::record(
            &mut *tx,
            action,
            &actor.handle,
            json!({ "id": id, "student": request.student, "resource": request.resource_name }),
        )
        .await?;
        let updated = bookings::get_request(&mut *tx, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Request {id} not found")))?;
        tx.commit().await?;

        info!("Request {} {} by {}", id, outcome, actor.handle);
        Ok(BookingDecision {
            request: updated,
            session,
        })
    }

    pub async fn get(&self, id: i64) -> Result<BookingRequest> {
        bookings::get_request(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Request {id} not found")))
    }

    /// Students see their own requests, teachers the ones addressed to
    /// them, admins everything.
    pub async fn list(&self, actor: &User, status: Option<RequestStatus>) -> Result<Vec<BookingRequest>> {
        let filter = match actor.role {
            Role::Student => BookingFilter {
                student: Some(&actor.handle),
                status,
                ..Default::default()
            },
            Role::Teacher => BookingFilter {
                teacher: Some(&actor.handle),
                status,
                ..Default::default()
            },
            Role::Admin => BookingFilter {
                status,
                ..Default::default()
            },
            Role::LibraryAdmin => {
                return Err(PortalError::forbidden("Library admins have no booking queue"));
            }
        };
        Ok(bookings::list_requests(&self.pool, &filter).await?)
    }

    pub async fn pending_for_teacher(&self, teacher: &str) -> Result<Vec<BookingRequest>> {
        let filter = BookingFilter {
            teacher: Some(teacher),
            status: Some(RequestStatus::Pending),
            ..Default::default()
        };
        Ok(bookings::list_requests(&self.pool, &filter).await?)
    }

    /// PCs that are in service and not held by an active session.
    pub async fn available_pcs(&self, lab_id: i64) -> Result<Vec<i64>> {
        let lab = facilities::get_lab(&self.pool, lab_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Lab {lab_id} not found")))?;
        session_queries::deactivate_expired(&self.pool, Utc::now()).await?;

        let occupied: HashSet<i64> = session_queries::list_sessions(
            &self.pool,
            &session_queries::SessionFilter {
                lab_id: Some(lab.id),
                active_only: true,
                ..Default::default()
            },
        )
        .await?
        .into_iter()
        .filter_map(|s| s.pc_number)
        .collect();

        Ok(facilities::list_pcs(&self.pool, lab.id)
            .await?
            .into_iter()
            .filter(|pc| pc.status == PcStatus::Available && !occupied.contains(&pc.number))
            .map(|pc| pc.number)
            .collect())
    }
}
