use crate::database::models::{Decision, Enrollment, RequestStatus, Role, User};
use crate::database::queries::enrollments::{self, EnrollmentFilter};
use crate::database::queries::{subjects, users};
use crate::error::{PortalError, Result};
use crate::utils::validation::require;
use crate::workflows::{audit, require_role};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

pub struct EnrollmentWorkflow {
    pool: SqlitePool,
}

impl EnrollmentWorkflow {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A student asks to join `subject` under `teacher`. Any earlier request
    /// for the same triple blocks a new one, whatever its outcome.
    pub async fn request(&self, actor: &User, teacher: &str, subject: &str) -> Result<Enrollment> {
        require_role(actor, actor.role == Role::Student, "request enrollment")?;
        let teacher = require("teacher", teacher)?;
        let subject = require("subject", subject)?;

        let owner = users::find_by_handle(&self.pool, teacher)
            .await?
            .filter(|u| u.role.can_teach())
            .ok_or_else(|| PortalError::not_found(format!("Teacher {teacher} not found")))?;
        if subjects::find_subject(&self.pool, &owner.handle, subject).await?.is_none() {
            return Err(PortalError::not_found(format!(
                "{teacher} does not teach {subject}"
            )));
        }

        let mut tx = self.pool.begin().await?;
        let existing = enrollments::list_enrollments(
            &mut *tx,
            &EnrollmentFilter {
                student: Some(&actor.handle),
                teacher: Some(teacher),
                subject: Some(subject),
                status: None,
            },
        )
        .await?;
        if let Some(previous) = existing.first() {
            return Err(PortalError::conflict(format!(
                "An enrollment for {subject} under {teacher} already exists ({})",
                previous.status
            )));
        }

        let enrollment =
            enrollments::insert_enrollment(&mut *tx, &actor.handle, teacher, subject, Utc::now())
                .await?;
        audit::record(
            &mut *tx,
            "Enrollment Requested",
            &actor.handle,
            json!({ "id": enrollment.id, "teacher": teacher, "subject": subject }),
        )
        .await?;
        tx.commit().await?;

        info!("{} requested {} under {}", actor.handle, subject, teacher);
        Ok(enrollment)
    }

    /// Pending -> Approved | Declined, by the owning teacher only.
    pub async fn decide(&self, actor: &User, id: i64, decision: Decision) -> Result<Enrollment> {
        let enrollment = self.get(id).await?;
        require_role(
            actor,
            enrollment.teacher == actor.handle,
            "decide another teacher's enrollment",
        )?;

        let outcome = decision.outcome();
        let mut tx = self.pool.begin().await?;
        let changed = enrollments::transition_enrollment(&mut *tx, id, outcome, Utc::now()).await?;
        if changed == 0 {
            let current = enrollments::get_enrollment(&mut *tx, id).await?;
            let status = current.map(|e| e.status).unwrap_or(enrollment.status);
            return Err(PortalError::conflict(format!(
                "Enrollment {id} is already {status}"
            )));
        }

        let action = match decision {
            Decision::Approve => "Enrollment Approved",
            Decision::Decline => "Enrollment Declined",
        };
        audit::record(
            &mut *tx,
            action,
            &actor.handle,
            json!({ "id": id, "student": enrollment.student, "subject": enrollment.subject }),
        )
        .await?;
        let updated = enrollments::get_enrollment(&mut *tx, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Enrollment {id} not found")))?;
        tx.commit().await?;

        info!("Enrollment {} {} by {}", id, outcome, actor.handle);
        Ok(updated)
    }

    pub async fn get(&self, id: i64) -> Result<Enrollment> {
        enrollments::get_enrollment(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Enrollment {id} not found")))
    }

    /// Teachers see their own queue; admins may look at anyone's.
    pub async fn for_teacher(
        &self,
        actor: &User,
        teacher: &str,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Enrollment>> {
        require_role(
            actor,
            actor.handle == teacher || actor.role == Role::Admin,
            "view another teacher's enrollments",
        )?;
        let filter = EnrollmentFilter {
            teacher: Some(teacher),
            status,
            ..Default::default()
        };
        Ok(enrollments::list_enrollments(&self.pool, &filter).await?)
    }

    pub async fn for_student(&self, student: &str) -> Result<Vec<Enrollment>> {
        let filter = EnrollmentFilter {
            student: Some(student),
            ..Default::default()
        };
        Ok(enrollments::list_enrollments(&self.pool, &filter).await?)
    }

    pub async fn approved_students(&self, teacher: &str, subject: Option<&str>) -> Result<Vec<Enrollment>> {
        let filter = EnrollmentFilter {
            teacher: Some(teacher),
            subject,
            status: Some(RequestStatus::Approved),
            ..Default::default()
        };
        Ok(enrollments::list_enrollments(&self.pool, &filter).await?)
    }

    /// The (teacher, subject) pairs a student may book under.
    pub async fn approved_subjects(&self, student: &str) -> Result<Vec<(String, String)>> {
        let filter = EnrollmentFilter {
            student: Some(student),
            status: Some(RequestStatus::Approved),
            ..Default::default()
        };
        Ok(enrollments::list_enrollments(&self.pool, &filter)
            .await?
            .into_iter()
            .map(|e| (e.teacher, e.subject))
            .collect())
    }
}
