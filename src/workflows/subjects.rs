use crate::database::models::{Role, ScheduleEntry, Subject, SubjectWithSchedules, User};
use crate::database::queries::{subjects, users};
use crate::error::{PortalError, Result};
use crate::utils::time::{parse_weekday, weekday_label};
use crate::utils::validation::{require, validate_time_order};
use crate::workflows::{audit, is_unique_violation, require_role};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleForm {
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct SubjectCatalog {
    pool: SqlitePool,
}

impl SubjectCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Teachers add subjects for themselves; admins may name another teacher.
    pub async fn add_subject(&self, actor: &User, teacher: Option<&str>, name: &str) -> Result<Subject> {
        require_role(actor, actor.role.can_teach(), "own subjects")?;
        let name = require("subject name", name)?;
        let teacher = match teacher.map(str::trim).filter(|t| !t.is_empty()) {
            Some(other) if other != actor.handle => {
                require_role(
                    actor,
                    actor.role == Role::Admin,
                    "add subjects for another teacher",
                )?;
                let owner = users::find_by_handle(&self.pool, other)
                    .await?
                    .ok_or_else(|| PortalError::not_found(format!("Teacher {other} not found")))?;
                if !owner.role.can_teach() {
                    return Err(PortalError::validation(format!("{other} is not a teacher")));
                }
                owner.handle
            }
            _ => actor.handle.clone(),
        };

        let subject = subjects::insert_subject(&self.pool, &teacher, name)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortalError::conflict(format!("{teacher} already teaches {name}"))
                } else {
                    e.into()
                }
            })?;
        audit::record(
            &self.pool,
            "Subject Added",
            &actor.handle,
            json!({ "teacher": subject.teacher, "subject": subject.name }),
        )
        .await?;
        Ok(subject)
    }

    pub async fn delete_subject(&self, actor: &User, id: i64) -> Result<()> {
        let subject = self.owned_subject(actor, id).await?;
        subjects::delete_subject(&self.pool, subject.id).await?;
        audit::record(
            &self.pool,
            "Subject Removed",
            &actor.handle,
            json!({ "teacher": subject.teacher, "subject": subject.name }),
        )
        .await?;
        Ok(())
    }

    pub async fn add_schedule(&self, actor: &User, subject_id: i64, form: &ScheduleForm) -> Result<ScheduleEntry> {
        let subject = self.owned_subject(actor, subject_id).await?;
        let day = parse_weekday(&form.day)?;
        validate_time_order(form.start_time, form.end_time)?;

        Ok(subjects::insert_schedule(
            &self.pool,
            subject.id,
            weekday_label(day),
            form.start_time,
            form.end_time,
        )
        .await?)
    }

    pub async fn remove_schedule(&self, actor: &User, schedule_id: i64) -> Result<()> {
        let entry = subjects::get_schedule(&self.pool, schedule_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Schedule {schedule_id} not found")))?;
        self.owned_subject(actor, entry.subject_id).await?;
        subjects::delete_schedule(&self.pool, entry.id).await?;
        Ok(())
    }

    pub async fn list_subjects(&self, teacher: Option<&str>) -> Result<Vec<SubjectWithSchedules>> {
        let subjects = subjects::list_subjects(&self.pool, teacher).await?;
        let mut schedules: HashMap<i64, Vec<ScheduleEntry>> = HashMap::new();
        for entry in subjects::list_schedules(&self.pool).await? {
            schedules.entry(entry.subject_id).or_default().push(entry);
        }

        Ok(subjects
            .into_iter()
            .map(|subject| SubjectWithSchedules {
                schedules: schedules.remove(&subject.id).unwrap_or_default(),
                subject,
            })
            .collect())
    }

    async fn owned_subject(&self, actor: &User, id: i64) -> Result<Subject> {
        let subject = subjects::get_subject(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Subject {id} not found")))?;
        let is_owner = subject.teacher == actor.handle;
        require_role(
            actor,
            is_owner || actor.role == Role::Admin,
            "change another teacher's subject",
        )?;
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::connect_in_memory;
    use crate::database::seed::seed_defaults;
    use chrono::Utc;

    fn user(handle: &str, role: Role) -> User {
        User {
            handle: handle.to_string(),
            name: handle.to_string(),
            email: format!("{handle}@test"),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn teachers_manage_their_own_subjects() {
        let pool = connect_in_memory().await.unwrap();
        seed_defaults(&pool, &Config::default()).await.unwrap();
        let catalog = SubjectCatalog::new(pool);
        let admin = user("admin", Role::Admin);
        let student = user("S001", Role::Student);

        let exam = catalog.list_subjects(Some("admin")).await.unwrap();
        assert_eq!(exam.len(), 2);

        assert!(matches!(
            catalog.add_subject(&student, None, "Algebra").await.unwrap_err(),
            PortalError::Forbidden(_)
        ));

        let stats = catalog.add_subject(&admin, None, "Statistics").await.unwrap();
        assert!(matches!(
            catalog.add_subject(&admin, None, "Statistics").await.unwrap_err(),
            PortalError::Conflict(_)
        ));

        let form = ScheduleForm {
            day: "monday".to_string(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        };
        let entry = catalog.add_schedule(&admin, stats.id, &form).await.unwrap();
        assert_eq!(entry.day, "Mon");

        let listed = catalog.list_subjects(Some("admin")).await.unwrap();
        let with_schedule = listed.iter().find(|s| s.subject.name == "Statistics").unwrap();
        assert_eq!(with_schedule.schedules.len(), 1);
    }
}
