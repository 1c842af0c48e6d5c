use crate::config::Config;
use crate::database::models::{RequestStatus, Reservation, ResourceKind, Role, User};
use crate::database::queries::enrollments::{self, EnrollmentFilter};
use crate::database::queries::reservations::{self, NewReservation};
use crate::database::queries::{facilities, subjects};
use crate::error::{PortalError, Result};
use crate::utils::time::{local_date_of, local_time_of, school_offset, weekday_label};
use crate::utils::validation::{require, validate_time_order};
use crate::workflows::{audit, require_role};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationForm {
    pub subject: String,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassStatus {
    Ongoing,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayClass {
    pub subject: String,
    pub teacher: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ClassStatus,
    pub location: Option<String>,
}

pub struct ScheduleBoard {
    pool: SqlitePool,
    config: Config,
}

impl ScheduleBoard {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    /// A teacher books a room or lab for one of their subjects.
    pub async fn reserve(&self, actor: &User, form: &ReservationForm) -> Result<Reservation> {
        require_role(actor, actor.role.can_teach(), "reserve facilities")?;
        let subject = require("subject", &form.subject)?;
        validate_time_order(form.start_time, form.end_time)?;

        if subjects::find_subject(&self.pool, &actor.handle, subject).await?.is_none() {
            return Err(PortalError::not_found(format!("You do not teach {subject}")));
        }

        let resource_name = match form.resource_kind {
            ResourceKind::Lab => facilities::get_lab(&self.pool, form.resource_id)
                .await?
                .map(|lab| lab.name),
            ResourceKind::Room => facilities::get_room(&self.pool, form.resource_id)
                .await?
                .map(|room| room.name),
        }
        .ok_or_else(|| {
            PortalError::not_found(format!(
                "{} {} not found",
                form.resource_kind.as_str(),
                form.resource_id
            ))
        })?;

        let new_reservation = NewReservation {
            teacher: &actor.handle,
            subject,
            resource_kind: form.resource_kind,
            resource_id: form.resource_id,
            resource_name: &resource_name,
            date: form.date,
            start_time: form.start_time,
            end_time: form.end_time,
        };
        let mut tx = self.pool.begin().await?;
        let reservation =
            reservations::insert_reservation(&mut *tx, &new_reservation, Utc::now()).await?;
        audit::record(
            &mut *tx,
            "Reservation Created",
            &actor.handle,
            json!({
                "id": reservation.id,
                "subject": reservation.subject,
                "resource": reservation.resource_name,
                "date": reservation.date,
            }),
        )
        .await?;
        tx.commit().await?;
        Ok(reservation)
    }

    pub async fn cancel(&self, actor: &User, id: i64) -> Result<()> {
        let reservation = reservations::get_reservation(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Reservation {id} not found")))?;
        require_role(
            actor,
            reservation.teacher == actor.handle || actor.role == Role::Admin,
            "cancel another teacher's reservation",
        )?;
        reservations::delete_reservation(&self.pool, id).await?;
        audit::record(&self.pool, "Reservation Cancelled", &actor.handle, json!({ "id": id })).await?;
        Ok(())
    }

    pub async fn list(&self, actor: &User, date: Option<NaiveDate>) -> Result<Vec<Reservation>> {
        let teacher = (actor.role != Role::Admin && actor.role.can_teach())
            .then_some(actor.handle.as_str());
        Ok(reservations::list_reservations(&self.pool, teacher, date).await?)
    }

    /// The student's classes for today (school-local) that have not ended,
    /// with the reserved location when the teacher booked one.
    pub async fn today_classes(&self, student: &str, now: DateTime<Utc>) -> Result<Vec<TodayClass>> {
        let offset = school_offset(self.config.utc_offset_hours);
        let today = local_date_of(now, offset);
        let now_time = local_time_of(now, offset);
        let day = weekday_label(today.weekday());

        let approved = enrollments::list_enrollments(
            &self.pool,
            &EnrollmentFilter {
                student: Some(student),
                status: Some(RequestStatus::Approved),
                ..Default::default()
            },
        )
        .await?;
        let todays_reservations = reservations::list_reservations(&self.pool, None, Some(today)).await?;

        let mut classes = Vec::new();
        for enrollment in approved {
            let Some(subject) =
                subjects::find_subject(&self.pool, &enrollment.teacher, &enrollment.subject).await?
            else {
                continue;
            };
            let location = todays_reservations
                .iter()
                .find(|r| r.teacher == enrollment.teacher && r.subject == enrollment.subject)
                .map(|r| r.resource_name.clone());

            for entry in subjects::schedules_for_subject(&self.pool, subject.id).await? {
                if entry.day != day || entry.end_time <= now_time {
                    continue;
                }
                let status = if entry.start_time <= now_time {
                    ClassStatus::Ongoing
                } else {
                    ClassStatus::Upcoming
                };
                classes.push(TodayClass {
                    subject: enrollment.subject.clone(),
                    teacher: enrollment.teacher.clone(),
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    status,
                    location: location.clone(),
                });
            }
        }

        classes.sort_by_key(|c| c.start_time);
        Ok(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;
    use crate::database::models::Decision;
    use crate::database::seed::seed_defaults;
    use crate::workflows::enrollment::EnrollmentWorkflow;
    use crate::workflows::identity::{Identity, RegisterForm};
    use crate::workflows::subjects::{ScheduleForm, SubjectCatalog};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    struct Fixture {
        board: ScheduleBoard,
        teacher: User,
        room_id: i64,
    }

    /// T01 teaches Algebra (Mon 07:00, 09:00 and 13:00 slots, Tue 10:00)
    /// and S001 holds an approved enrollment.
    async fn fixture() -> Fixture {
        let pool = connect_in_memory().await.unwrap();
        let config = Config::default();
        seed_defaults(&pool, &config).await.unwrap();

        let identity = Identity::new(pool.clone(), config.clone());
        let register = |handle: &str, role: Role| RegisterForm {
            handle: handle.to_string(),
            name: handle.to_string(),
            password: "pw".to_string(),
            role,
            email: None,
            registration_code: Some(config.teacher_registration_code.clone()),
        };
        let teacher = identity.register(&register("T01", Role::Teacher)).await.unwrap();
        let student = identity.register(&register("S001", Role::Student)).await.unwrap();

        let catalog = SubjectCatalog::new(pool.clone());
        let algebra = catalog.add_subject(&teacher, None, "Algebra").await.unwrap();
        for (day, start, end) in [
            ("Monday", at(7, 0), at(8, 0)),
            ("Monday", at(9, 0), at(11, 0)),
            ("Monday", at(13, 0), at(14, 0)),
            ("Tuesday", at(10, 0), at(11, 0)),
        ] {
            let form = ScheduleForm {
                day: day.to_string(),
                start_time: start,
                end_time: end,
            };
            catalog.add_schedule(&teacher, algebra.id, &form).await.unwrap();
        }

        let enrollment = EnrollmentWorkflow::new(pool.clone());
        let pending = enrollment.request(&student, "T01", "Algebra").await.unwrap();
        enrollment.decide(&teacher, pending.id, Decision::Approve).await.unwrap();

        let room_id = facilities::find_room_by_name(&pool, "Room 101")
            .await
            .unwrap()
            .unwrap()
            .id;
        Fixture {
            board: ScheduleBoard::new(pool, config),
            teacher,
            room_id,
        }
    }

    fn room_form(room_id: i64) -> ReservationForm {
        ReservationForm {
            subject: "Algebra".to_string(),
            resource_kind: ResourceKind::Room,
            resource_id: room_id,
            date: monday(),
            start_time: at(9, 0),
            end_time: at(11, 0),
        }
    }

    #[tokio::test]
    async fn todays_classes_split_ongoing_and_upcoming() {
        let fx = fixture().await;
        fx.board.reserve(&fx.teacher, &room_form(fx.room_id)).await.unwrap();

        // 10:00 school time (UTC+8) on Monday
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        let classes = fx.board.today_classes("S001", now).await.unwrap();

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].start_time, at(9, 0));
        assert_eq!(classes[0].status, ClassStatus::Ongoing);
        assert_eq!(classes[0].location.as_deref(), Some("Room 101"));
        assert_eq!(classes[1].start_time, at(13, 0));
        assert_eq!(classes[1].status, ClassStatus::Upcoming);
    }

    #[tokio::test]
    async fn the_school_day_is_local() {
        let fx = fixture().await;

        // Still Sunday in UTC, already 07:30 Monday at school
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap();
        let classes = fx.board.today_classes("S001", now).await.unwrap();

        assert_eq!(classes.len(), 3);
        assert_eq!(classes[0].start_time, at(7, 0));
        assert_eq!(classes[0].status, ClassStatus::Ongoing);
        assert!(classes.iter().all(|c| c.location.is_none()));

        assert!(fx.board.today_classes("S999", now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reservations_belong_to_their_teacher() {
        let fx = fixture().await;
        let other = User {
            handle: "T02".to_string(),
            ..fx.teacher.clone()
        };
        let student = User {
            handle: "S001".to_string(),
            role: Role::Student,
            ..fx.teacher.clone()
        };
        let admin = User {
            handle: "admin".to_string(),
            role: Role::Admin,
            ..fx.teacher.clone()
        };

        assert!(matches!(
            fx.board.reserve(&student, &room_form(fx.room_id)).await.unwrap_err(),
            PortalError::Forbidden(_)
        ));
        assert!(matches!(
            fx.board.reserve(&other, &room_form(fx.room_id)).await.unwrap_err(),
            PortalError::NotFound(_)
        ));

        let reservation = fx.board.reserve(&fx.teacher, &room_form(fx.room_id)).await.unwrap();
        assert_eq!(reservation.resource_name, "Room 101");
        assert_eq!(fx.board.list(&fx.teacher, Some(monday())).await.unwrap().len(), 1);
        assert!(fx.board.list(&other, None).await.unwrap().is_empty());

        assert!(matches!(
            fx.board.cancel(&other, reservation.id).await.unwrap_err(),
            PortalError::Forbidden(_)
        ));
        fx.board.cancel(&admin, reservation.id).await.unwrap();
        assert!(matches!(
            fx.board.cancel(&fx.teacher, reservation.id).await.unwrap_err(),
            PortalError::NotFound(_)
        ));
    }
}
