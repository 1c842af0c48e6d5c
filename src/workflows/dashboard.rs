use crate::database::models::{BookStatus, RequestStatus, Role, User};
use crate::database::queries::enrollments::{self, EnrollmentFilter};
use crate::database::queries::{bookings, facilities, library, sessions, users};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub users_by_role: BTreeMap<String, i64>,
    pub pending_requests: i64,
    pub active_sessions: i64,
    pub labs: i64,
    pub rooms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherStats {
    pub pending_enrollments: i64,
    pub pending_requests: i64,
    pub enrolled_students: i64,
    pub active_sessions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    pub pending_borrow_requests: i64,
    pub overdue_records: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentStats {
    pub pending_enrollments: i64,
    pub approved_subjects: i64,
    pub active_sessions: i64,
    pub open_loans: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dashboard", rename_all = "snake_case")]
pub enum DashboardView {
    Admin(AdminStats),
    Teacher(TeacherStats),
    Library(LibraryStats),
    Student(StudentStats),
}

pub struct Dashboard {
    pool: SqlitePool,
}

impl Dashboard {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn for_actor(&self, actor: &User, now: DateTime<Utc>) -> Result<DashboardView> {
        sessions::deactivate_expired(&self.pool, now).await?;
        Ok(match actor.role {
            Role::Admin => DashboardView::Admin(self.admin().await?),
            Role::Teacher => DashboardView::Teacher(self.teacher(&actor.handle).await?),
            Role::LibraryAdmin => DashboardView::Library(self.library(now).await?),
            Role::Student => DashboardView::Student(self.student(&actor.handle).await?),
        })
    }

    pub async fn admin(&self) -> Result<AdminStats> {
        let users_by_role = users::count_by_role(&self.pool)
            .await?
            .into_iter()
            .map(|(role, count)| (role.as_str().to_string(), count))
            .collect();
        Ok(AdminStats {
            users_by_role,
            pending_requests: bookings::count_requests(&self.pool, None, RequestStatus::Pending).await?,
            active_sessions: sessions::count_active_sessions(&self.pool, None).await?,
            labs: facilities::count_labs(&self.pool).await?,
            rooms: facilities::count_rooms(&self.pool).await?,
        })
    }

    pub async fn teacher(&self, teacher: &str) -> Result<TeacherStats> {
        let approved = enrollments::list_enrollments(
            &self.pool,
            &EnrollmentFilter {
                teacher: Some(teacher),
                status: Some(RequestStatus::Approved),
                ..Default::default()
            },
        )
        .await?;
        let students: HashSet<&str> = approved.iter().map(|e| e.student.as_str()).collect();

        Ok(TeacherStats {
            pending_enrollments: enrollments::count_enrollments(
                &self.pool,
                Some(teacher),
                RequestStatus::Pending,
            )
            .await?,
            pending_requests: bookings::count_requests(&self.pool, Some(teacher), RequestStatus::Pending)
                .await?,
            enrolled_students: students.len() as i64,
            active_sessions: sessions::count_active_sessions(&self.pool, Some(teacher)).await?,
        })
    }

    pub async fn library(&self, now: DateTime<Utc>) -> Result<LibraryStats> {
        let open = library::list_borrow_records(&self.pool, None, true).await?;
        Ok(LibraryStats {
            total_books: library::count_books(&self.pool, None).await?,
            available_books: library::count_books(&self.pool, Some(BookStatus::Available)).await?,
            borrowed_books: library::count_books(&self.pool, Some(BookStatus::Borrowed)).await?,
            pending_borrow_requests: library::count_borrow_requests(&self.pool, RequestStatus::Pending)
                .await?,
            overdue_records: open.iter().filter(|r| r.due_date < now).count() as i64,
        })
    }

    pub async fn student(&self, student: &str) -> Result<StudentStats> {
        let mine = enrollments::list_enrollments(
            &self.pool,
            &EnrollmentFilter {
                student: Some(student),
                ..Default::default()
            },
        )
        .await?;
        let count = |status: RequestStatus| mine.iter().filter(|e| e.status == status).count() as i64;
        let active = sessions::list_sessions(
            &self.pool,
            &sessions::SessionFilter {
                student: Some(student),
                active_only: true,
                ..Default::default()
            },
        )
        .await?;

        Ok(StudentStats {
            pending_enrollments: count(RequestStatus::Pending),
            approved_subjects: count(RequestStatus::Approved),
            active_sessions: active.len() as i64,
            open_loans: library::list_borrow_records(&self.pool, Some(student), true)
                .await?
                .len() as i64,
        })
    }
}
