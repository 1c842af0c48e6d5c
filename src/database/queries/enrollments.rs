use crate::database::models::{Enrollment, RequestStatus};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Default, Clone)]
pub struct EnrollmentFilter<'a> {
    pub student: Option<&'a str>,
    pub teacher: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub status: Option<RequestStatus>,
}

pub async fn insert_enrollment<'e, E>(
    executor: E,
    student: &str,
    teacher: &str,
    subject: &str,
    requested_at: DateTime<Utc>,
) -> sqlx::Result<Enrollment>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollments (student, teacher, subject, status, requested_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, student, teacher, subject, status, requested_at, decided_at",
    )
    .bind(student)
    .bind(teacher)
    .bind(subject)
    .bind(RequestStatus::Pending)
    .bind(requested_at)
    .fetch_one(executor)
    .await
}

pub async fn get_enrollment<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Enrollment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, student, teacher, subject, status, requested_at, decided_at
         FROM enrollments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_enrollments<'e, E>(
    executor: E,
    filter: &EnrollmentFilter<'_>,
) -> sqlx::Result<Vec<Enrollment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, student, teacher, subject, status, requested_at, decided_at
         FROM enrollments
         WHERE (?1 IS NULL OR student = ?1)
           AND (?2 IS NULL OR teacher = ?2)
           AND (?3 IS NULL OR subject = ?3)
           AND (?4 IS NULL OR status = ?4)
         ORDER BY requested_at DESC, id DESC",
    )
    .bind(filter.student)
    .bind(filter.teacher)
    .bind(filter.subject)
    .bind(filter.status)
    .fetch_all(executor)
    .await
}

/// Moves a pending enrollment to `to`; zero rows means it was not pending.
pub async fn transition_enrollment<'e, E>(
    executor: E,
    id: i64,
    to: RequestStatus,
    decided_at: DateTime<Utc>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE enrollments SET status = ?, decided_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(decided_at)
    .bind(id)
    .bind(RequestStatus::Pending)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn has_approved_enrollment<'e, E>(
    executor: E,
    student: &str,
    teacher: &str,
    subject: &str,
) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments
         WHERE student = ? AND teacher = ? AND subject = ? AND status = ?",
    )
    .bind(student)
    .bind(teacher)
    .bind(subject)
    .bind(RequestStatus::Approved)
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

pub async fn count_enrollments<'e, E>(
    executor: E,
    teacher: Option<&str>,
    status: RequestStatus,
) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE (?1 IS NULL OR teacher = ?1) AND status = ?2",
    )
    .bind(teacher)
    .bind(status)
    .fetch_one(executor)
    .await
}
