use crate::database::models::{BookingRequest, RequestStatus, ResourceKind};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

const REQUEST_COLUMNS: &str = "id, student, teacher, subject, resource_kind, lab_id, room_id, \
     resource_name, pc_number, start_time, end_time, status, reason, requested_at, decided_at, decided_by";

pub struct NewBookingRequest<'a> {
    pub student: &'a str,
    pub teacher: &'a str,
    pub subject: &'a str,
    pub resource_kind: ResourceKind,
    pub lab_id: Option<i64>,
    pub room_id: Option<i64>,
    pub resource_name: &'a str,
    pub pc_number: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<&'a str>,
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter<'a> {
    pub student: Option<&'a str>,
    pub teacher: Option<&'a str>,
    pub status: Option<RequestStatus>,
}

pub async fn insert_request<'e, E>(
    executor: E,
    request: &NewBookingRequest<'_>,
    requested_at: DateTime<Utc>,
) -> sqlx::Result<BookingRequest>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO booking_requests
            (student, teacher, subject, resource_kind, lab_id, room_id, resource_name,
             pc_number, start_time, end_time, status, reason, requested_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {REQUEST_COLUMNS}"
    );
    sqlx::query_as::<_, BookingRequest>(&sql)
        .bind(request.student)
        .bind(request.teacher)
        .bind(request.subject)
        .bind(request.resource_kind)
        .bind(request.lab_id)
        .bind(request.room_id)
        .bind(request.resource_name)
        .bind(request.pc_number)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(RequestStatus::Pending)
        .bind(request.reason)
        .bind(requested_at)
        .fetch_one(executor)
        .await
}

pub async fn get_request<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<BookingRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM booking_requests WHERE id = ?");
    sqlx::query_as::<_, BookingRequest>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_requests<'e, E>(
    executor: E,
    filter: &BookingFilter<'_>,
) -> sqlx::Result<Vec<BookingRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM booking_requests
         WHERE (?1 IS NULL OR student = ?1)
           AND (?2 IS NULL OR teacher = ?2)
           AND (?3 IS NULL OR status = ?3)
         ORDER BY requested_at DESC, id DESC"
    );
    sqlx::query_as::<_, BookingRequest>(&sql)
        .bind(filter.student)
        .bind(filter.teacher)
        .bind(filter.status)
        .fetch_all(executor)
        .await
}

/// Moves a pending request to `to`; zero rows means it was not pending.
pub async fn transition_request<'e, E>(
    executor: E,
    id: i64,
    to: RequestStatus,
    decided_by: &str,
    decided_at: DateTime<Utc>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE booking_requests SET status = ?, decided_by = ?, decided_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(decided_by)
    .bind(decided_at)
    .bind(id)
    .bind(RequestStatus::Pending)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_requests<'e, E>(
    executor: E,
    teacher: Option<&str>,
    status: RequestStatus,
) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM booking_requests WHERE (?1 IS NULL OR teacher = ?1) AND status = ?2",
    )
    .bind(teacher)
    .bind(status)
    .fetch_one(executor)
    .await
}
