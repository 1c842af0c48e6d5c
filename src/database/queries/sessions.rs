use crate::database::models::{BookingRequest, PcHistoryEntry, Session};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

const SESSION_COLUMNS: &str = "id, request_id, student, teacher, subject, resource_kind, lab_id, \
     room_id, resource_name, pc_number, start_time, end_time, active, ended_at";

#[derive(Debug, Default, Clone)]
pub struct SessionFilter<'a> {
    pub student: Option<&'a str>,
    pub teacher: Option<&'a str>,
    pub lab_id: Option<i64>,
    pub active_only: bool,
}

/// Copies the resource, subject and time fields of an approved request.
pub async fn insert_session_for_request<'e, E>(
    executor: E,
    request: &BookingRequest,
) -> sqlx::Result<Session>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO sessions
            (request_id, student, teacher, subject, resource_kind, lab_id, room_id,
             resource_name, pc_number, start_time, end_time, active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, TRUE)
         RETURNING {SESSION_COLUMNS}"
    );
    sqlx::query_as::<_, Session>(&sql)
        .bind(request.id)
        .bind(&request.student)
        .bind(&request.teacher)
        .bind(&request.subject)
        .bind(request.resource_kind)
        .bind(request.lab_id)
        .bind(request.room_id)
        .bind(&request.resource_name)
        .bind(request.pc_number)
        .bind(request.start_time)
        .bind(request.end_time)
        .fetch_one(executor)
        .await
}

pub async fn get_session<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Session>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?");
    sqlx::query_as::<_, Session>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn sessions_for_request<'e, E>(executor: E, request_id: i64) -> sqlx::Result<Vec<Session>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE request_id = ?");
    sqlx::query_as::<_, Session>(&sql)
        .bind(request_id)
        .fetch_all(executor)
        .await
}

pub async fn list_sessions<'e, E>(
    executor: E,
    filter: &SessionFilter<'_>,
) -> sqlx::Result<Vec<Session>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sessions
         WHERE (?1 IS NULL OR student = ?1)
           AND (?2 IS NULL OR teacher = ?2)
           AND (?3 IS NULL OR lab_id = ?3)
           AND (?4 = FALSE OR active = TRUE)
         ORDER BY start_time DESC, id DESC"
    );
    sqlx::query_as::<_, Session>(&sql)
        .bind(filter.student)
        .bind(filter.teacher)
        .bind(filter.lab_id)
        .bind(filter.active_only)
        .fetch_all(executor)
        .await
}

pub async fn active_session_on_pc<'e, E>(
    executor: E,
    lab_id: i64,
    pc_number: i64,
) -> sqlx::Result<Option<Session>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sessions
         WHERE lab_id = ? AND pc_number = ? AND active = TRUE"
    );
    sqlx::query_as::<_, Session>(&sql)
        .bind(lab_id)
        .bind(pc_number)
        .fetch_optional(executor)
        .await
}

/// Closes an active session; zero rows means it was already closed.
pub async fn deactivate_session<'e, E>(
    executor: E,
    id: i64,
    ended_at: DateTime<Utc>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE sessions SET active = FALSE, ended_at = ? WHERE id = ? AND active = TRUE",
    )
    .bind(ended_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Closes every active session whose end time is at or before `now`.
pub async fn deactivate_expired<'e, E>(executor: E, now: DateTime<Utc>) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE sessions SET active = FALSE, ended_at = end_time
         WHERE active = TRUE AND end_time <= ?",
    )
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_active_sessions<'e, E>(executor: E, teacher: Option<&str>) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE active = TRUE AND (?1 IS NULL OR teacher = ?1)",
    )
    .bind(teacher)
    .fetch_one(executor)
    .await
}

pub async fn count_active_in_lab<'e, E>(executor: E, lab_id: i64) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE active = TRUE AND lab_id = ?")
        .bind(lab_id)
        .fetch_one(executor)
        .await
}

pub struct NewPcHistory<'a> {
    pub lab_id: i64,
    pub lab_name: &'a str,
    pub pc_number: i64,
    pub student: &'a str,
    pub student_name: &'a str,
    pub teacher: &'a str,
    pub subject: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

pub async fn insert_pc_history<'e, E>(
    executor: E,
    entry: &NewPcHistory<'_>,
    recorded_at: DateTime<Utc>,
) -> sqlx::Result<PcHistoryEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PcHistoryEntry>(
        "INSERT INTO pc_history
            (lab_id, lab_name, pc_number, student, student_name, teacher, subject,
             start_time, end_time, recorded_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id, lab_id, lab_name, pc_number, student, student_name, teacher, subject,
                   start_time, end_time, recorded_at",
    )
    .bind(entry.lab_id)
    .bind(entry.lab_name)
    .bind(entry.pc_number)
    .bind(entry.student)
    .bind(entry.student_name)
    .bind(entry.teacher)
    .bind(entry.subject)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(recorded_at)
    .fetch_one(executor)
    .await
}

/// Re-keys a lab's history under its new name.
pub async fn rename_history_lab<'e, E>(executor: E, lab_id: i64, lab_name: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE pc_history SET lab_name = ? WHERE lab_id = ?")
        .bind(lab_name)
        .bind(lab_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn pc_history<'e, E>(
    executor: E,
    lab_name: &str,
    pc_number: i64,
    limit: i64,
) -> sqlx::Result<Vec<PcHistoryEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PcHistoryEntry>(
        "SELECT id, lab_id, lab_name, pc_number, student, student_name, teacher, subject,
                start_time, end_time, recorded_at
         FROM pc_history
         WHERE lab_name = ? AND pc_number = ?
         ORDER BY id DESC
         LIMIT ?",
    )
    .bind(lab_name)
    .bind(pc_number)
    .bind(limit)
    .fetch_all(executor)
    .await
}
