use crate::database::models::{ScheduleEntry, Subject};
use chrono::NaiveTime;
use sqlx::{Executor, Sqlite};

pub async fn insert_subject<'e, E>(executor: E, teacher: &str, name: &str) -> sqlx::Result<Subject>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Subject>(
        "INSERT INTO subjects (teacher, name) VALUES (?, ?) RETURNING id, teacher, name",
    )
    .bind(teacher)
    .bind(name)
    .fetch_one(executor)
    .await
}

pub async fn get_subject<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Subject>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Subject>("SELECT id, teacher, name FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_subject<'e, E>(
    executor: E,
    teacher: &str,
    name: &str,
) -> sqlx::Result<Option<Subject>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Subject>(
        "SELECT id, teacher, name FROM subjects WHERE teacher = ? AND name = ?",
    )
    .bind(teacher)
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn list_subjects<'e, E>(executor: E, teacher: Option<&str>) -> sqlx::Result<Vec<Subject>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Subject>(
        "SELECT id, teacher, name FROM subjects
         WHERE (?1 IS NULL OR teacher = ?1)
         ORDER BY teacher ASC, name ASC",
    )
    .bind(teacher)
    .fetch_all(executor)
    .await
}

pub async fn delete_subject<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_schedule<'e, E>(
    executor: E,
    subject_id: i64,
    day: &str,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> sqlx::Result<ScheduleEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ScheduleEntry>(
        "INSERT INTO subject_schedules (subject_id, day, start_time, end_time)
         VALUES (?, ?, ?, ?)
         RETURNING id, subject_id, day, start_time, end_time",
    )
    .bind(subject_id)
    .bind(day)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(executor)
    .await
}

pub async fn get_schedule<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<ScheduleEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, subject_id, day, start_time, end_time FROM subject_schedules WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_schedule<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM subject_schedules WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_schedules<'e, E>(executor: E) -> sqlx::Result<Vec<ScheduleEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, subject_id, day, start_time, end_time FROM subject_schedules
         ORDER BY subject_id ASC, start_time ASC",
    )
    .fetch_all(executor)
    .await
}

pub async fn schedules_for_subject<'e, E>(
    executor: E,
    subject_id: i64,
) -> sqlx::Result<Vec<ScheduleEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ScheduleEntry>(
        "SELECT id, subject_id, day, start_time, end_time FROM subject_schedules
         WHERE subject_id = ?
         ORDER BY start_time ASC",
    )
    .bind(subject_id)
    .fetch_all(executor)
    .await
}
