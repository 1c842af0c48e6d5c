use crate::database::models::{Reservation, ResourceKind};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{Executor, Sqlite};

pub struct NewReservation<'a> {
    pub teacher: &'a str,
    pub subject: &'a str,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub resource_name: &'a str,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub async fn insert_reservation<'e, E>(
    executor: E,
    reservation: &NewReservation<'_>,
    created_at: DateTime<Utc>,
) -> sqlx::Result<Reservation>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Reservation>(
        "INSERT INTO reservations
            (teacher, subject, resource_kind, resource_id, resource_name, date, start_time,
             end_time, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id, teacher, subject, resource_kind, resource_id, resource_name, date,
                   start_time, end_time, created_at",
    )
    .bind(reservation.teacher)
    .bind(reservation.subject)
    .bind(reservation.resource_kind)
    .bind(reservation.resource_id)
    .bind(reservation.resource_name)
    .bind(reservation.date)
    .bind(reservation.start_time)
    .bind(reservation.end_time)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub async fn get_reservation<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Reservation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Reservation>(
        "SELECT id, teacher, subject, resource_kind, resource_id, resource_name, date,
                start_time, end_time, created_at
         FROM reservations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_reservation<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM reservations WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_reservations<'e, E>(
    executor: E,
    teacher: Option<&str>,
    date: Option<NaiveDate>,
) -> sqlx::Result<Vec<Reservation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Reservation>(
        "SELECT id, teacher, subject, resource_kind, resource_id, resource_name, date,
                start_time, end_time, created_at
         FROM reservations
         WHERE (?1 IS NULL OR teacher = ?1)
           AND (?2 IS NULL OR date = ?2)
         ORDER BY date ASC, start_time ASC",
    )
    .bind(teacher)
    .bind(date)
    .fetch_all(executor)
    .await
}
