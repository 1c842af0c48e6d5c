use crate::database::models::{Lab, LabPc, PcStatus, Room};
use sqlx::{Executor, Sqlite};

// Labs

pub async fn insert_lab<'e, E>(executor: E, name: &str, capacity: i64) -> sqlx::Result<Lab>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Lab>(
        "INSERT INTO labs (name, capacity) VALUES (?, ?) RETURNING id, name, capacity",
    )
    .bind(name)
    .bind(capacity)
    .fetch_one(executor)
    .await
}

/// Creates PCs numbered `1..=capacity` for a lab.
pub async fn insert_lab_pcs<'e, E>(executor: E, lab_id: i64, capacity: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "WITH RECURSIVE seq(n) AS (
             SELECT 1
             UNION ALL
             SELECT n + 1 FROM seq WHERE n < ?2
         )
         INSERT INTO lab_pcs (lab_id, number, status)
         SELECT ?1, n, 'available' FROM seq",
    )
    .bind(lab_id)
    .bind(capacity)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_lab<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Lab>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Lab>("SELECT id, name, capacity FROM labs WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_lab_by_name<'e, E>(executor: E, name: &str) -> sqlx::Result<Option<Lab>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Lab>("SELECT id, name, capacity FROM labs WHERE name = ?")
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn list_labs<'e, E>(executor: E) -> sqlx::Result<Vec<Lab>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Lab>("SELECT id, name, capacity FROM labs ORDER BY id ASC")
        .fetch_all(executor)
        .await
}

pub async fn rename_lab<'e, E>(executor: E, id: i64, name: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE labs SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_lab<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM labs WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_pcs<'e, E>(executor: E, lab_id: i64) -> sqlx::Result<Vec<LabPc>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LabPc>(
        "SELECT lab_id, number, status FROM lab_pcs WHERE lab_id = ? ORDER BY number ASC",
    )
    .bind(lab_id)
    .fetch_all(executor)
    .await
}

pub async fn get_pc<'e, E>(executor: E, lab_id: i64, number: i64) -> sqlx::Result<Option<LabPc>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LabPc>(
        "SELECT lab_id, number, status FROM lab_pcs WHERE lab_id = ? AND number = ?",
    )
    .bind(lab_id)
    .bind(number)
    .fetch_optional(executor)
    .await
}

pub async fn set_pc_status<'e, E>(
    executor: E,
    lab_id: i64,
    number: i64,
    status: PcStatus,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE lab_pcs SET status = ? WHERE lab_id = ? AND number = ?")
        .bind(status)
        .bind(lab_id)
        .bind(number)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_labs<'e, E>(executor: E) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM labs")
        .fetch_one(executor)
        .await
}

// Rooms

pub async fn insert_room<'e, E>(executor: E, name: &str, capacity: i64) -> sqlx::Result<Room>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Room>(
        "INSERT INTO rooms (name, capacity) VALUES (?, ?) RETURNING id, name, capacity",
    )
    .bind(name)
    .bind(capacity)
    .fetch_one(executor)
    .await
}

pub async fn get_room<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Room>("SELECT id, name, capacity FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_room_by_name<'e, E>(executor: E, name: &str) -> sqlx::Result<Option<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Room>("SELECT id, name, capacity FROM rooms WHERE name = ?")
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn list_rooms<'e, E>(executor: E) -> sqlx::Result<Vec<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Room>("SELECT id, name, capacity FROM rooms ORDER BY id ASC")
        .fetch_all(executor)
        .await
}

pub async fn update_room<'e, E>(executor: E, id: i64, name: &str, capacity: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE rooms SET name = ?, capacity = ? WHERE id = ?")
        .bind(name)
        .bind(capacity)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_room<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_rooms<'e, E>(executor: E) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms")
        .fetch_one(executor)
        .await
}
