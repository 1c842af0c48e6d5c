use crate::database::models::{Book, BookStatus, BorrowRecord, BorrowRequest, RequestStatus};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

// Books

pub async fn insert_book<'e, E>(
    executor: E,
    barcode: &str,
    title: &str,
    author: &str,
) -> sqlx::Result<Book>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Book>(
        "INSERT INTO books (barcode, title, author, status) VALUES (?, ?, ?, ?)
         RETURNING barcode, title, author, status, borrowed_by, borrowed_at, due_date",
    )
    .bind(barcode)
    .bind(title)
    .bind(author)
    .bind(BookStatus::Available)
    .fetch_one(executor)
    .await
}

pub async fn get_book<'e, E>(executor: E, barcode: &str) -> sqlx::Result<Option<Book>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Book>(
        "SELECT barcode, title, author, status, borrowed_by, borrowed_at, due_date
         FROM books WHERE barcode = ?",
    )
    .bind(barcode)
    .fetch_optional(executor)
    .await
}

pub async fn list_books<'e, E>(
    executor: E,
    status: Option<BookStatus>,
    search: Option<&str>,
) -> sqlx::Result<Vec<Book>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let pattern = search.map(|s| format!("%{}%", s.trim()));
    sqlx::query_as::<_, Book>(
        "SELECT barcode, title, author, status, borrowed_by, borrowed_at, due_date
         FROM books
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR title LIKE ?2 OR author LIKE ?2 OR barcode LIKE ?2)
         ORDER BY title ASC, barcode ASC",
    )
    .bind(status)
    .bind(pattern)
    .fetch_all(executor)
    .await
}

pub async fn update_book<'e, E>(
    executor: E,
    barcode: &str,
    title: &str,
    author: &str,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE books SET title = ?, author = ? WHERE barcode = ?")
        .bind(title)
        .bind(author)
        .bind(barcode)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Only books currently on the shelf can be removed.
pub async fn delete_available_book<'e, E>(executor: E, barcode: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM books WHERE barcode = ? AND status = ?")
        .bind(barcode)
        .bind(BookStatus::Available)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// `Available -> Borrowed`; zero rows means the book was not available.
pub async fn mark_borrowed<'e, E>(
    executor: E,
    barcode: &str,
    borrower: &str,
    borrowed_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE books SET status = ?, borrowed_by = ?, borrowed_at = ?, due_date = ?
         WHERE barcode = ? AND status = ?",
    )
    .bind(BookStatus::Borrowed)
    .bind(borrower)
    .bind(borrowed_at)
    .bind(due_date)
    .bind(barcode)
    .bind(BookStatus::Available)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// `Borrowed -> Available`; zero rows means the book was not borrowed.
pub async fn mark_available<'e, E>(executor: E, barcode: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE books SET status = ?, borrowed_by = NULL, borrowed_at = NULL, due_date = NULL
         WHERE barcode = ? AND status = ?",
    )
    .bind(BookStatus::Available)
    .bind(barcode)
    .bind(BookStatus::Borrowed)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_books<'e, E>(executor: E, status: Option<BookStatus>) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books WHERE (?1 IS NULL OR status = ?1)")
        .bind(status)
        .fetch_one(executor)
        .await
}

// Borrow requests

const REQUEST_COLUMNS: &str =
    "id, student, barcode, book_title, status, requested_at, decided_at, due_date, feedback";

pub async fn insert_borrow_request<'e, E>(
    executor: E,
    student: &str,
    book: &Book,
    requested_at: DateTime<Utc>,
) -> sqlx::Result<BorrowRequest>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO borrow_requests (student, barcode, book_title, status, requested_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {REQUEST_COLUMNS}"
    );
    sqlx::query_as::<_, BorrowRequest>(&sql)
        .bind(student)
        .bind(&book.barcode)
        .bind(&book.title)
        .bind(RequestStatus::Pending)
        .bind(requested_at)
        .fetch_one(executor)
        .await
}

pub async fn get_borrow_request<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<BorrowRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM borrow_requests WHERE id = ?");
    sqlx::query_as::<_, BorrowRequest>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_pending_borrow_request<'e, E>(
    executor: E,
    student: &str,
    barcode: &str,
) -> sqlx::Result<Option<BorrowRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM borrow_requests
         WHERE student = ? AND barcode = ? AND status = ?"
    );
    sqlx::query_as::<_, BorrowRequest>(&sql)
        .bind(student)
        .bind(barcode)
        .bind(RequestStatus::Pending)
        .fetch_optional(executor)
        .await
}

pub async fn list_borrow_requests<'e, E>(
    executor: E,
    student: Option<&str>,
    status: Option<RequestStatus>,
) -> sqlx::Result<Vec<BorrowRequest>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM borrow_requests
         WHERE (?1 IS NULL OR student = ?1)
           AND (?2 IS NULL OR status = ?2)
         ORDER BY requested_at DESC, id DESC"
    );
    sqlx::query_as::<_, BorrowRequest>(&sql)
        .bind(student)
        .bind(status)
        .fetch_all(executor)
        .await
}

/// Moves a pending borrow request to `to`; zero rows means it was not pending.
pub async fn transition_borrow_request<'e, E>(
    executor: E,
    id: i64,
    to: RequestStatus,
    decided_at: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    feedback: Option<&str>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE borrow_requests SET status = ?, decided_at = ?, due_date = ?, feedback = ?
         WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(decided_at)
    .bind(due_date)
    .bind(feedback)
    .bind(id)
    .bind(RequestStatus::Pending)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_borrow_requests<'e, E>(executor: E, status: RequestStatus) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM borrow_requests WHERE status = ?")
        .bind(status)
        .fetch_one(executor)
        .await
}

// Borrow records

const RECORD_COLUMNS: &str =
    "id, barcode, book_title, borrower, borrower_name, borrowed_at, due_date, returned_at";

pub struct NewBorrowRecord<'a> {
    pub barcode: &'a str,
    pub book_title: &'a str,
    pub borrower: &'a str,
    pub borrower_name: &'a str,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

pub async fn insert_borrow_record<'e, E>(
    executor: E,
    record: &NewBorrowRecord<'_>,
) -> sqlx::Result<BorrowRecord>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO borrow_records
            (barcode, book_title, borrower, borrower_name, borrowed_at, due_date)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {RECORD_COLUMNS}"
    );
    sqlx::query_as::<_, BorrowRecord>(&sql)
        .bind(record.barcode)
        .bind(record.book_title)
        .bind(record.borrower)
        .bind(record.borrower_name)
        .bind(record.borrowed_at)
        .bind(record.due_date)
        .fetch_one(executor)
        .await
}

/// The most recent unreturned record for a barcode.
pub async fn latest_open_record<'e, E>(
    executor: E,
    barcode: &str,
) -> sqlx::Result<Option<BorrowRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM borrow_records
         WHERE barcode = ? AND returned_at IS NULL
         ORDER BY id DESC
         LIMIT 1"
    );
    sqlx::query_as::<_, BorrowRecord>(&sql)
        .bind(barcode)
        .fetch_optional(executor)
        .await
}

pub async fn stamp_returned<'e, E>(
    executor: E,
    id: i64,
    returned_at: DateTime<Utc>,
) -> sqlx::Result<Option<BorrowRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE borrow_records SET returned_at = ?
         WHERE id = ? AND returned_at IS NULL
         RETURNING {RECORD_COLUMNS}"
    );
    sqlx::query_as::<_, BorrowRecord>(&sql)
        .bind(returned_at)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_borrow_records<'e, E>(
    executor: E,
    borrower: Option<&str>,
    open_only: bool,
) -> sqlx::Result<Vec<BorrowRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM borrow_records
         WHERE (?1 IS NULL OR borrower = ?1)
           AND (?2 = FALSE OR returned_at IS NULL)
         ORDER BY borrowed_at DESC, id DESC"
    );
    sqlx::query_as::<_, BorrowRecord>(&sql)
        .bind(borrower)
        .bind(open_only)
        .fetch_all(executor)
        .await
}
