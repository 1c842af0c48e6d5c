use crate::config::Config;
use crate::database::models::{
    Book, BookStatus, BorrowRecord, BorrowRequest, RequestStatus, Role, User,
};
use crate::database::queries::library::{self, NewBorrowRecord};
use crate::database::queries::users;
use crate::error::{PortalError, Result};
use crate::utils::time::days_overdue;
use crate::utils::validation::{optional_text, require, validate_copies, validate_loan_days};
use crate::workflows::{audit, is_unique_violation, require_role};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub copies: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BorrowDecision {
    Approve {
        #[serde(default)]
        due_in_days: Option<i64>,
    },
    Decline {
        #[serde(default)]
        feedback: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub book: Book,
    pub record: Option<BorrowRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueLoan {
    #[serde(flatten)]
    pub record: BorrowRecord,
    pub days_overdue: i64,
}

/// Flips the book to `Borrowed` and opens its ledger record. Every lending
/// path goes through here so a borrowed book always has exactly one open
/// record.
async fn lend(
    conn: &mut SqliteConnection,
    book: &Book,
    borrower: &User,
    due_in_days: i64,
    now: DateTime<Utc>,
) -> Result<BorrowRecord> {
    validate_loan_days(due_in_days)?;
    let due_date = TimeDelta::try_days(due_in_days)
        .and_then(|span| now.checked_add_signed(span))
        .ok_or_else(|| {
            PortalError::validation(format!("Due in {due_in_days} days is out of range"))
        })?;

    if library::mark_borrowed(&mut *conn, &book.barcode, &borrower.handle, now, due_date).await? == 0
    {
        return Err(PortalError::conflict(format!(
            "Book {} is already borrowed",
            book.barcode
        )));
    }

    let record = NewBorrowRecord {
        barcode: &book.barcode,
        book_title: &book.title,
        borrower: &borrower.handle,
        borrower_name: &borrower.name,
        borrowed_at: now,
        due_date,
    };
    library::insert_borrow_record(&mut *conn, &record)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortalError::conflict(format!("Book {} already has an open loan", book.barcode))
            } else {
                e.into()
            }
        })
}

pub struct LendingDesk {
    pool: SqlitePool,
    config: Config,
}

impl LendingDesk {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    fn require_librarian(actor: &User, action: &str) -> Result<()> {
        require_role(actor, actor.role.manages_library(), action)
    }

    // Catalogue

    /// Adds `copies` books. A given barcode only fits a single copy;
    /// otherwise barcodes are generated.
    pub async fn add_book(&self, actor: &User, form: &BookForm) -> Result<Vec<Book>> {
        Self::require_librarian(actor, "add books")?;
        let title = require("title", &form.title)?;
        let author = require("author", &form.author)?;
        let copies = form.copies.unwrap_or(1);
        validate_copies(copies)?;

        let barcodes: Vec<String> = match optional_text(form.barcode.as_deref()) {
            Some(_) if copies > 1 => {
                return Err(PortalError::validation(
                    "A barcode can only be given for a single copy",
                ));
            }
            Some(barcode) => vec![barcode.to_string()],
            None => (0..copies).map(|_| generate_barcode()).collect(),
        };

        let mut tx = self.pool.begin().await?;
        let mut books = Vec::with_capacity(barcodes.len());
        for barcode in &barcodes {
            let book = library::insert_book(&mut *tx, barcode, title, author)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        PortalError::conflict(format!("Barcode {barcode} already exists"))
                    } else {
                        e.into()
                    }
                })?;
            books.push(book);
        }
        audit::record(
            &mut *tx,
            "Library Book Added",
            &actor.handle,
            json!({ "title": title, "barcodes": barcodes }),
        )
        .await?;
        tx.commit().await?;

        info!("{} added {} copies of {}", actor.handle, books.len(), title);
        Ok(books)
    }

    pub async fn update_book(&self, actor: &User, barcode: &str, title: &str, author: &str) -> Result<Book> {
        Self::require_librarian(actor, "edit books")?;
        let title = require("title", title)?;
        let author = require("author", author)?;
        if library::update_book(&self.pool, barcode, title, author).await? == 0 {
            return Err(PortalError::not_found(format!("Book {barcode} not found")));
        }
        self.lookup_book(barcode).await
    }

    /// Only shelved books can be removed.
    pub async fn delete_book(&self, actor: &User, barcode: &str) -> Result<()> {
        Self::require_librarian(actor, "delete books")?;
        let book = self.lookup_book(barcode).await?;
        if library::delete_available_book(&self.pool, &book.barcode).await? == 0 {
            return Err(PortalError::conflict(format!(
                "Book {barcode} is borrowed and cannot be removed"
            )));
        }
        audit::record(&self.pool, "Library Book Removed", &actor.handle, json!({ "barcode": barcode }))
            .await?;
        Ok(())
    }

    pub async fn list_books(&self, status: Option<BookStatus>, search: Option<&str>) -> Result<Vec<Book>> {
        let search = optional_text(search);
        Ok(library::list_books(&self.pool, status, search).await?)
    }

    pub async fn lookup_book(&self, barcode: &str) -> Result<Book> {
        let barcode = barcode.trim();
        library::get_book(&self.pool, barcode)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Book {barcode} not found")))
    }

    // Borrow requests

    pub async fn request_borrow(&self, actor: &User, barcode: &str) -> Result<BorrowRequest> {
        require_role(actor, actor.role == Role::Student, "request books")?;
        let barcode = require("barcode", barcode)?;
        let mut tx = self.pool.begin().await?;
        let book = library::get_book(&mut *tx, barcode)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Book {barcode} not found")))?;
        if book.status != BookStatus::Available {
            return Err(PortalError::conflict(format!("{} is not available", book.title)));
        }
        if library::find_pending_borrow_request(&mut *tx, &actor.handle, barcode)
            .await?
            .is_some()
        {
            return Err(PortalError::conflict(format!(
                "You already have a pending request for {}",
                book.title
            )));
        }

        let request = library::insert_borrow_request(&mut *tx, &actor.handle, &book, Utc::now()).await?;
        audit::record(
            &mut *tx,
            "Library Borrow Requested",
            &actor.handle,
            json!({ "id": request.id, "barcode": book.barcode, "title": book.title }),
        )
        .await?;
        tx.commit().await?;
        Ok(request)
    }

    pub async fn decide_borrow(&self, actor: &User, id: i64, decision: &BorrowDecision) -> Result<BorrowRequest> {
        Self::require_librarian(actor, "decide borrow requests")?;
        let request = library::get_borrow_request(&self.pool, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Borrow request {id} not found")))?;
        if request.status != RequestStatus::Pending {
            return Err(PortalError::conflict(format!(
                "Borrow request {id} is already {}",
                request.status
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        match decision {
            BorrowDecision::Approve { due_in_days } => {
                let days = due_in_days.unwrap_or(self.config.default_loan_days);
                validate_loan_days(days)?;
                let borrower = users::find_by_handle(&mut *tx, &request.student)
                    .await?
                    .ok_or_else(|| {
                        PortalError::not_found(format!("User {} not found", request.student))
                    })?;
                let book = library::get_book(&mut *tx, &request.barcode)
                    .await?
                    .ok_or_else(|| {
                        PortalError::not_found(format!("Book {} not found", request.barcode))
                    })?;

                let record = lend(&mut *tx, &book, &borrower, days, now).await?;
                if library::transition_borrow_request(
                    &mut *tx,
                    id,
                    RequestStatus::Approved,
                    now,
                    Some(record.due_date),
                    None,
                )
                .await?
                    == 0
                {
                    return Err(PortalError::conflict(format!(
                        "Borrow request {id} was decided concurrently"
                    )));
                }
                audit::record(
                    &mut *tx,
                    "Library Borrow Approved",
                    &actor.handle,
                    json!({ "id": id, "barcode": book.barcode, "due_date": record.due_date }),
                )
                .await?;
            }
            BorrowDecision::Decline { feedback } => {
                let feedback = optional_text(feedback.as_deref());
                if library::transition_borrow_request(
                    &mut *tx,
                    id,
                    RequestStatus::Declined,
                    now,
                    None,
                    feedback,
                )
                .await?
                    == 0
                {
                    return Err(PortalError::conflict(format!(
                        "Borrow request {id} was decided concurrently"
                    )));
                }
                audit::record(
                    &mut *tx,
                    "Library Borrow Declined",
                    &actor.handle,
                    json!({ "id": id, "barcode": request.barcode, "feedback": feedback }),
                )
                .await?;
            }
        }
        let updated = library::get_borrow_request(&mut *tx, id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Borrow request {id} not found")))?;
        tx.commit().await?;

        info!("Borrow request {} {} by {}", id, updated.status, actor.handle);
        Ok(updated)
    }

    // Scan desk

    /// Lends straight from the desk without a borrow request.
    pub async fn lend_direct(
        &self,
        actor: &User,
        barcode: &str,
        borrower: &str,
        due_in_days: Option<i64>,
    ) -> Result<BorrowRecord> {
        Self::require_librarian(actor, "lend books")?;
        let barcode = require("barcode", barcode)?;
        let borrower = require("borrower", borrower)?;
        let days = due_in_days.unwrap_or(self.config.default_loan_days);

        let mut tx = self.pool.begin().await?;
        let borrower = users::find_by_handle(&mut *tx, borrower)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("User {borrower} not found")))?;
        let book = library::get_book(&mut *tx, barcode)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Book {barcode} not found")))?;

        let record = lend(&mut *tx, &book, &borrower, days, Utc::now()).await?;
        audit::record(
            &mut *tx,
            "Library Book Lent",
            &actor.handle,
            json!({ "barcode": book.barcode, "borrower": borrower.handle, "due_date": record.due_date }),
        )
        .await?;
        tx.commit().await?;

        info!("{} lent {} to {}", actor.handle, book.barcode, borrower.handle);
        Ok(record)
    }

    /// Shelves a borrowed book and stamps its newest open record. A book
    /// that is not borrowed is a conflict and nothing is stamped.
    pub async fn scan_return(&self, actor: &User, barcode: &str) -> Result<ReturnReceipt> {
        Self::require_librarian(actor, "return books")?;
        let barcode = require("barcode", barcode)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        if library::get_book(&mut *tx, barcode).await?.is_none() {
            return Err(PortalError::not_found(format!("Book {barcode} not found")));
        }
        if library::mark_available(&mut *tx, barcode).await? == 0 {
            return Err(PortalError::conflict(format!("Book {barcode} is not borrowed")));
        }

        let record = match library::latest_open_record(&mut *tx, barcode).await? {
            Some(open) => library::stamp_returned(&mut *tx, open.id, now).await?,
            None => {
                warn!("Book {} was borrowed without an open record", barcode);
                None
            }
        };
        audit::record(
            &mut *tx,
            "Library Book Returned",
            &actor.handle,
            json!({ "barcode": barcode, "record": record.as_ref().map(|r| r.id) }),
        )
        .await?;
        let book = library::get_book(&mut *tx, barcode)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Book {barcode} not found")))?;
        tx.commit().await?;

        info!("{} returned {}", actor.handle, barcode);
        Ok(ReturnReceipt { book, record })
    }

    // Ledgers

    /// Librarians see every request, everyone else only their own.
    pub async fn borrow_requests(&self, actor: &User, status: Option<RequestStatus>) -> Result<Vec<BorrowRequest>> {
        let student = (!actor.role.manages_library()).then_some(actor.handle.as_str());
        Ok(library::list_borrow_requests(&self.pool, student, status).await?)
    }

    pub async fn borrow_records(&self, actor: &User, open_only: bool) -> Result<Vec<BorrowRecord>> {
        let borrower = (!actor.role.manages_library()).then_some(actor.handle.as_str());
        Ok(library::list_borrow_records(&self.pool, borrower, open_only).await?)
    }

    pub async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<OverdueLoan>> {
        Ok(library::list_borrow_records(&self.pool, None, true)
            .await?
            .into_iter()
            .filter(|record| record.due_date < now)
            .map(|record| OverdueLoan {
                days_overdue: days_overdue(record.due_date, now),
                record,
            })
            .collect())
    }
}

fn generate_barcode() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("BC{}", id[..10].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_barcodes_are_prefixed_and_distinct() {
        let a = generate_barcode();
        let b = generate_barcode();
        assert!(a.starts_with("BC"));
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }

    #[test]
    fn borrow_decisions_parse_from_action_bodies() {
        let approve: BorrowDecision =
            serde_json::from_str(r#"{"action":"approve","due_in_days":14}"#).unwrap();
        assert!(matches!(approve, BorrowDecision::Approve { due_in_days: Some(14) }));

        let decline: BorrowDecision = serde_json::from_str(r#"{"action":"decline"}"#).unwrap();
        assert!(matches!(decline, BorrowDecision::Decline { feedback: None }));
    }
}
