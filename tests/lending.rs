mod common;

use chrono::{TimeDelta, Utc};
use common::Portal;
use lab_portal::database::models::{BookStatus, RequestStatus};
use lab_portal::database::queries::library;
use lab_portal::error::PortalError;
use lab_portal::workflows::lending::{BookForm, BorrowDecision, LendingDesk};

async fn desk_with_book() -> (Portal, LendingDesk) {
    let portal = Portal::seeded().await;
    let desk = LendingDesk::new(portal.pool.clone(), portal.config.clone());
    let librarian = portal.user("library").await;
    desk.add_book(
        &librarian,
        &BookForm {
            title: "Rust in Action".to_string(),
            author: "Tim McNamara".to_string(),
            barcode: Some("BC100".to_string()),
            copies: None,
        },
    )
    .await
    .unwrap();
    (portal, desk)
}

async fn open_records(portal: &Portal) -> usize {
    library::list_borrow_records(&portal.pool, None, true)
        .await
        .unwrap()
        .iter()
        .filter(|record| record.barcode == "BC100")
        .count()
}

#[tokio::test]
async fn approved_borrow_request_lends_the_book() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    let student = portal.student("S001", "Ana Cruz").await;

    let request = desk.request_borrow(&student, "BC100").await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.book_title, "Rust in Action");

    let duplicate = desk.request_borrow(&student, "BC100").await.unwrap_err();
    assert!(matches!(duplicate, PortalError::Conflict(_)));

    let before = Utc::now();
    let decided = desk
        .decide_borrow(&librarian, request.id, &BorrowDecision::Approve { due_in_days: Some(7) })
        .await
        .unwrap();
    assert_eq!(decided.status, RequestStatus::Approved);

    let due = decided.due_date.unwrap();
    assert!(due >= before + TimeDelta::days(7));
    assert!(due <= Utc::now() + TimeDelta::days(7));

    let book = desk.lookup_book("BC100").await.unwrap();
    assert_eq!(book.status, BookStatus::Borrowed);
    assert_eq!(book.borrowed_by.as_deref(), Some("S001"));
    assert_eq!(open_records(&portal).await, 1);

    let records = desk.borrow_records(&student, true).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].borrower_name, "Ana Cruz");
}

#[tokio::test]
async fn returning_twice_is_a_conflict() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    portal.student("S001", "Ana Cruz").await;

    desk.lend_direct(&librarian, "BC100", "S001", None).await.unwrap();
    let receipt = desk.scan_return(&librarian, "BC100").await.unwrap();
    assert_eq!(receipt.book.status, BookStatus::Available);
    assert!(receipt.book.borrowed_by.is_none());
    let record = receipt.record.unwrap();
    assert!(record.returned_at.is_some());

    let err = desk.scan_return(&librarian, "BC100").await.unwrap_err();
    assert!(matches!(err, PortalError::Conflict(_)));

    let all = library::list_borrow_records(&portal.pool, Some("S001"), false)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].returned_at, record.returned_at);
}

#[tokio::test]
async fn both_lending_paths_keep_one_open_record() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    let student = portal.student("S001", "Ana Cruz").await;
    portal.student("S002", "Cy Lim").await;

    let direct = desk.lend_direct(&librarian, "BC100", "S002", Some(3)).await.unwrap();
    assert_eq!(direct.borrower, "S002");
    assert_eq!(open_records(&portal).await, 1);

    let again = desk.lend_direct(&librarian, "BC100", "S001", None).await.unwrap_err();
    assert!(matches!(again, PortalError::Conflict(_)));
    assert_eq!(open_records(&portal).await, 1);

    let unavailable = desk.request_borrow(&student, "BC100").await.unwrap_err();
    assert!(matches!(unavailable, PortalError::Conflict(_)));

    desk.scan_return(&librarian, "BC100").await.unwrap();
    assert_eq!(open_records(&portal).await, 0);

    let request = desk.request_borrow(&student, "BC100").await.unwrap();
    desk.decide_borrow(&librarian, request.id, &BorrowDecision::Approve { due_in_days: None })
        .await
        .unwrap();
    assert_eq!(open_records(&portal).await, 1);
    assert_eq!(
        desk.lookup_book("BC100").await.unwrap().status,
        BookStatus::Borrowed
    );
}

#[tokio::test]
async fn declined_requests_keep_the_book_on_the_shelf() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    let student = portal.student("S001", "Ana Cruz").await;

    let request = desk.request_borrow(&student, "BC100").await.unwrap();
    let declined = desk
        .decide_borrow(
            &librarian,
            request.id,
            &BorrowDecision::Decline {
                feedback: Some("Reference copy".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(declined.status, RequestStatus::Declined);
    assert_eq!(declined.feedback.as_deref(), Some("Reference copy"));
    assert_eq!(desk.lookup_book("BC100").await.unwrap().status, BookStatus::Available);

    let late = desk
        .decide_borrow(&librarian, request.id, &BorrowDecision::Approve { due_in_days: None })
        .await
        .unwrap_err();
    assert!(matches!(late, PortalError::Conflict(_)));
}

#[tokio::test]
async fn students_cannot_run_the_desk() {
    let (portal, desk) = desk_with_book().await;
    let student = portal.student("S001", "Ana Cruz").await;

    let err = desk.lend_direct(&student, "BC100", "S001", None).await.unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));
    let err = desk.scan_return(&student, "BC100").await.unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[tokio::test]
async fn loan_length_is_bounded() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    let student = portal.student("S001", "Ana Cruz").await;

    for days in [0, 366, 1_000_000_000, i64::MAX] {
        let err = desk.lend_direct(&librarian, "BC100", "S001", Some(days)).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)), "{days} days");
    }

    let request = desk.request_borrow(&student, "BC100").await.unwrap();
    let err = desk
        .decide_borrow(&librarian, request.id, &BorrowDecision::Approve { due_in_days: Some(i64::MAX) })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
    assert_eq!(desk.lookup_book("BC100").await.unwrap().status, BookStatus::Available);
    assert_eq!(
        library::get_borrow_request(&portal.pool, request.id)
            .await
            .unwrap()
            .unwrap()
            .status,
        RequestStatus::Pending
    );
    assert_eq!(open_records(&portal).await, 0);
}

#[tokio::test]
async fn copies_per_request_are_capped() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    let form = |copies| BookForm {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        barcode: None,
        copies: Some(copies),
    };

    let err = desk.add_book(&librarian, &form(u32::MAX)).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
    let err = desk.add_book(&librarian, &form(0)).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    let added = desk.add_book(&librarian, &form(3)).await.unwrap();
    assert_eq!(added.len(), 3);
    assert_eq!(desk.list_books(None, Some("dune")).await.unwrap().len(), 3);
}

#[tokio::test]
async fn only_students_request_books() {
    let (portal, desk) = desk_with_book().await;
    for handle in ["library", "admin"] {
        let staff = portal.user(handle).await;
        let err = desk.request_borrow(&staff, "BC100").await.unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
    }
}

#[tokio::test]
async fn overdue_loans_count_whole_days() {
    let (portal, desk) = desk_with_book().await;
    let librarian = portal.user("library").await;
    portal.student("S001", "Ana Cruz").await;

    let record = desk.lend_direct(&librarian, "BC100", "S001", Some(3)).await.unwrap();
    assert!(desk.overdue(Utc::now()).await.unwrap().is_empty());

    let later = record.due_date + TimeDelta::days(2) + TimeDelta::hours(5);
    let overdue = desk.overdue(later).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].record.barcode, "BC100");
    assert_eq!(overdue[0].days_overdue, 2);

    desk.scan_return(&librarian, "BC100").await.unwrap();
    assert!(desk.overdue(later).await.unwrap().is_empty());
}
