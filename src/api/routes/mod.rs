pub mod auth;
pub mod bookings;
pub mod enrollments;
pub mod facilities;
pub mod health;
pub mod library;
pub mod reports;
pub mod schedule;
pub mod sessions;
pub mod subjects;
pub mod users;

use crate::api::state::AppState;
use crate::database::models::{Decision, RequestStatus};
use crate::error::{PortalError, Result};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

/// Creates the portal router with every route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        // Identity
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:handle",
            get(users::get_user).delete(users::delete_user),
        )
        // Subjects
        .route(
            "/subjects",
            get(subjects::list_subjects).post(subjects::add_subject),
        )
        .route("/subjects/:id", delete(subjects::delete_subject))
        .route("/subjects/:id/schedules", post(subjects::add_schedule))
        .route("/schedules/:id", delete(subjects::remove_schedule))
        // Enrollment
        .route(
            "/enrollments",
            get(enrollments::list_enrollments).post(enrollments::request_enrollment),
        )
        .route("/enrollments/mine", get(enrollments::my_enrollments))
        .route("/enrollments/students", get(enrollments::approved_students))
        .route("/enrollments/:id/action", post(enrollments::decide_enrollment))
        // Booking and sessions
        .route(
            "/requests",
            get(bookings::list_requests).post(bookings::create_request),
        )
        .route("/requests/pending", get(bookings::pending_requests))
        .route("/requests/:id/action", post(bookings::decide_request))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:id/end", post(sessions::end_session))
        // Facilities
        .route("/labs", get(facilities::list_labs).post(facilities::add_lab))
        .route(
            "/labs/:id",
            get(facilities::get_lab)
                .put(facilities::rename_lab)
                .delete(facilities::delete_lab),
        )
        .route("/labs/:id/pcs", get(facilities::lab_status))
        .route("/labs/:id/available-pcs", get(facilities::available_pcs))
        .route("/labs/:id/pcs/:number", put(facilities::set_pc_status))
        .route("/labs/:id/pcs/:number/history", get(facilities::pc_history))
        .route("/rooms", get(facilities::list_rooms).post(facilities::add_room))
        .route(
            "/rooms/:id",
            put(facilities::update_room).delete(facilities::delete_room),
        )
        // Schedule
        .route(
            "/reservations",
            get(schedule::list_reservations).post(schedule::reserve),
        )
        .route("/reservations/:id", delete(schedule::cancel_reservation))
        .route("/today", get(schedule::today))
        // Library
        .route("/books", get(library::list_books).post(library::add_book))
        .route(
            "/books/:barcode",
            get(library::lookup_book)
                .put(library::update_book)
                .delete(library::delete_book),
        )
        .route(
            "/borrow-requests",
            get(library::list_borrow_requests).post(library::request_borrow),
        )
        .route("/borrow-requests/:id/action", post(library::decide_borrow))
        .route("/lend", post(library::lend))
        .route("/return", post(library::scan_return))
        .route("/borrow-records", get(library::list_borrow_records))
        .route("/borrow-records/overdue", get(library::overdue))
        // Reports
        .route("/audit", get(reports::audit_log))
        .route("/dashboard", get(reports::dashboard))
        .with_state(state)
}

/// `{"action": "approve" | "decline"}`; extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub action: String,
}

impl ActionBody {
    pub fn decision(&self) -> Result<Decision> {
        Decision::parse(&self.action)
            .ok_or_else(|| PortalError::validation(format!("Invalid action '{}'", self.action)))
    }
}

pub(crate) fn parse_status(raw: Option<&str>) -> Result<Option<RequestStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => RequestStatus::parse(value)
            .map(Some)
            .ok_or_else(|| PortalError::validation(format!("Unknown status '{value}'"))),
    }
}
