//! Typed statements, one module per table family.
//!
//! Every function takes any SQLite executor so the same statement runs
//! against the pool or inside a workflow's transaction (`&mut *tx`).

pub mod audit;
pub mod bookings;
pub mod enrollments;
pub mod facilities;
pub mod library;
pub mod reservations;
pub mod sessions;
pub mod subjects;
pub mod users;
