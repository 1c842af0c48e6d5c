//! The portal as a repository interface. A UI talks to [`PortalBackend`]
//! and does not care whether the data lives in the local SQLite database
//! or behind a remote portal server.

pub mod local;
pub mod remote;

use crate::database::models::{
    Book, BookStatus, Decision, Enrollment, Lab, RequestStatus, Role, Room, SubjectWithSchedules,
    User,
};
use crate::error::Result;
use crate::workflows::identity::RegisterForm;
use std::future::Future;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Operations that take an `actor` act on behalf of that user handle.
pub trait PortalBackend: Send + Sync {
    fn login(&self, handle: &str, password: &str) -> impl Future<Output = Result<User>> + Send;

    fn register(&self, form: &RegisterForm) -> impl Future<Output = Result<User>> + Send;

    fn users(&self, actor: &str, role: Option<Role>) -> impl Future<Output = Result<Vec<User>>> + Send;

    fn subjects(
        &self,
        teacher: Option<&str>,
    ) -> impl Future<Output = Result<Vec<SubjectWithSchedules>>> + Send;

    fn request_enrollment(
        &self,
        actor: &str,
        teacher: &str,
        subject: &str,
    ) -> impl Future<Output = Result<Enrollment>> + Send;

    fn enrollments(
        &self,
        actor: &str,
        teacher: &str,
        status: Option<RequestStatus>,
    ) -> impl Future<Output = Result<Vec<Enrollment>>> + Send;

    fn decide_enrollment(
        &self,
        actor: &str,
        id: i64,
        decision: Decision,
    ) -> impl Future<Output = Result<Enrollment>> + Send;

    fn books(
        &self,
        status: Option<BookStatus>,
        search: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Book>>> + Send;

    fn labs(&self) -> impl Future<Output = Result<Vec<Lab>>> + Send;

    fn rooms(&self) -> impl Future<Output = Result<Vec<Room>>> + Send;
}
