use super::PortalBackend;
use crate::config::Config;
use crate::database::models::{
    Book, BookStatus, Decision, Enrollment, Lab, RequestStatus, Role, Room, SubjectWithSchedules,
    User,
};
use crate::error::Result;
use crate::workflows::enrollment::EnrollmentWorkflow;
use crate::workflows::facilities::FacilityRegistry;
use crate::workflows::identity::{Identity, RegisterForm};
use crate::workflows::lending::LendingDesk;
use crate::workflows::subjects::SubjectCatalog;
use sqlx::SqlitePool;

/// Runs every operation against the local database through the workflows.
pub struct LocalBackend {
    identity: Identity,
    subjects: SubjectCatalog,
    enrollment: EnrollmentWorkflow,
    lending: LendingDesk,
    facilities: FacilityRegistry,
}

impl LocalBackend {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            identity: Identity::new(pool.clone(), config.clone()),
            subjects: SubjectCatalog::new(pool.clone()),
            enrollment: EnrollmentWorkflow::new(pool.clone()),
            lending: LendingDesk::new(pool.clone(), config),
            facilities: FacilityRegistry::new(pool),
        }
    }
}

impl PortalBackend for LocalBackend {
    async fn login(&self, handle: &str, password: &str) -> Result<User> {
        self.identity.login(handle, password).await
    }

    async fn register(&self, form: &RegisterForm) -> Result<User> {
        self.identity.register(form).await
    }

    async fn users(&self, actor: &str, role: Option<Role>) -> Result<Vec<User>> {
        self.identity.resolve_actor(actor).await?;
        self.identity.list_users(role).await
    }

    async fn subjects(&self, teacher: Option<&str>) -> Result<Vec<SubjectWithSchedules>> {
        self.subjects.list_subjects(teacher).await
    }

    async fn request_enrollment(&self, actor: &str, teacher: &str, subject: &str) -> Result<Enrollment> {
        let actor = self.identity.resolve_actor(actor).await?;
        self.enrollment.request(&actor, teacher, subject).await
    }

    async fn enrollments(
        &self,
        actor: &str,
        teacher: &str,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Enrollment>> {
        let actor = self.identity.resolve_actor(actor).await?;
        self.enrollment.for_teacher(&actor, teacher, status).await
    }

    async fn decide_enrollment(&self, actor: &str, id: i64, decision: Decision) -> Result<Enrollment> {
        let actor = self.identity.resolve_actor(actor).await?;
        self.enrollment.decide(&actor, id, decision).await
    }

    async fn books(&self, status: Option<BookStatus>, search: Option<&str>) -> Result<Vec<Book>> {
        self.lending.list_books(status, search).await
    }

    async fn labs(&self) -> Result<Vec<Lab>> {
        self.facilities.list_labs().await
    }

    async fn rooms(&self) -> Result<Vec<Room>> {
        self.facilities.list_rooms().await
    }
}
