use super::PortalBackend;
use crate::database::models::{
    Book, BookStatus, Decision, Enrollment, Lab, RequestStatus, Role, Room, SubjectWithSchedules,
    User,
};
use crate::error::{PortalError, Result};
use crate::workflows::identity::RegisterForm;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

pub const ACTOR_HEADER: &str = "X-User";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a portal server over its REST surface. Failures are reported
/// once and never retried.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PortalError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortalError::Transport(e.to_string()))?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| PortalError::Transport(format!("malformed reply: {e}")));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        tracing::debug!("Remote portal answered {}: {}", status, message);
        Err(PortalError::from_status(status, message))
    }
}

impl PortalBackend for RemoteBackend {
    async fn login(&self, handle: &str, password: &str) -> Result<User> {
        let request = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "handle": handle, "password": password }));
        self.send(request).await
    }

    async fn register(&self, form: &RegisterForm) -> Result<User> {
        self.send(self.client.post(self.url("/register")).json(form)).await
    }

    async fn users(&self, actor: &str, role: Option<Role>) -> Result<Vec<User>> {
        let mut request = self.client.get(self.url("/users")).header(ACTOR_HEADER, actor);
        if let Some(role) = role {
            request = request.query(&[("role", role.as_str())]);
        }
        self.send(request).await
    }

    async fn subjects(&self, teacher: Option<&str>) -> Result<Vec<SubjectWithSchedules>> {
        let mut request = self.client.get(self.url("/subjects"));
        if let Some(teacher) = teacher {
            request = request.query(&[("teacher", teacher)]);
        }
        self.send(request).await
    }

    async fn request_enrollment(&self, actor: &str, teacher: &str, subject: &str) -> Result<Enrollment> {
        let request = self
            .client
            .post(self.url("/enrollments"))
            .header(ACTOR_HEADER, actor)
            .json(&json!({ "teacher": teacher, "subject": subject }));
        self.send(request).await
    }

    async fn enrollments(
        &self,
        actor: &str,
        teacher: &str,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Enrollment>> {
        let mut query = vec![("teacher_usn", teacher)];
        if let Some(status) = status {
            query.push(("status", status.as_str()));
        }
        let request = self
            .client
            .get(self.url("/enrollments"))
            .header(ACTOR_HEADER, actor)
            .query(&query);
        self.send(request).await
    }

    async fn decide_enrollment(&self, actor: &str, id: i64, decision: Decision) -> Result<Enrollment> {
        let request = self
            .client
            .post(self.url(&format!("/enrollments/{id}/action")))
            .header(ACTOR_HEADER, actor)
            .json(&json!({ "action": decision }));
        self.send(request).await
    }

    async fn books(&self, status: Option<BookStatus>, search: Option<&str>) -> Result<Vec<Book>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(status) = status {
            query.push((
                "status",
                match status {
                    BookStatus::Available => "Available",
                    BookStatus::Borrowed => "Borrowed",
                },
            ));
        }
        if let Some(search) = search {
            query.push(("search", search));
        }
        self.send(self.client.get(self.url("/books")).query(&query)).await
    }

    async fn labs(&self) -> Result<Vec<Lab>> {
        self.send(self.client.get(self.url("/labs"))).await
    }

    async fn rooms(&self) -> Result<Vec<Room>> {
        self.send(self.client.get(self.url("/rooms"))).await
    }
}
