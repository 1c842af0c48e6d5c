use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    LibraryAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::LibraryAdmin => "library_admin",
        }
    }

    /// Roles that may own subjects and decide on their requests.
    pub fn can_teach(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    pub fn manages_library(&self) -> bool {
        matches!(self, Role::LibraryAdmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared by enrollments, booking requests and borrow requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Declined => "Declined",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "declined" => Some(RequestStatus::Declined),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Decline,
}

impl Decision {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Decision::Approve),
            "decline" => Some(Decision::Decline),
            _ => None,
        }
    }

    pub fn outcome(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Decline => RequestStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ResourceKind {
    Lab,
    Room,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Lab => "lab",
            ResourceKind::Room => "room",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum BookStatus {
    Available,
    Borrowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PcStatus {
    Available,
    OutOfService,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub handle: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub teacher: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub subject_id: i64,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectWithSchedules {
    #[serde(flatten)]
    pub subject: Subject,
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student: String,
    pub teacher: String,
    pub subject: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: i64,
    pub student: String,
    pub teacher: String,
    pub subject: String,
    pub resource_kind: ResourceKind,
    pub lab_id: Option<i64>,
    pub room_id: Option<i64>,
    pub resource_name: String,
    pub pc_number: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub request_id: i64,
    pub student: String,
    pub teacher: String,
    pub subject: String,
    pub resource_kind: ResourceKind,
    pub lab_id: Option<i64>,
    pub room_id: Option<i64>,
    pub resource_name: String,
    pub pc_number: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PcHistoryEntry {
    pub id: i64,
    pub lab_id: i64,
    pub lab_name: String,
    pub pc_number: i64,
    pub student: String,
    pub student_name: String,
    pub teacher: String,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lab {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LabPc {
    pub lab_id: i64,
    pub number: i64,
    pub status: PcStatus,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub teacher: String,
    pub subject: String,
    pub resource_kind: ResourceKind,
    pub resource_id: i64,
    pub resource_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub barcode: String,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub borrowed_by: Option<String>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub id: i64,
    pub student: String,
    pub barcode: String,
    pub book_title: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: i64,
    pub barcode: String,
    pub book_title: String,
    pub borrower: String,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub details: Json<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_parse_is_case_insensitive() {
        assert_eq!(RequestStatus::parse("approved"), Some(RequestStatus::Approved));
        assert_eq!(RequestStatus::parse(" Pending "), Some(RequestStatus::Pending));
        assert_eq!(RequestStatus::parse("cancelled"), None);
    }

    #[test]
    fn user_credentials_are_not_serialized() {
        let user = User {
            handle: "S001".into(),
            name: "Ana".into(),
            email: "S001_Ana@amacc_lipa.com".into(),
            role: Role::Student,
            password_hash: "sha256$salt$digest".into(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "student");
    }

    #[test]
    fn decisions_deserialize_from_lowercase() {
        let decision: Decision = serde_json::from_str("\"decline\"").unwrap();
        assert_eq!(decision.outcome(), RequestStatus::Declined);
    }
}
