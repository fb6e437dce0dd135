use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Longest accepted identifier.
pub const MAX_ID_LEN: usize = 64;

/// Opaque record identifier.
///
/// Valid ids are 1..=64 characters of `[A-Za-z0-9_-]`. The empty id marks a
/// record the store has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid record id '{raw}': {reason}")]
pub struct InvalidRecordId {
    pub raw: String,
    pub reason: &'static str,
}

impl RecordId {
    pub const UNASSIGNED: RecordId = RecordId(String::new());

    pub fn parse(raw: &str) -> Result<Self, InvalidRecordId> {
        let reason = if raw.is_empty() {
            Some("must not be empty")
        } else if raw.len() > MAX_ID_LEN {
            Some("longer than 64 characters")
        } else if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Some("only ASCII letters, digits, '-' and '_' are allowed")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(InvalidRecordId {
                raw: raw.to_string(),
                reason,
            }),
            None => Ok(Self(raw.to_string())),
        }
    }

    /// Fresh store-side identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named record collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Users,
    Courses,
    Enrollments,
    ChatMessages,
    AuditLogs,
}

impl Collection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Courses => "courses",
            Collection::Enrollments => "enrollments",
            Collection::ChatMessages => "chatMessages",
            Collection::AuditLogs => "auditLogs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    /// Human-facing label, also used as the placeholder actor name.
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Tutor => "Tutor",
            Role::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    pub display_name: String,
    pub role: Role,
    pub email: String,
    pub photo_url: Option<String>,
}

/// Profile fields that may change; the role never does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: RecordId,
    pub title: String,
    pub department: String,
    /// Soft reference to the owning tutor; may dangle.
    pub tutor_id: RecordId,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub department: Option<String>,
    pub content: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl EnrollmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::PendingReview => "PENDING_REVIEW",
            EnrollmentStatus::Approved => "APPROVED",
            EnrollmentStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: RecordId,
    pub student_id: RecordId,
    pub course_id: RecordId,
    pub status: EnrollmentStatus,
    pub applied_at: DateTime<Utc>,
}

/// Enrollments are only ever re-statused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentPatch {
    pub status: EnrollmentStatus,
}

/// Outcome of a tutor reviewing an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationDecision {
    Approve,
    Reject,
}

impl ApplicationDecision {
    pub const fn status(self) -> EnrollmentStatus {
        match self {
            ApplicationDecision::Approve => EnrollmentStatus::Approved,
            ApplicationDecision::Reject => EnrollmentStatus::Rejected,
        }
    }

    pub const fn action_code(self) -> &'static str {
        match self {
            ApplicationDecision::Approve => "APPROVE_APPLICATION",
            ApplicationDecision::Reject => "REJECT_APPLICATION",
        }
    }
}

/// Unordered pair of conversation participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    low: RecordId,
    high: RecordId,
}

impl ConversationKey {
    pub fn between(a: &RecordId, b: &RecordId) -> Self {
        if a <= b {
            Self {
                low: a.clone(),
                high: b.clone(),
            }
        } else {
            Self {
                low: b.clone(),
                high: a.clone(),
            }
        }
    }

    pub fn involves(&self, id: &RecordId) -> bool {
        &self.low == id || &self.high == id
    }

    /// The participant that is not `me`, if `me` takes part at all.
    pub fn peer_of(&self, me: &RecordId) -> Option<&RecordId> {
        if &self.low == me {
            Some(&self.high)
        } else if &self.high == me {
            Some(&self.low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub id: RecordId,
    pub sender_id: RecordId,
    pub conversation: ConversationKey,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Tutor,
    Student,
    System,
}

impl From<Role> for LogType {
    fn from(role: Role) -> Self {
        match role {
            Role::Tutor => LogType::Tutor,
            Role::Student => LogType::Student,
            Role::Admin => LogType::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: RecordId,
    pub actor_id: RecordId,
    pub actor_name: String,
    pub action: String,
    pub target_id: RecordId,
    pub details: String,
    pub log_type: LogType,
    pub created_at: DateTime<Utc>,
}

/// Identity attributed to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: RecordId,
    pub display_name: String,
}

impl Actor {
    pub const PLACEHOLDER_ID: &'static str = "unknown";

    /// Stand-in used when the identity provider has nobody signed in.
    pub fn placeholder(role: Role) -> Self {
        Self {
            id: RecordId(Self::PLACEHOLDER_ID.to_string()),
            display_name: role.label().to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.as_str() == Self::PLACEHOLDER_ID
    }
}

/// Dashboard sections the presentation layer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Section {
    #[default]
    Dashboard,
    Courses,
    Students,
    Applications,
    Messages,
    AuditLog,
    Profile,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Courses,
        Section::Students,
        Section::Applications,
        Section::Messages,
        Section::AuditLog,
        Section::Profile,
    ];
}
