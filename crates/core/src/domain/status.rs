// Company Status Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the user or system that set a status
pub type UserId = String;

/// Status tag written by the classification layer.
///
/// The ledger does not interpret the tag; unknown values are kept verbatim
/// in `Other` so they survive a read/write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusValue {
    Unsafe,
    Exception,
    Cleared,
    Other(String),
}

impl StatusValue {
    pub fn as_str(&self) -> &str {
        match self {
            StatusValue::Unsafe => "unsafe",
            StatusValue::Exception => "exception",
            StatusValue::Cleared => "cleared",
            StatusValue::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StatusValue {
    fn from(tag: &str) -> Self {
        match tag {
            "unsafe" => StatusValue::Unsafe,
            "exception" => StatusValue::Exception,
            "cleared" => StatusValue::Cleared,
            other => StatusValue::Other(other.to_string()),
        }
    }
}

impl From<String> for StatusValue {
    fn from(tag: String) -> Self {
        StatusValue::from(tag.as_str())
    }
}

impl From<StatusValue> for String {
    fn from(value: StatusValue) -> Self {
        value.as_str().to_string()
    }
}

/// One row of the company status ledger.
///
/// The company id is not part of the record: it is the key the record is
/// filed under. `(company_id, user_id)` is unique among stored rows, and an
/// upsert only ever rewrites `note` and `status` of an existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub user_id: UserId,
    pub note: Option<String>,
    pub status: StatusValue,

    /// Set once by the caller, never rewritten by the update path
    pub created_at: DateTime<Utc>,

    /// Soft-delete marker, maintained outside the ledger
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn new(
        user_id: impl Into<String>,
        status: impl Into<StatusValue>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            note: None,
            status: status.into(),
            created_at,
            deleted_at: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_visible(&self) -> bool {
        self.deleted_at.is_none()
    }
}
