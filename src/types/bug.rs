use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::common::null_as_default;
use super::reference::{Priority, Status, User};

/// Maximum title length accepted by the server, in characters.
pub const TITLE_MAX_CHARS: usize = 255;
/// Maximum description length accepted by the server, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 4000;

// ---------------------------------------------------------------------------
// Bug record
// ---------------------------------------------------------------------------

/// A bug as returned by `GET /api/bugs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub created_by: Option<User>,
    /// Server-local creation time (the server sends no zone offset).
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Bug {
    pub fn priority_id(&self) -> Option<i64> {
        self.priority.as_ref().map(|p| p.id)
    }

    pub fn status_id(&self) -> Option<i64> {
        self.status.as_ref().map(|s| s.id)
    }

    pub fn assignee_id(&self) -> Option<i64> {
        self.assignee.as_ref().map(|u| u.id)
    }

    pub fn priority_label(&self) -> &str {
        self.priority.as_ref().map_or("-", |p| p.level.as_str())
    }

    pub fn status_label(&self) -> &str {
        self.status.as_ref().map_or("-", |s| s.label.as_str())
    }

    pub fn assignee_name(&self) -> String {
        self.assignee
            .as_ref()
            .map_or_else(|| "-".to_owned(), User::full_name)
    }

    pub fn creator_name(&self) -> Option<String> {
        self.created_by.as_ref().map(User::full_name)
    }
}

// ---------------------------------------------------------------------------
// Mutation payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/bugs`. Every key is always present; unset references
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugPayload {
    pub title: String,
    pub description: String,
    pub priority_id: Option<i64>,
    pub status_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub created_by_user_id: Option<i64>,
}

/// Body of `PUT /api/bugs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBugPayload {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority_id: Option<i64>,
    pub status_id: Option<i64>,
    pub assignee_id: Option<i64>,
}
