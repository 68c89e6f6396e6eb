use serde::{Deserialize, Serialize};

use super::common::{EnableState, enable_state_de, null_as_default};

// ---------------------------------------------------------------------------
// Reference entities
// ---------------------------------------------------------------------------

/// A bug priority level (e.g. "High").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub id: i64,
    /// Display label. Older servers name this column `name`.
    #[serde(alias = "name", default, deserialize_with = "null_as_default::deserialize")]
    pub level: String,
    #[serde(default, deserialize_with = "enable_state_de::deserialize")]
    pub status: EnableState,
}

/// A bug workflow status (e.g. "Open", "In Progress").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    #[serde(
        rename = "statusLabel",
        default,
        deserialize_with = "null_as_default::deserialize"
    )]
    pub label: String,
    #[serde(default, deserialize_with = "enable_state_de::deserialize")]
    pub status: EnableState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub role: String,
}

/// A tracker account. Active users are the assignee candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default::deserialize")]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "enable_state_de::deserialize")]
    pub status: EnableState,
}

impl User {
    /// `"First Last"`, falling back to the email when both names are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_owned()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role
            .as_ref()
            .is_some_and(|r| r.role.eq_ignore_ascii_case("admin"))
    }
}

// ---------------------------------------------------------------------------
// Reference collection kinds
// ---------------------------------------------------------------------------

/// The three reference collections the bug editor depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Priorities,
    Statuses,
    Users,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 3] = [
        ReferenceKind::Priorities,
        ReferenceKind::Statuses,
        ReferenceKind::Users,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Priorities => "priorities",
            Self::Statuses => "statuses",
            Self::Users => "users",
        }
    }

    /// REST path of the active-only listing, relative to the server root.
    pub fn active_path(self) -> &'static str {
        match self {
            Self::Priorities => "api/priorities/active",
            Self::Statuses => "api/statuses/active",
            Self::Users => "api/users/active",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_accepts_legacy_name_column() {
        let p: Priority =
            serde_json::from_str(r#"{"id":3,"name":"High","status":"active"}"#).unwrap();
        assert_eq!(p.level, "High");
        assert!(p.status.is_active());
    }

    #[test]
    fn status_reads_status_label() {
        let s: Status =
            serde_json::from_str(r#"{"id":1,"statusLabel":"Open","status":"disabled"}"#).unwrap();
        assert_eq!(s.label, "Open");
        assert_eq!(s.status, EnableState::Disabled);
    }

    #[test]
    fn user_full_name_joins_first_and_last() {
        let u: User = serde_json::from_str(
            r#"{"id":7,"email":"jd@example.com","firstName":"John","lastName":"Doe"}"#,
        )
        .unwrap();
        assert_eq!(u.full_name(), "John Doe");
    }

    #[test]
    fn user_full_name_falls_back_to_email() {
        let u: User =
            serde_json::from_str(r#"{"id":7,"email":"jd@example.com","firstName":null}"#).unwrap();
        assert_eq!(u.full_name(), "jd@example.com");
    }

    #[test]
    fn admin_role_is_case_insensitive() {
        let u: User =
            serde_json::from_str(r#"{"id":1,"role":{"id":1,"role":"ADMIN"}}"#).unwrap();
        assert!(u.is_admin());
    }
}
