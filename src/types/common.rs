use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enablement flag shared by priorities, statuses, roles and users
// ---------------------------------------------------------------------------

/// Soft-enablement flag carried by reference entities.
///
/// Controls whether an entity may be newly assigned; historical references to
/// a disabled entity stay valid and visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnableState {
    #[default]
    Active,
    Disabled,
    #[serde(other)]
    Unknown,
}

impl EnableState {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
            Self::Unknown => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserialization
// ---------------------------------------------------------------------------

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as the
/// type's default value. The server sends `null` for unset text columns.
pub(crate) mod null_as_default {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Deserialize an [`EnableState`] from free text, case-insensitively.
///
/// Older server builds stored the flag as entered (`"Active"`), newer ones
/// lower-case it before saving.
pub(crate) mod enable_state_de {
    use serde::{Deserialize, Deserializer};

    use super::EnableState;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<EnableState, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        Ok(match s.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("" | "active") => EnableState::Active,
            Some("disabled") => EnableState::Disabled,
            Some(_) => EnableState::Unknown,
        })
    }
}
