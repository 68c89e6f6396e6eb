use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the tracker REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request path \"{path}\": {message}")]
    InvalidUrl { path: String, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{}", status_text(*status, message.as_deref()))]
    Status {
        status: StatusCode,
        /// `message` (or `error`) field of the JSON error body, if any.
        message: Option<String>,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True when the session is missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status()
            .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }

    /// The human-readable message the server attached to the failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn status_text(status: StatusCode, message: Option<&str>) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => m.to_owned(),
        _ => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ),
    }
}

/// Pull a message out of a JSON error body (`{"message": ...}` or
/// `{"error": ...}`). Plain-text bodies are used as-is when short.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return ["message", "error"]
            .iter()
            .find_map(|k| value.get(k).and_then(serde_json::Value::as_str))
            .filter(|m| !m.trim().is_empty())
            .map(str::to_owned);
    }
    if trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return Some(trimmed.to_owned());
    }
    None
}
