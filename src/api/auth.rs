use std::fmt;

use anyhow::{Result, bail};

use crate::config::types::ServerConfig;

/// How the client authenticates against the tracker.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Reuse an existing `JSESSIONID` obtained elsewhere (e.g. the browser).
    SessionCookie(String),
    /// Log in with email and password.
    Password { email: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionCookie(_) => f
                .debug_tuple("SessionCookie")
                .field(&"[REDACTED]")
                .finish(),
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Resolve credentials for the configured server.
///
/// Priority:
/// 1. `BUGDESK_SESSION` environment variable (session cookie value)
/// 2. `BUGDESK_EMAIL` + `BUGDESK_PASSWORD`
/// 3. `server.email` from the config file + `BUGDESK_PASSWORD`
pub fn resolve_credentials(server: &ServerConfig) -> Result<Credentials> {
    resolve_from(|key| std::env::var(key).ok(), server)
}

/// Same as [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_from(
    lookup: impl Fn(&str) -> Option<String>,
    server: &ServerConfig,
) -> Result<Credentials> {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(cookie) = non_empty("BUGDESK_SESSION") {
        return Ok(Credentials::SessionCookie(cookie.trim().to_owned()));
    }

    let email = non_empty("BUGDESK_EMAIL").or_else(|| {
        server
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
    });
    match (email, non_empty("BUGDESK_PASSWORD")) {
        (Some(email), Some(password)) => Ok(Credentials::Password {
            email: email.trim().to_owned(),
            password,
        }),
        (Some(email), None) => bail!(
            "no password for {email}. Set BUGDESK_PASSWORD, or BUGDESK_SESSION to reuse a session."
        ),
        (None, _) => bail!(
            "no tracker credentials found. Set BUGDESK_EMAIL and BUGDESK_PASSWORD, \
             set server.email in the config file, or set BUGDESK_SESSION."
        ),
    }
}
