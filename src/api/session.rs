use reqwest::{Method, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::types::User;

use super::auth::Credentials;
use super::{ApiError, TrackerClient};

/// Message shown when the server rejects a login without saying why.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Shown for a 409 on registration when the server sends no text.
pub const EMAIL_TAKEN: &str = "A user with this email already exists.";

/// Shown when a password change fails without a server message.
pub const PASSWORD_UPDATE_FAILED: &str = "Error updating password";

/// Role given to self-registered accounts (`user`).
pub const SELF_SERVICE_ROLE_ID: i64 = 2;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// `POST /api/login`. On success the session cookie lands in the client's jar.
pub async fn login(client: &TrackerClient, email: &str, password: &str) -> Result<(), ApiError> {
    let body = LoginRequest { email, password };
    match client.post_json_discard("api/login", &body).await {
        Ok(()) => {
            tracing::debug!("api: logged in as {email}");
            Ok(())
        }
        Err(ApiError::Status { status, message }) => Err(ApiError::Status {
            status,
            message: Some(message.unwrap_or_else(|| INVALID_CREDENTIALS.to_owned())),
        }),
        Err(e) => Err(e),
    }
}

/// `GET /api/me`. `None` when the session is anonymous (204).
pub async fn current_user(client: &TrackerClient) -> Result<Option<User>, ApiError> {
    client.get_optional_json("api/me").await
}

/// `POST /api/logout`.
pub async fn logout(client: &TrackerClient) -> Result<(), ApiError> {
    client.post_empty("api/logout").await
}

/// Authenticate with `credentials` and return the signed-in user.
pub async fn establish(client: &TrackerClient, credentials: &Credentials) -> Result<User, ApiError> {
    match credentials {
        Credentials::SessionCookie(value) => client.set_session_cookie(value),
        Credentials::Password { email, password } => login(client, email, password).await?,
    }
    current_user(client).await?.ok_or_else(|| ApiError::Status {
        status: StatusCode::UNAUTHORIZED,
        message: Some(match credentials {
            Credentials::SessionCookie(_) => "session cookie was not accepted".to_owned(),
            Credentials::Password { .. } => INVALID_CREDENTIALS.to_owned(),
        }),
    })
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A new account, as entered on the sign-up form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
    user_role_id: i64,
    status: &'static str,
}

/// `POST /api/users/register`. Self-registered accounts start active with
/// the plain user role.
pub async fn register(client: &TrackerClient, registration: &Registration) -> Result<(), ApiError> {
    let body = RegisterRequest {
        email: &registration.email,
        first_name: &registration.first_name,
        last_name: &registration.last_name,
        password: &registration.password,
        user_role_id: SELF_SERVICE_ROLE_ID,
        status: "active",
    };
    match client.post_json_discard("api/users/register", &body).await {
        Ok(()) => {
            tracing::info!("api: registered {}", registration.email);
            Ok(())
        }
        Err(ApiError::Status { status, message }) => {
            let fallback = if status == StatusCode::CONFLICT {
                EMAIL_TAKEN
            } else {
                INVALID_CREDENTIALS
            };
            Err(ApiError::Status {
                status,
                message: Some(message.unwrap_or_else(|| fallback.to_owned())),
            })
        }
        Err(e) => Err(e),
    }
}

/// New name and email for the signed-in account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileUpdate {
    /// Start from `user`'s current details.
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// `PUT /api/me`. Returns the account as the server stored it.
pub async fn update_profile(client: &TrackerClient, update: &ProfileUpdate) -> Result<User, ApiError> {
    client.send_json(Method::PUT, "api/me", update).await
}

/// A password change that was refused before or by the server.
#[derive(Debug, Error)]
pub enum PasswordChangeError {
    #[error("Passwords must match and cannot be empty.")]
    Mismatch,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// `PUT /api/me/password` with the new password as a plain-text body.
///
/// `confirmation` must repeat `password` exactly; nothing is sent otherwise.
pub async fn change_password(
    client: &TrackerClient,
    password: &str,
    confirmation: &str,
) -> Result<(), PasswordChangeError> {
    if password.is_empty() || password != confirmation {
        return Err(PasswordChangeError::Mismatch);
    }
    match client.put_text("api/me/password", password).await {
        Ok(()) => Ok(()),
        Err(ApiError::Status { status, message }) => Err(ApiError::Status {
            status,
            message: Some(message.unwrap_or_else(|| PASSWORD_UPDATE_FAILED.to_owned())),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}
