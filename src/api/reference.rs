use serde::de::DeserializeOwned;

use crate::types::{Priority, ReferenceKind, Status, User};

use super::{ApiError, TrackerClient};

// ---------------------------------------------------------------------------
// Fallible fetches
// ---------------------------------------------------------------------------

async fn fetch_active<T: DeserializeOwned>(
    client: &TrackerClient,
    kind: ReferenceKind,
    force: bool,
) -> Result<Vec<T>, ApiError> {
    let items: Vec<T> = client.get_json_cached(kind.active_path(), force).await?;
    tracing::debug!("api: active {} count={}", kind.label(), items.len());
    Ok(items)
}

/// `GET /api/priorities/active`, through the response cache unless `force`.
pub async fn fetch_active_priorities(
    client: &TrackerClient,
    force: bool,
) -> Result<Vec<Priority>, ApiError> {
    fetch_active(client, ReferenceKind::Priorities, force).await
}

/// `GET /api/statuses/active`, through the response cache unless `force`.
pub async fn fetch_active_statuses(
    client: &TrackerClient,
    force: bool,
) -> Result<Vec<Status>, ApiError> {
    fetch_active(client, ReferenceKind::Statuses, force).await
}

/// `GET /api/users/active`, through the response cache unless `force`.
pub async fn fetch_active_users(client: &TrackerClient, force: bool) -> Result<Vec<User>, ApiError> {
    fetch_active(client, ReferenceKind::Users, force).await
}

// ---------------------------------------------------------------------------
// Infallible loaders
// ---------------------------------------------------------------------------
//
// Failures are logged and yield an empty list.

pub async fn load_active_priorities(client: &TrackerClient) -> Vec<Priority> {
    fetch_active_priorities(client, false)
        .await
        .unwrap_or_else(|e| log_failure(ReferenceKind::Priorities, &e))
}

pub async fn load_active_statuses(client: &TrackerClient) -> Vec<Status> {
    fetch_active_statuses(client, false)
        .await
        .unwrap_or_else(|e| log_failure(ReferenceKind::Statuses, &e))
}

pub async fn load_active_users(client: &TrackerClient) -> Vec<User> {
    fetch_active_users(client, false)
        .await
        .unwrap_or_else(|e| log_failure(ReferenceKind::Users, &e))
}

fn log_failure<T>(kind: ReferenceKind, err: &ApiError) -> Vec<T> {
    tracing::error!("failed to load active {}: {err}", kind.label());
    Vec::new()
}
