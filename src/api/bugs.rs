use reqwest::Method;

use crate::types::{Bug, CreateBugPayload, UpdateBugPayload};

use super::{ApiError, TrackerClient};

/// `GET /api/bugs`: every bug the session can see.
pub async fn list_bugs(client: &TrackerClient) -> Result<Vec<Bug>, ApiError> {
    let bugs: Vec<Bug> = client.get_json("api/bugs").await?;
    tracing::debug!("api: list_bugs returned {} bugs", bugs.len());
    Ok(bugs)
}

/// `POST /api/bugs`. Returns the stored bug, including its new id.
pub async fn create_bug(client: &TrackerClient, payload: &CreateBugPayload) -> Result<Bug, ApiError> {
    client.send_json(Method::POST, "api/bugs", payload).await
}

/// `PUT /api/bugs/{id}`. Returns the stored bug.
pub async fn update_bug(client: &TrackerClient, payload: &UpdateBugPayload) -> Result<Bug, ApiError> {
    let path = format!("api/bugs/{}", payload.id);
    client.send_json(Method::PUT, &path, payload).await
}
