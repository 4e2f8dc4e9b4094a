use axum::{
    Json,
    extract::{Path, State},
};

use meetscribe_session::StoredTranscript;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meetings = state.store.list().await?;
    Ok(Json(serde_json::json!({
        "total": meetings.len(),
        "meetings": meetings,
    })))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_name): Path<String>,
) -> Result<Json<StoredTranscript>, ApiError> {
    // A finalized transcript still inside the persistence retry window is
    // served from memory rather than reported missing.
    if let Some(pending) = state.sessions.pending_transcript(&meeting_name) {
        return Ok(Json(StoredTranscript::new(meeting_name, pending)));
    }

    match state.store.load(&meeting_name).await? {
        Some(stored) => Ok(Json(stored)),
        None => Err(ApiError::NotFound(format!(
            "No transcript for meeting '{meeting_name}'"
        ))),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.store.delete(&meeting_name).await? {
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(ApiError::NotFound(format!(
            "No transcript for meeting '{meeting_name}'"
        )))
    }
}
