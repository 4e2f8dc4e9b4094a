use axum::{
    Json,
    extract::{Path, State},
};
use tracing::debug;

use meetscribe_session::SessionEvent;
use meetscribe_transcript::Utterance;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

/// STT/diarization collaborator ingress: one utterance per request, fed
/// straight into the meeting's phase controller. Resulting log mutations are
/// fanned out to watchers before the request completes.
pub async fn ingest_utterance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_name): Path<String>,
    Json(utterance): Json<Utterance>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(
        %meeting_name,
        speaker_id = ?utterance.speaker_id,
        is_final = utterance.is_final,
        "Utterance received"
    );

    let event = state.sessions.handle_utterance(&meeting_name, utterance).await;
    if let Some(event) = &event {
        state.hub.dispatch(event).await;
    }

    let status = match &event {
        Some(SessionEvent::Completed { .. }) => "completed",
        Some(SessionEvent::Delta { .. }) => "applied",
        None => "accepted",
    };
    Ok(Json(serde_json::json!({ "status": status })))
}

/// Finalizes a live session on request, exactly as the spoken stop trigger
/// would: completion push, persistence, session teardown.
pub async fn stop_meeting(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.sessions.stop(&meeting_name).await {
        Some(event) => {
            state.hub.dispatch(&event).await;
            let entries = match &event {
                SessionEvent::Completed { transcripts, .. } => transcripts.len(),
                _ => 0,
            };
            Ok(Json(serde_json::json!({
                "status": "completed",
                "entries": entries,
            })))
        }
        None => Err(ApiError::NotFound(format!(
            "No active session for meeting '{meeting_name}'"
        ))),
    }
}
