use std::sync::Arc;

use axum::extract::ws::Message;
use futures::SinkExt;
use tracing::{debug, info, warn};

use meetscribe_session::{SessionEvent, SessionRegistry, TranscriptStore};
use meetscribe_transcript::{LogDelta, TranscriptEntry, wire::ServerMessage};

use super::storage::{WatchRegistry, WsSender};

/// Fans transcript log mutations out to watchers and bootstraps late joiners.
///
/// Per delta every watcher receives both wire forms: the untagged
/// incremental `transcript` and the meeting-tagged `transcript_new` /
/// `transcript_update`. That is deliberate at-least-once delivery — the
/// client-side merge rule absorbs the duplication.
pub struct DistributionHub {
    registry: WatchRegistry,
    sessions: Arc<SessionRegistry>,
    store: Arc<dyn TranscriptStore>,
}

impl DistributionHub {
    pub fn new(sessions: Arc<SessionRegistry>, store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            registry: WatchRegistry::new(),
            sessions,
            store,
        }
    }

    /// Registers the connection against the meeting and immediately sends a
    /// bootstrap snapshot: live log, else retained/persisted log, else empty.
    pub async fn watch(&self, meeting_name: &str, connection_id: &str, sender: WsSender) {
        self.registry.watch(meeting_name, connection_id, sender.clone());
        info!(
            %meeting_name,
            %connection_id,
            watchers = self.registry.watcher_count(meeting_name),
            "Watcher registered"
        );

        let transcripts = if let Some(live) = self.sessions.snapshot(meeting_name).await {
            live
        } else if let Some(pending) = self.sessions.pending_transcript(meeting_name) {
            pending
        } else {
            match self.store.load(meeting_name).await {
                Ok(Some(stored)) => stored.transcripts,
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(%meeting_name, %e, "Failed to load persisted transcript for bootstrap");
                    Vec::new()
                }
            }
        };

        let message = ServerMessage::InitialTranscripts { transcripts };
        if send_to(&sender, &message).await.is_err() {
            warn!(%connection_id, "Failed to send bootstrap snapshot");
            self.registry.remove_connection(connection_id);
        }
    }

    /// Removes one registration; idempotent if absent.
    pub fn unwatch(&self, meeting_name: &str, connection_id: &str) {
        self.registry.unwatch(meeting_name, connection_id);
        debug!(%meeting_name, %connection_id, "Watcher removed");
    }

    /// Drops every registration a closed connection held.
    pub fn remove_connection(&self, connection_id: &str) {
        self.registry.remove_connection(connection_id);
    }

    /// Routes one phase-controller event to the watchers it concerns.
    pub async fn dispatch(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Delta {
                meeting_name,
                delta,
            } => self.publish(meeting_name, delta).await,
            SessionEvent::Completed {
                meeting_name,
                transcripts,
            } => self.publish_complete(meeting_name, transcripts).await,
        }
    }

    /// Sends one log mutation to every current watcher of the meeting, in
    /// registration order. Dead connections are evicted.
    pub async fn publish(&self, meeting_name: &str, delta: &LogDelta) {
        let watchers = self.registry.snapshot(meeting_name);
        if watchers.is_empty() {
            return;
        }

        let incremental = ServerMessage::Transcript {
            speaker: delta.entry.speaker.clone(),
            text: delta.entry.text.clone(),
            is_final: delta.entry.is_final,
            meeting_name: meeting_name.to_string(),
        };
        let batch = vec![delta.entry.clone()];
        let tagged = if delta.replaced {
            ServerMessage::TranscriptUpdate {
                meeting_name: meeting_name.to_string(),
                transcripts: batch,
            }
        } else {
            ServerMessage::TranscriptNew {
                meeting_name: meeting_name.to_string(),
                transcripts: batch,
            }
        };

        debug!(
            %meeting_name,
            position = delta.position,
            replaced = delta.replaced,
            watchers = watchers.len(),
            "Publishing transcript delta"
        );

        let mut dead = Vec::new();
        for watcher in &watchers {
            if send_to(&watcher.sender, &incremental).await.is_err()
                || send_to(&watcher.sender, &tagged).await.is_err()
            {
                dead.push(watcher.connection_id.clone());
            }
        }
        for connection_id in dead {
            warn!(%connection_id, "Evicting dead watcher");
            self.registry.remove_connection(&connection_id);
        }
    }

    /// Pushes the finalized transcript to every watcher on session end.
    pub async fn publish_complete(&self, meeting_name: &str, transcripts: &[TranscriptEntry]) {
        let watchers = self.registry.snapshot(meeting_name);
        info!(
            %meeting_name,
            entries = transcripts.len(),
            watchers = watchers.len(),
            "Publishing complete transcript"
        );

        let message = ServerMessage::CompleteTranscript {
            meeting_title: meeting_name.to_string(),
            transcripts: transcripts.to_vec(),
        };

        let mut dead = Vec::new();
        for watcher in &watchers {
            if send_to(&watcher.sender, &message).await.is_err() {
                dead.push(watcher.connection_id.clone());
            }
        }
        for connection_id in dead {
            warn!(%connection_id, "Evicting dead watcher");
            self.registry.remove_connection(&connection_id);
        }
    }

    /// Explicit poll fallback for a connection that may have missed the
    /// completion push (reconnect race): retained finalized copy, else
    /// persisted log, else live snapshot, else empty.
    pub async fn request_final(&self, meeting_name: &str) -> ServerMessage {
        let transcripts = if let Some(pending) = self.sessions.pending_transcript(meeting_name) {
            pending
        } else {
            match self.store.load(meeting_name).await {
                Ok(Some(stored)) => stored.transcripts,
                Ok(None) => self.sessions.snapshot(meeting_name).await.unwrap_or_default(),
                Err(e) => {
                    warn!(%meeting_name, %e, "Failed to load persisted transcript");
                    self.sessions.snapshot(meeting_name).await.unwrap_or_default()
                }
            }
        };

        ServerMessage::CompleteTranscript {
            meeting_title: meeting_name.to_string(),
            transcripts,
        }
    }
}

async fn send_to(sender: &WsSender, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).unwrap_or_default();
    let mut guard = sender.lock().await;
    guard.send(Message::text(text)).await
}
