use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures::stream::SplitSink;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// One registered watcher of a meeting's delta stream.
#[derive(Clone)]
pub struct Watcher {
    pub connection_id: String,
    pub sender: WsSender,
}

/// Tracks which WebSocket connections watch which meeting.
///
/// One meeting can have many watchers. A connection watches one meeting at a
/// time in the observed protocol; the client unwatches its previous meeting
/// itself, so the registry keeps whatever registrations it is told about.
pub struct WatchRegistry {
    watchers: DashMap<String, Vec<Watcher>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self {
            watchers: DashMap::new(),
        }
    }

    /// Registers a watcher. Re-watching an already-watched meeting is a no-op.
    pub fn watch(&self, meeting_name: &str, connection_id: &str, sender: WsSender) {
        let mut watchers = self.watchers.entry(meeting_name.to_string()).or_default();
        if watchers.iter().any(|w| w.connection_id == connection_id) {
            return;
        }
        watchers.push(Watcher {
            connection_id: connection_id.to_string(),
            sender,
        });
    }

    /// Removes one registration; idempotent if absent.
    pub fn unwatch(&self, meeting_name: &str, connection_id: &str) {
        if let Some(mut watchers) = self.watchers.get_mut(meeting_name) {
            watchers.retain(|w| w.connection_id != connection_id);
            if watchers.is_empty() {
                drop(watchers);
                self.watchers.remove(meeting_name);
            }
        }
    }

    /// Removes a connection from every meeting it watches.
    pub fn remove_connection(&self, connection_id: &str) {
        let meetings: Vec<String> = self.watchers.iter().map(|e| e.key().clone()).collect();
        for meeting in meetings {
            self.unwatch(&meeting, connection_id);
        }
    }

    /// Snapshot of the current watcher set, taken before any fan-out so that
    /// watch/unwatch is never observed mid-iteration.
    pub fn snapshot(&self, meeting_name: &str) -> Vec<Watcher> {
        self.watchers
            .get(meeting_name)
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn watcher_count(&self, meeting_name: &str) -> usize {
        self.watchers.get(meeting_name).map(|w| w.len()).unwrap_or(0)
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
