use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meetscribe_transcript::TranscriptEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The persisted record for one finalized meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTranscript {
    pub meeting_name: String,
    pub transcripts: Vec<TranscriptEntry>,
    pub total_entries: usize,
}

impl StoredTranscript {
    pub fn new(meeting_name: impl Into<String>, transcripts: Vec<TranscriptEntry>) -> Self {
        let total_entries = transcripts.len();
        Self {
            meeting_name: meeting_name.into(),
            transcripts,
            total_entries,
        }
    }
}

/// External collaborator that keeps finalized transcripts, keyed by meeting
/// name. The core does not define the backend's schema.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(
        &self,
        meeting_name: &str,
        transcripts: &[TranscriptEntry],
    ) -> Result<(), StoreError>;

    async fn load(&self, meeting_name: &str) -> Result<Option<StoredTranscript>, StoreError>;

    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Removes a persisted transcript. Returns whether one existed.
    async fn delete(&self, meeting_name: &str) -> Result<bool, StoreError>;
}
