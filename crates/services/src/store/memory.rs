use async_trait::async_trait;
use dashmap::DashMap;

use meetscribe_session::{StoreError, StoredTranscript, TranscriptStore};
use meetscribe_transcript::TranscriptEntry;

/// In-process transcript store. Backs the integration tests and runs where
/// no Redis is configured; contents do not survive a restart.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    records: DashMap<String, StoredTranscript>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn save(
        &self,
        meeting_name: &str,
        transcripts: &[TranscriptEntry],
    ) -> Result<(), StoreError> {
        self.records.insert(
            meeting_name.to_string(),
            StoredTranscript::new(meeting_name, transcripts.to_vec()),
        );
        Ok(())
    }

    async fn load(&self, meeting_name: &str) -> Result<Option<StoredTranscript>, StoreError> {
        Ok(self.records.get(meeting_name).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.records.iter().map(|r| r.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, meeting_name: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(meeting_name).is_some())
    }
}
