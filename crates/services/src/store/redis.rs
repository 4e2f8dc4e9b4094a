use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

use meetscribe_session::{StoreError, StoredTranscript, TranscriptStore};
use meetscribe_transcript::TranscriptEntry;

const KEY_PREFIX: &str = "transcript:";

/// Finalized transcripts as JSON values in Redis, one key per meeting.
pub struct RedisTranscriptStore {
    conn: ConnectionManager,
}

impl RedisTranscriptStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        info!(%url, "Connected to Redis transcript store");
        Ok(Self { conn })
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Meeting names become key-safe by keeping alphanumerics, `-` and `_`, and
/// folding spaces to underscores.
fn storage_key(meeting_name: &str) -> String {
    let safe: String = meeting_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    format!("{KEY_PREFIX}{}", safe.trim().replace(' ', "_"))
}

#[async_trait]
impl TranscriptStore for RedisTranscriptStore {
    async fn save(
        &self,
        meeting_name: &str,
        transcripts: &[TranscriptEntry],
    ) -> Result<(), StoreError> {
        let record = StoredTranscript::new(meeting_name, transcripts.to_vec());
        let json = serde_json::to_string(&record)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(storage_key(meeting_name), json)
            .await
            .map_err(backend)?;
        debug!(%meeting_name, entries = record.total_entries, "Transcript saved");
        Ok(())
    }

    async fn load(&self, meeting_name: &str) -> Result<Option<StoredTranscript>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(storage_key(meeting_name))
            .await
            .map_err(backend)?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(format!("{KEY_PREFIX}*"))
            .await
            .map_err(backend)?;

        // Key sanitization is lossy, so read the original name back out of
        // each record.
        let mut names = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<String> = conn.get(&key).await.map_err(backend)?;
            if let Some(json) = value {
                let record: StoredTranscript = serde_json::from_str(&json)?;
                names.push(record.meeting_name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, meeting_name: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(storage_key(meeting_name))
            .await
            .map_err(backend)?;
        Ok(removed > 0)
    }
}
