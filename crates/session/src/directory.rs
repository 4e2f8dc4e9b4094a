use std::collections::HashMap;

/// Session-scoped map from diarization speaker id to resolved display name.
///
/// Entries are insert-once: the first resolved name for an id wins for the
/// rest of the session. Unresolved ids are simply absent — the "unknown"
/// sentinel is never stored, which keeps an id eligible for retry on its
/// next utterance during SAMPLING.
#[derive(Debug, Default, Clone)]
pub struct SpeakerDirectory {
    names: HashMap<String, String>,
}

impl SpeakerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, speaker_id: &str) -> bool {
        self.names.contains_key(speaker_id)
    }

    /// Inserts a resolved name unless the id already has one.
    /// Returns whether the entry was inserted.
    pub fn insert(&mut self, speaker_id: &str, name: &str) -> bool {
        if self.names.contains_key(speaker_id) {
            return false;
        }
        self.names.insert(speaker_id.to_string(), name.to_string());
        true
    }

    pub fn get(&self, speaker_id: &str) -> Option<&str> {
        self.names.get(speaker_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
