use std::time::Duration;

/// Runtime knobs for the phase controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Phrases ending the SAMPLING phase (case-insensitive substring match).
    pub sampling_stop_phrases: Vec<String>,
    /// Phrases ending the TRANSCRIBING phase and finalizing the transcript.
    pub recording_stop_phrases: Vec<String>,
    /// How many recent final utterances feed the name-extraction context.
    pub context_window: usize,
    /// Retry budget for a failed persistence write on finalize.
    pub persist_retry_attempts: u32,
    pub persist_retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sampling_stop_phrases: vec!["stop sampling".to_string()],
            recording_stop_phrases: vec![
                "stop recording".to_string(),
                "stop the recording".to_string(),
            ],
            context_window: 5,
            persist_retry_attempts: 5,
            persist_retry_delay: Duration::from_secs(3),
        }
    }
}

impl SessionConfig {
    pub fn matches_sampling_stop(&self, text: &str) -> bool {
        contains_phrase(text, &self.sampling_stop_phrases)
    }

    pub fn matches_recording_stop(&self, text: &str) -> bool {
        contains_phrase(text, &self.recording_stop_phrases)
    }
}

fn contains_phrase(text: &str, phrases: &[String]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(&p.to_lowercase()))
}
