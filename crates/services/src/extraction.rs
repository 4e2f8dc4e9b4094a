use async_trait::async_trait;
use meetscribe_config::ClaudeSettings;
use meetscribe_session::{ExtractionError, NameExtractor, UNKNOWN_NAME};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Name extraction over the Anthropic Messages API.
///
/// Given a window of recent utterance text, asks the model for the speaker's
/// own name or the "unknown" sentinel. Without an API key every call
/// resolves "unknown", which degrades speakers to the unknown label instead
/// of failing the session.
#[derive(Debug, Clone)]
pub struct ClaudeNameExtractor {
    client: Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl ClaudeNameExtractor {
    pub fn new(settings: &ClaudeSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl NameExtractor for ClaudeNameExtractor {
    async fn extract_name(
        &self,
        speaker_id: &str,
        context: &str,
    ) -> Result<String, ExtractionError> {
        let api_key = match self.api_key.as_ref() {
            Some(key) => key,
            None => return Ok(UNKNOWN_NAME.to_string()),
        };

        let prompt = format!(
            "The lines below are recent utterances from a live meeting. The last \
             line was spoken by the participant with diarization id {speaker_id}. \
             If that participant states their own name in the text, reply with \
             exactly that name and nothing else. If no name is stated, reply with \
             exactly \"unknown\".\n\n{context}"
        );

        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractionError::Request(format!(
                "extraction API returned {}",
                response.status()
            )));
        }

        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .content
            .iter()
            .find_map(|block| block.text.as_deref())
            .ok_or_else(|| ExtractionError::InvalidResponse("no text block".to_string()))?;

        let name = text.trim().trim_matches('"').trim();
        if name.is_empty() || name.eq_ignore_ascii_case(UNKNOWN_NAME) {
            return Ok(UNKNOWN_NAME.to_string());
        }

        debug!(%speaker_id, %name, "Speaker name extracted");
        Ok(name.to_string())
    }
}
