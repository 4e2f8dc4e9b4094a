use async_trait::async_trait;
use thiserror::Error;

/// Sentinel returned by extractors when no name could be determined from the
/// available context. Sentinel results are discarded, never stored.
pub const UNKNOWN_NAME: &str = "unknown";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction backend unavailable: {0}")]
    Unavailable(String),
    #[error("extraction request failed: {0}")]
    Request(String),
    #[error("malformed extraction response: {0}")]
    InvalidResponse(String),
}

/// External collaborator that maps recent utterance context to a speaker's
/// display name.
///
/// Any non-[`UNKNOWN_NAME`] result is treated as authoritative and final for
/// that speaker id within the session. Errors are equivalent to "unknown":
/// non-fatal, and the id is retried on its next utterance.
#[async_trait]
pub trait NameExtractor: Send + Sync {
    async fn extract_name(
        &self,
        speaker_id: &str,
        context: &str,
    ) -> Result<String, ExtractionError>;
}
