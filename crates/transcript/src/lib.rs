pub mod log;
pub mod merge;
pub mod view;
pub mod wire;

pub use log::{LogDelta, TranscriptLog};
pub use merge::{MergeOutcome, merge_into_tail};
pub use view::TranscriptView;

use serde::{Deserialize, Serialize};

/// Label used for speakers whose diarization id was never resolved to a name.
pub const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

/// One STT event as delivered by the diarization collaborator.
///
/// `speaker_id` is assigned by diarization and is stable only within one
/// recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker_id: Option<String>,
    pub text: String,
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_hint: Option<u64>,
}

/// One reconciled transcript entry. The entry's position is the index in its
/// owning log; it travels in deltas, not in the entry itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: String,
    pub text: String,
    pub is_final: bool,
}

impl TranscriptEntry {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, is_final: bool) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            is_final,
        }
    }
}
