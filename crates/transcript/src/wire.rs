use serde::{Deserialize, Serialize};

use crate::TranscriptEntry;

/// Messages pushed from the distribution hub to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One incremental utterance for the connection's current meeting context.
    Transcript {
        speaker: String,
        text: String,
        is_final: bool,
        meeting_name: String,
    },
    /// Bootstrap snapshot sent when a watch is registered.
    InitialTranscripts { transcripts: Vec<TranscriptEntry> },
    /// The finalized transcript, pushed on session end and in reply to
    /// `request_transcript`.
    CompleteTranscript {
        meeting_title: String,
        transcripts: Vec<TranscriptEntry>,
    },
    /// Entries appended to the named meeting's log.
    TranscriptNew {
        meeting_name: String,
        transcripts: Vec<TranscriptEntry>,
    },
    /// Tail entries revised in place in the named meeting's log.
    TranscriptUpdate {
        meeting_name: String,
        transcripts: Vec<TranscriptEntry>,
    },
    Error { message: String },
}

/// Control messages accepted from viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    RequestTranscript { room_name: String },
    WatchTranscript { meeting_name: String },
    UnwatchTranscript { meeting_name: String },
}
