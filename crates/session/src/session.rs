use std::collections::VecDeque;

use meetscribe_transcript::{LogDelta, TranscriptEntry, TranscriptLog, UNKNOWN_SPEAKER};

use crate::directory::SpeakerDirectory;

/// The two phases of a recording session.
///
/// SAMPLING builds the speaker directory; TRANSCRIBING produces the log.
/// The transition is one-way, driven by the spoken sampling-stop trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sampling,
    Transcribing,
}

/// One active recording: phase, speaker directory, transcript log, and the
/// rolling context window handed to name extraction.
///
/// Owned by the [`SessionRegistry`](crate::SessionRegistry); all mutation
/// goes through its per-meeting lock, which is the single-writer guarantee.
#[derive(Debug)]
pub struct Session {
    meeting_name: String,
    phase: Phase,
    directory: SpeakerDirectory,
    log: TranscriptLog,
    recent: VecDeque<String>,
    context_window: usize,
}

impl Session {
    pub fn new(meeting_name: impl Into<String>, context_window: usize) -> Self {
        Self {
            meeting_name: meeting_name.into(),
            phase: Phase::Sampling,
            directory: SpeakerDirectory::new(),
            log: TranscriptLog::new(),
            recent: VecDeque::new(),
            context_window,
        }
    }

    pub fn meeting_name(&self) -> &str {
        &self.meeting_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn begin_transcribing(&mut self) {
        self.phase = Phase::Transcribing;
    }

    pub fn directory(&self) -> &SpeakerDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut SpeakerDirectory {
        &mut self.directory
    }

    pub fn log(&self) -> &TranscriptLog {
        &self.log
    }

    /// Resolves a diarization id to its display name, falling back to the
    /// unknown-speaker label. Never retried once TRANSCRIBING has begun.
    pub fn resolve_speaker(&self, speaker_id: Option<&str>) -> String {
        speaker_id
            .and_then(|id| self.directory.get(id))
            .unwrap_or(UNKNOWN_SPEAKER)
            .to_string()
    }

    /// Builds the name-extraction context: the rolling window of recent
    /// final utterances plus the current one.
    pub fn extraction_context(&self, current: &str) -> String {
        let mut lines: Vec<&str> = self.recent.iter().map(String::as_str).collect();
        lines.push(current);
        lines.join("\n")
    }

    /// Records a final utterance's text into the rolling context window.
    pub fn push_context(&mut self, text: &str) {
        self.recent.push_back(text.to_string());
        while self.recent.len() > self.context_window {
            self.recent.pop_front();
        }
    }

    /// Applies one resolved entry at the log tail.
    pub fn apply_entry(&mut self, entry: TranscriptEntry) -> LogDelta {
        self.log.apply(entry)
    }

    /// Marks the log complete and returns the finalized entries.
    pub fn finalize(&mut self) -> Vec<TranscriptEntry> {
        self.log.finalize()
    }
}
