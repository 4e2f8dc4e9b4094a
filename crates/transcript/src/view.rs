use crate::TranscriptEntry;
use crate::merge::{MergeOutcome, merge_into_tail};

/// Client-side reconciliation buffer for one watched meeting.
///
/// Applies the same tail-merge rule as the producing log, so an
/// unordered-arrival-tolerant delta stream — duplicate deliveries included —
/// converges on the same transcript. A separate raw feed records every event
/// unmerged; it exists for diagnostic display only and carries no
/// correctness obligation.
#[derive(Debug, Default, Clone)]
pub struct TranscriptView {
    entries: Vec<TranscriptEntry>,
    raw_feed: Vec<TranscriptEntry>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the buffer wholesale with a bootstrap snapshot.
    ///
    /// Anything buffered before the snapshot is discarded — after a
    /// reconnect the hub's snapshot is authoritative.
    pub fn load_snapshot(&mut self, entries: Vec<TranscriptEntry>) {
        self.entries = entries;
        self.raw_feed.clear();
    }

    /// Merges one incremental entry into the buffer.
    pub fn apply(&mut self, entry: TranscriptEntry) -> MergeOutcome {
        self.raw_feed.push(entry.clone());
        merge_into_tail(&mut self.entries, entry)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn raw_feed(&self) -> &[TranscriptEntry] {
        &self.raw_feed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
