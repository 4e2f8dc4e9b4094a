use crate::TranscriptEntry;
use crate::merge::{MergeOutcome, merge_into_tail};

/// A single mutation applied to a [`TranscriptLog`], ready for fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDelta {
    /// Index of the affected entry in the log.
    pub position: usize,
    /// True when the tail entry was revised in place rather than appended.
    pub replaced: bool,
    pub entry: TranscriptEntry,
}

/// The authoritative per-meeting transcript record on the producing side.
///
/// Entries are append-only by position. Only the tail may be revised, and
/// only while it is interim or through a final-text extension of the same
/// turn — an entry is frozen the moment a newer tail supersedes it.
#[derive(Debug, Default, Clone)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
    complete: bool,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one entry at the tail, replacing or appending per the merge
    /// rule, and returns the resulting delta.
    pub fn apply(&mut self, entry: TranscriptEntry) -> LogDelta {
        debug_assert!(!self.complete, "apply on a finalized log");
        let outcome = merge_into_tail(&mut self.entries, entry);
        let position = self.entries.len() - 1;
        LogDelta {
            position,
            replaced: outcome == MergeOutcome::ReplacedTail,
            entry: self.entries[position].clone(),
        }
    }

    /// Marks the log complete and returns the finalized entries.
    ///
    /// Interim leftovers are dropped: a turn that never saw its final (the
    /// stop trigger's own partial results included) does not enter the
    /// persisted record.
    pub fn finalize(&mut self) -> Vec<TranscriptEntry> {
        self.complete = true;
        self.entries.retain(|e| e.is_final);
        self.entries.clone()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
