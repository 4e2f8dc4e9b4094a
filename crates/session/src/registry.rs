use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use meetscribe_transcript::{LogDelta, TranscriptEntry, Utterance};

use crate::config::SessionConfig;
use crate::extract::{NameExtractor, UNKNOWN_NAME};
use crate::session::{Phase, Session};
use crate::store::TranscriptStore;

/// An observable outcome of feeding one utterance to the phase controller.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A log mutation to fan out to watchers.
    Delta {
        meeting_name: String,
        delta: LogDelta,
    },
    /// The session finalized; carries the full final transcript.
    Completed {
        meeting_name: String,
        transcripts: Vec<TranscriptEntry>,
    },
}

/// Owns one [`Session`] per actively-recording meeting.
///
/// Sessions are created on the first utterance for a meeting name and
/// destroyed on finalize. The per-meeting `Mutex` serializes all mutation of
/// a session's directory and log — there is exactly one logical writer per
/// meeting.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    /// Finalized transcripts not yet (or never) persisted. Retained for the
    /// bounded retry window so `request_transcript` can still serve them.
    pending: DashMap<String, Vec<TranscriptEntry>>,
    extractor: Arc<dyn NameExtractor>,
    store: Arc<dyn TranscriptStore>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(
        extractor: Arc<dyn NameExtractor>,
        store: Arc<dyn TranscriptStore>,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            pending: DashMap::new(),
            extractor,
            store,
            config,
        })
    }

    /// Feeds one STT event into the meeting's session, creating the session
    /// (in SAMPLING) if this is the meeting's first utterance.
    pub async fn handle_utterance(
        self: &Arc<Self>,
        meeting_name: &str,
        utterance: Utterance,
    ) -> Option<SessionEvent> {
        let text = utterance.text.trim().to_string();
        if text.is_empty() {
            return None;
        }

        let session = self
            .sessions
            .entry(meeting_name.to_string())
            .or_insert_with(|| {
                info!(%meeting_name, "Session created, sampling speakers");
                Arc::new(Mutex::new(Session::new(
                    meeting_name,
                    self.config.context_window,
                )))
            })
            .clone();

        let mut session = session.lock().await;
        match session.phase() {
            Phase::Sampling => {
                self.handle_sampling(&mut session, &utterance, &text).await;
                None
            }
            Phase::Transcribing => self.handle_transcribing(&mut session, &utterance, &text),
        }
    }

    async fn handle_sampling(&self, session: &mut Session, utterance: &Utterance, text: &str) {
        // Transitions fire only on final utterances, so a partial ASR result
        // containing the phrase cannot end the phase prematurely.
        if utterance.is_final && self.config.matches_sampling_stop(text) {
            session.begin_transcribing();
            info!(
                meeting = %session.meeting_name(),
                speakers = session.directory().len(),
                "Sampling stopped, transcribing started"
            );
            return;
        }

        if let Some(speaker_id) = utterance.speaker_id.as_deref() {
            if !session.directory().contains(speaker_id) {
                let context = session.extraction_context(text);
                match self.extractor.extract_name(speaker_id, &context).await {
                    Ok(name) if name != UNKNOWN_NAME => {
                        info!(
                            meeting = %session.meeting_name(),
                            %speaker_id,
                            %name,
                            "Speaker resolved"
                        );
                        session.directory_mut().insert(speaker_id, &name);
                    }
                    Ok(_) => {
                        debug!(%speaker_id, "Speaker not resolved yet, will retry");
                    }
                    Err(e) => {
                        warn!(%speaker_id, %e, "Name extraction failed, will retry");
                    }
                }
            }
        }

        if utterance.is_final {
            session.push_context(text);
        }
    }

    fn handle_transcribing(
        self: &Arc<Self>,
        session: &mut Session,
        utterance: &Utterance,
        text: &str,
    ) -> Option<SessionEvent> {
        if utterance.is_final && self.config.matches_recording_stop(text) {
            // The trigger utterance itself never enters the log.
            return Some(self.finalize_locked(session));
        }

        let speaker = session.resolve_speaker(utterance.speaker_id.as_deref());
        let entry = TranscriptEntry::new(speaker, text, utterance.is_final);
        let delta = session.apply_entry(entry);
        Some(SessionEvent::Delta {
            meeting_name: session.meeting_name().to_string(),
            delta,
        })
    }

    /// Finalizes a live session on explicit request (the REST stop
    /// operation), exactly as a spoken recording-stop trigger would.
    pub async fn stop(self: &Arc<Self>, meeting_name: &str) -> Option<SessionEvent> {
        let session = self.sessions.get(meeting_name).map(|s| s.clone())?;
        let mut session = session.lock().await;
        Some(self.finalize_locked(&mut session))
    }

    fn finalize_locked(self: &Arc<Self>, session: &mut Session) -> SessionEvent {
        let meeting_name = session.meeting_name().to_string();
        let transcripts = session.finalize();
        info!(%meeting_name, entries = transcripts.len(), "Recording stopped, session finalized");

        // The session is gone from the registry before the persist write
        // lands; the pending map covers the gap for late requests.
        self.sessions.remove(&meeting_name);
        self.pending.insert(meeting_name.clone(), transcripts.clone());

        let registry = Arc::clone(self);
        let persist_meeting = meeting_name.clone();
        tokio::spawn(async move {
            registry.persist_with_retry(persist_meeting).await;
        });

        SessionEvent::Completed {
            meeting_name,
            transcripts,
        }
    }

    /// Writes a finalized transcript through, retrying on a fixed delay for
    /// a bounded number of attempts. The pending copy is retained for the
    /// whole window and dropped (with an error report) on exhaustion.
    async fn persist_with_retry(self: Arc<Self>, meeting_name: String) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let transcripts = match self.pending.get(&meeting_name) {
                Some(t) => t.clone(),
                None => return,
            };
            match self.store.save(&meeting_name, &transcripts).await {
                Ok(()) => {
                    info!(%meeting_name, entries = transcripts.len(), "Transcript persisted");
                    self.pending.remove(&meeting_name);
                    return;
                }
                Err(e) if attempt <= self.config.persist_retry_attempts => {
                    warn!(%meeting_name, attempt, %e, "Transcript persist failed, retrying");
                    tokio::time::sleep(self.config.persist_retry_delay).await;
                }
                Err(e) => {
                    error!(
                        %meeting_name,
                        attempts = attempt,
                        %e,
                        "Transcript persist failed permanently, dropping retained copy"
                    );
                    self.pending.remove(&meeting_name);
                    return;
                }
            }
        }
    }

    /// Snapshot of a live session's log, if one exists.
    pub async fn snapshot(&self, meeting_name: &str) -> Option<Vec<TranscriptEntry>> {
        let session = self.sessions.get(meeting_name).map(|s| s.clone())?;
        let session = session.lock().await;
        Some(session.log().entries().to_vec())
    }

    /// A finalized transcript still inside the persistence retry window.
    pub fn pending_transcript(&self, meeting_name: &str) -> Option<Vec<TranscriptEntry>> {
        self.pending.get(meeting_name).map(|t| t.clone())
    }

    pub fn has_session(&self, meeting_name: &str) -> bool {
        self.sessions.contains_key(meeting_name)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
