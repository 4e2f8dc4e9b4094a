use std::sync::Arc;
use std::time::Duration;

use meetscribe_config::Settings;
use meetscribe_services::AuthService;
use meetscribe_session::{NameExtractor, SessionConfig, SessionRegistry, TranscriptStore};

use crate::ws::hub::DistributionHub;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionRegistry>,
    pub hub: Arc<DistributionHub>,
    pub store: Arc<dyn TranscriptStore>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        extractor: Arc<dyn NameExtractor>,
        store: Arc<dyn TranscriptStore>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));

        let session_config = SessionConfig {
            sampling_stop_phrases: settings.session.sampling_stop_phrases.clone(),
            recording_stop_phrases: settings.session.recording_stop_phrases.clone(),
            context_window: settings.session.context_window,
            persist_retry_attempts: settings.session.persist_retry_attempts,
            persist_retry_delay: Duration::from_secs(settings.session.persist_retry_delay_secs),
        };
        let sessions = SessionRegistry::new(extractor, store.clone(), session_config);
        let hub = Arc::new(DistributionHub::new(sessions.clone(), store.clone()));

        Self {
            settings,
            auth,
            sessions,
            hub,
            store,
        }
    }
}
