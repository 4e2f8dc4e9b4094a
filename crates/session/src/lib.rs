pub mod config;
pub mod directory;
pub mod extract;
pub mod registry;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use directory::SpeakerDirectory;
pub use extract::{ExtractionError, NameExtractor, UNKNOWN_NAME};
pub use registry::{SessionEvent, SessionRegistry};
pub use session::{Phase, Session};
pub use store::{StoreError, StoredTranscript, TranscriptStore};
