pub mod auth;
pub mod extraction;
pub mod store;

pub use auth::{AuthError, AuthService, Claims};
pub use extraction::ClaudeNameExtractor;
pub use store::{MemoryTranscriptStore, RedisTranscriptStore};
