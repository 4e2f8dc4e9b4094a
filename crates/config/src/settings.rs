use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub jwt: JwtSettings,
    pub redis: RedisSettings,
    pub claude: ClaudeSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClaudeSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// Phrases that end the SAMPLING phase (case-insensitive substring match).
    pub sampling_stop_phrases: Vec<String>,
    /// Phrases that end the TRANSCRIBING phase and finalize the transcript.
    pub recording_stop_phrases: Vec<String>,
    /// How many recent final utterances feed the name-extraction context.
    pub context_window: usize,
    pub persist_retry_attempts: u32,
    pub persist_retry_delay_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("MEETSCRIBE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "meetscribe")?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("claude.model", "claude-sonnet-4-5-20250929")?
            .set_default("claude.max_tokens", 1024)?
            .set_default(
                "session.sampling_stop_phrases",
                vec!["stop sampling".to_string()],
            )?
            .set_default(
                "session.recording_stop_phrases",
                vec!["stop recording".to_string(), "stop the recording".to_string()],
            )?
            .set_default("session.context_window", 5)?
            .set_default("session.persist_retry_attempts", 5)?
            .set_default("session.persist_retry_delay_secs", 3)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
