use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

use meetscribe_api::{build_router, state::AppState};
use meetscribe_config::{
    AppSettings, ClaudeSettings, JwtSettings, RedisSettings, SessionSettings, Settings,
};
use meetscribe_services::MemoryTranscriptStore;
use meetscribe_session::{ExtractionError, NameExtractor, UNKNOWN_NAME};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Scripted stand-in for the LLM name-extraction collaborator: resolves ids
/// present in the script, "unknown" otherwise.
pub struct ScriptedExtractor {
    names: HashMap<String, String>,
}

impl ScriptedExtractor {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            names: pairs
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl NameExtractor for ScriptedExtractor {
    async fn extract_name(
        &self,
        speaker_id: &str,
        _context: &str,
    ) -> Result<String, ExtractionError> {
        Ok(self
            .names
            .get(speaker_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()))
    }
}

/// A running test server with an in-memory store and scripted extraction.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub ws_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub token: String,
}

impl TestApp {
    /// Spawns a server whose extractor knows spk_0 = John and spk_1 = Sarah.
    pub async fn spawn() -> Self {
        Self::spawn_with_speakers(&[("spk_0", "John"), ("spk_1", "Sarah")]).await
    }

    pub async fn spawn_with_speakers(pairs: &[(&str, &str)]) -> Self {
        let settings = test_settings();
        let extractor = Arc::new(ScriptedExtractor::new(pairs));
        let store = Arc::new(MemoryTranscriptStore::new());
        let state = AppState::new(settings, extractor, store);
        let app = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let token = state
            .auth
            .issue_token("test-viewer")
            .expect("Failed to issue test token");

        Self {
            addr,
            base_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}/ws"),
            state,
            client: reqwest::Client::new(),
            token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn auth_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn auth_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn auth_delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&self.token)
    }

    /// Feeds one utterance through the ingest route, as the STT collaborator
    /// would.
    pub async fn ingest(&self, meeting: &str, speaker_id: &str, text: &str, is_final: bool) {
        let resp = self
            .auth_post(&format!("/api/meeting/{meeting}/utterance"))
            .json(&serde_json::json!({
                "speaker_id": speaker_id,
                "text": text,
                "is_final": is_final,
            }))
            .send()
            .await
            .expect("ingest request failed");
        assert_eq!(resp.status().as_u16(), 200, "ingest rejected");
    }

    pub async fn ws_connect(&self) -> WsClient {
        let (ws, _) = connect_async(format!("{}?token={}", self.ws_url, self.token))
            .await
            .expect("WebSocket connect failed");
        ws
    }
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(tungstenite::Message::Text(value.to_string().into()))
        .await
        .expect("WebSocket send failed");
}

pub async fn watch(ws: &mut WsClient, meeting: &str) {
    send_json(
        ws,
        serde_json::json!({ "type": "watch_transcript", "meeting_name": meeting }),
    )
    .await;
}

/// Next text frame as JSON; panics after two seconds of silence.
pub async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for WebSocket message")
            .expect("WebSocket stream ended")
            .expect("WebSocket error");
        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("non-JSON frame");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected WebSocket frame: {other:?}"),
        }
    }
}

/// Reads frames until one with the given `type` tag arrives.
pub async fn next_of_type(ws: &mut WsClient, kind: &str) -> serde_json::Value {
    loop {
        let value = next_json(ws).await;
        if value["type"] == kind {
            return value;
        }
    }
}

/// Asserts that no text frame arrives within the window.
pub async fn expect_silence(ws: &mut WsClient, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return;
        }
        match tokio::time::timeout(deadline - now, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(tungstenite::Message::Text(text)))) => {
                panic!("expected silence, got: {text}");
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => panic!("WebSocket error: {e}"),
            Ok(None) => panic!("WebSocket stream ended"),
        }
    }
}

fn test_settings() -> Settings {
    Settings {
        app: AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: Vec::new(),
        },
        jwt: JwtSettings {
            secret: "test-secret".to_string(),
            access_token_ttl_secs: 3600,
            issuer: "meetscribe".to_string(),
        },
        redis: RedisSettings {
            url: "redis://127.0.0.1:6379".to_string(),
        },
        claude: ClaudeSettings {
            api_key: None,
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
        },
        session: SessionSettings {
            sampling_stop_phrases: vec!["stop sampling".to_string()],
            recording_stop_phrases: vec![
                "stop recording".to_string(),
                "stop the recording".to_string(),
            ],
            context_window: 5,
            persist_retry_attempts: 5,
            persist_retry_delay_secs: 0,
        },
    }
}
