use std::time::Duration;

use tokio::sync::mpsc;

use meetscribe_transcript::TranscriptEntry;
use scribe_viewer::{ConnectionState, ConnectionSupervisor, SupervisorConfig, ViewerEvent};

use crate::fixtures::test_app::TestApp;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ViewerEvent>) -> ViewerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for viewer event")
        .expect("viewer event channel closed")
}

#[tokio::test]
async fn viewer_agent_reconciles_a_live_meeting() {
    let app = TestApp::spawn().await;
    app.ingest("m", "spk_0", "Hi I'm John", true).await;
    app.ingest("m", "spk_0", "stop sampling", true).await;

    let mut config = SupervisorConfig::new(app.ws_url.clone(), "m");
    config.token = Some(app.token.clone());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (supervisor, _disconnect) = ConnectionSupervisor::new(config, events_tx);
    let runner = tokio::spawn(supervisor.run());

    // Wait for the bootstrap snapshot before producing anything.
    loop {
        if let ViewerEvent::Transcript(_) = next_event(&mut events_rx).await {
            break;
        }
    }

    app.ingest("m", "spk_0", "for posterity", true).await;
    app.ingest("m", "spk_0", "stop recording", true).await;

    let transcripts = loop {
        match next_event(&mut events_rx).await {
            ViewerEvent::Complete {
                meeting_title,
                transcripts,
            } => {
                assert_eq!(meeting_title, "m");
                break transcripts;
            }
            ViewerEvent::Fatal(msg) => panic!("viewer gave up: {msg}"),
            _ => {}
        }
    };
    assert_eq!(
        transcripts,
        vec![TranscriptEntry::new("John", "for posterity", true)]
    );

    runner.abort();
}

#[tokio::test]
async fn viewer_agent_never_retries_after_auth_rejection() {
    let app = TestApp::spawn().await;

    let mut config = SupervisorConfig::new(app.ws_url.clone(), "m");
    config.token = Some("forged".to_string());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (supervisor, _disconnect) = ConnectionSupervisor::new(config, events_tx);
    let runner = tokio::spawn(supervisor.run());

    let mut connect_attempts = 0;
    loop {
        match next_event(&mut events_rx).await {
            ViewerEvent::State(ConnectionState::Connecting) => connect_attempts += 1,
            ViewerEvent::Fatal(msg) => {
                assert!(msg.contains("authentication"), "unexpected: {msg}");
                break;
            }
            _ => {}
        }
    }
    // Exactly one handshake: the rejection is fatal, never retried.
    assert_eq!(connect_attempts, 1);

    runner.abort();
}
