use std::time::Duration;

use futures::SinkExt;
use tokio_tungstenite::{connect_async, tungstenite};

use meetscribe_transcript::{TranscriptEntry, TranscriptView};

use crate::fixtures::test_app::{
    TestApp, expect_silence, next_json, next_of_type, send_json, watch,
};

fn parse_entries(value: &serde_json::Value) -> Vec<TranscriptEntry> {
    serde_json::from_value(value.clone()).expect("malformed transcript entries")
}

async fn start_transcribing(app: &TestApp, meeting: &str) {
    app.ingest(meeting, "spk_0", "Hi I'm John", true).await;
    app.ingest(meeting, "spk_1", "I'm Sarah", true).await;
    app.ingest(meeting, "spk_0", "stop sampling", true).await;
}

#[tokio::test]
async fn late_joiner_bootstraps_from_the_live_log() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;
    app.ingest("m", "spk_0", "already said", true).await;

    let mut ws = app.ws_connect().await;
    watch(&mut ws, "m").await;
    let boot = next_of_type(&mut ws, "initial_transcripts").await;
    assert_eq!(
        parse_entries(&boot["transcripts"]),
        vec![TranscriptEntry::new("John", "already said", true)]
    );
}

#[tokio::test]
async fn watcher_bootstraps_from_the_persisted_log() {
    let app = TestApp::spawn().await;
    let archived = vec![TranscriptEntry::new("Sarah", "from last week", true)];
    app.state.store.save("archived", &archived).await.unwrap();

    let mut ws = app.ws_connect().await;
    watch(&mut ws, "archived").await;
    let boot = next_of_type(&mut ws, "initial_transcripts").await;
    assert_eq!(parse_entries(&boot["transcripts"]), archived);
}

#[tokio::test]
async fn deltas_fan_out_to_every_watcher_in_publish_order() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;

    let mut ws_a = app.ws_connect().await;
    let mut ws_b = app.ws_connect().await;
    watch(&mut ws_a, "m").await;
    watch(&mut ws_b, "m").await;
    next_of_type(&mut ws_a, "initial_transcripts").await;
    next_of_type(&mut ws_b, "initial_transcripts").await;

    app.ingest("m", "spk_0", "alpha", true).await;
    app.ingest("m", "spk_1", "beta", true).await;
    app.ingest("m", "spk_0", "gamma", true).await;

    for ws in [&mut ws_a, &mut ws_b] {
        let mut view = TranscriptView::new();
        let mut incremental_texts = Vec::new();
        // Three deltas, each delivered in both wire forms.
        for _ in 0..6 {
            let msg = next_json(ws).await;
            match msg["type"].as_str().unwrap() {
                "transcript" => {
                    incremental_texts.push(msg["text"].as_str().unwrap().to_string());
                    view.apply(TranscriptEntry::new(
                        msg["speaker"].as_str().unwrap(),
                        msg["text"].as_str().unwrap(),
                        msg["is_final"].as_bool().unwrap(),
                    ));
                }
                "transcript_new" | "transcript_update" => {
                    for entry in parse_entries(&msg["transcripts"]) {
                        view.apply(entry);
                    }
                }
                other => panic!("unexpected message type {other}"),
            }
        }
        assert_eq!(incremental_texts, ["alpha", "beta", "gamma"]);
        // The duplicate delivery is absorbed: three entries, in order.
        let texts: Vec<&str> = view.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["alpha", "beta", "gamma"]);
    }
}

#[tokio::test]
async fn unwatch_is_idempotent_and_stops_deltas() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;

    let mut ws = app.ws_connect().await;
    watch(&mut ws, "m").await;
    next_of_type(&mut ws, "initial_transcripts").await;

    for _ in 0..2 {
        send_json(
            &mut ws,
            serde_json::json!({ "type": "unwatch_transcript", "meeting_name": "m" }),
        )
        .await;
    }

    app.ingest("m", "spk_0", "nobody listens", true).await;
    expect_silence(&mut ws, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn unwatching_one_viewer_does_not_affect_the_others() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;

    let mut ws_a = app.ws_connect().await;
    let mut ws_b = app.ws_connect().await;
    watch(&mut ws_a, "m").await;
    watch(&mut ws_b, "m").await;
    next_of_type(&mut ws_a, "initial_transcripts").await;
    next_of_type(&mut ws_b, "initial_transcripts").await;

    send_json(
        &mut ws_a,
        serde_json::json!({ "type": "unwatch_transcript", "meeting_name": "m" }),
    )
    .await;

    app.ingest("m", "spk_0", "still flowing", true).await;
    let msg = next_of_type(&mut ws_b, "transcript").await;
    assert_eq!(msg["text"], "still flowing");
    assert!(app.state.sessions.has_session("m"));
}

#[tokio::test]
async fn request_transcript_serves_the_finalized_log() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;
    app.ingest("m", "spk_0", "for the record", true).await;
    app.ingest("m", "spk_0", "stop recording", true).await;

    // A fresh connection that missed the completion push polls explicitly.
    let mut ws = app.ws_connect().await;
    send_json(
        &mut ws,
        serde_json::json!({ "type": "request_transcript", "room_name": "m" }),
    )
    .await;
    let complete = next_of_type(&mut ws, "complete_transcript").await;
    assert_eq!(complete["meeting_title"], "m");
    assert_eq!(
        parse_entries(&complete["transcripts"]),
        vec![TranscriptEntry::new("John", "for the record", true)]
    );
}

#[tokio::test]
async fn request_transcript_for_unknown_meeting_is_empty() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect().await;
    send_json(
        &mut ws,
        serde_json::json!({ "type": "request_transcript", "room_name": "never-happened" }),
    )
    .await;
    let complete = next_of_type(&mut ws, "complete_transcript").await;
    assert!(complete["transcripts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reconnect_bootstrap_is_authoritative() {
    let app = TestApp::spawn().await;
    start_transcribing(&app, "m").await;

    let mut ws = app.ws_connect().await;
    watch(&mut ws, "m").await;

    let mut view = TranscriptView::new();
    view.load_snapshot(parse_entries(
        &next_of_type(&mut ws, "initial_transcripts").await["transcripts"],
    ));

    app.ingest("m", "spk_0", "before the drop", true).await;
    next_of_type(&mut ws, "transcript").await;
    ws.close(None).await.unwrap();

    // Missed while disconnected.
    app.ingest("m", "spk_1", "during the drop", true).await;

    let mut ws = app.ws_connect().await;
    watch(&mut ws, "m").await;
    let boot = next_of_type(&mut ws, "initial_transcripts").await;
    view.load_snapshot(parse_entries(&boot["transcripts"]));

    let texts: Vec<&str> = view.entries().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, ["before the drop", "during the drop"]);
}

#[tokio::test]
async fn malformed_control_messages_do_not_tear_the_connection_down() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect().await;

    ws.send(tungstenite::Message::Text("not json".into()))
        .await
        .unwrap();
    ws.send(tungstenite::Message::Text(
        r#"{"type":"launch_missiles"}"#.into(),
    ))
    .await
    .unwrap();

    // Still alive and serving.
    watch(&mut ws, "m").await;
    next_of_type(&mut ws, "initial_transcripts").await;
}

#[tokio::test]
async fn invalid_token_is_rejected_before_upgrade() {
    let app = TestApp::spawn().await;
    let err = connect_async(format!("{}?token=forged", app.ws_url))
        .await
        .expect_err("connection should be rejected");
    match err {
        tungstenite::Error::Http(resp) => assert_eq!(resp.status().as_u16(), 401),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}
