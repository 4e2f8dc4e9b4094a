use std::time::Duration;

use meetscribe_transcript::TranscriptEntry;

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn ingest_requires_a_token() {
    let app = TestApp::spawn().await;
    let resp = app
        .client
        .post(app.url("/api/meeting/m/utterance"))
        .json(&serde_json::json!({
            "speaker_id": "spk_0",
            "text": "hello",
            "is_final": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn transcript_archive_list_get_delete() {
    let app = TestApp::spawn().await;
    app.state
        .store
        .save("retro", &[TranscriptEntry::new("John", "went well", true)])
        .await
        .unwrap();
    app.state
        .store
        .save("planning", &[TranscriptEntry::new("Sarah", "next sprint", true)])
        .await
        .unwrap();

    let resp = app.auth_get("/api/transcript").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["meetings"], serde_json::json!(["planning", "retro"]));

    let resp = app.auth_get("/api/transcript/retro").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["meeting_name"], "retro");
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["transcripts"][0]["speaker"], "John");

    let resp = app
        .auth_delete("/api/transcript/retro")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.auth_get("/api/transcript/retro").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let resp = app
        .auth_delete("/api/transcript/retro")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn manual_stop_finalizes_like_the_spoken_trigger() {
    let app = TestApp::spawn().await;
    app.ingest("m", "spk_0", "Hi I'm John", true).await;
    app.ingest("m", "spk_0", "stop sampling", true).await;
    app.ingest("m", "spk_0", "wrap it up", true).await;

    let resp = app.auth_post("/api/meeting/m/stop").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["entries"], 1);

    // The session is gone; stopping again is a 404.
    let resp = app.auth_post("/api/meeting/m/stop").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // The archive serves the finalized transcript (pending copies included,
    // so no need to wait for the background persist).
    let resp = app.auth_get("/api/transcript/m").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["transcripts"][0]["text"], "wrap it up");

    // And the background write lands.
    let mut persisted = false;
    for _ in 0..40 {
        if app.state.store.load("m").await.unwrap().is_some() {
            persisted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(persisted);
}

#[tokio::test]
async fn stopping_a_meeting_that_never_started_is_a_404() {
    let app = TestApp::spawn().await;
    let resp = app
        .auth_post("/api/meeting/ghost/stop")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
