pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Meeting routes: the STT collaborator's ingress plus manual stop
    let meeting_routes = Router::new()
        .route(
            "/{meeting_name}/utterance",
            post(routes::ingest::ingest_utterance),
        )
        .route("/{meeting_name}/stop", post(routes::ingest::stop_meeting));

    // Transcript archive routes
    let transcript_routes = Router::new()
        .route("/", get(routes::transcript::list))
        .route("/{meeting_name}", get(routes::transcript::get))
        .route("/{meeting_name}", delete(routes::transcript::remove));

    // Compose API
    let api = Router::new()
        .nest("/meeting", meeting_routes)
        .nest("/transcript", transcript_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": state.sessions.active_sessions(),
    }))
}
