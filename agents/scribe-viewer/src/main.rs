use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scribe_viewer::{ConnectionSupervisor, SupervisorConfig, ViewerEvent};

#[derive(Debug, Parser)]
#[command(
    name = "scribe-viewer",
    about = "Watch a meeting's live transcript from the terminal."
)]
struct Args {
    /// WebSocket endpoint of the Meetscribe API.
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Meeting to watch.
    #[arg(long)]
    meeting: String,

    /// Access token; falls back to the MEETSCRIBE_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe_viewer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let token = args
        .token
        .or_else(|| std::env::var("MEETSCRIBE_TOKEN").ok());

    let mut config = SupervisorConfig::new(args.server, args.meeting.clone());
    config.token = token;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (supervisor, disconnect) = ConnectionSupervisor::new(config, events_tx);
    let runner = tokio::spawn(supervisor.run());

    // Ctrl-C requests a clean disconnect; the supervisor will not reconnect.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Disconnect requested");
            disconnect.disconnect();
        }
    });

    while let Some(event) = events_rx.recv().await {
        match event {
            ViewerEvent::State(state) => {
                info!(?state, "Connection state");
            }
            ViewerEvent::Transcript(entries) => {
                if let Some(last) = entries.last() {
                    let marker = if last.is_final { "" } else { " …" };
                    println!("{}: {}{}", last.speaker, last.text, marker);
                }
            }
            ViewerEvent::Complete {
                meeting_title,
                transcripts,
            } => {
                println!("--- {meeting_title}: recording complete ---");
                for entry in &transcripts {
                    println!("{}: {}", entry.speaker, entry.text);
                }
                break;
            }
            ViewerEvent::Fatal(message) => {
                eprintln!("connection ended: {message}");
                break;
            }
        }
    }

    runner.abort();
    Ok(())
}
