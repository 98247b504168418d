use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use futures::{SinkExt, StreamExt};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tip_core::catalog::Catalog;
use tip_core::collect_chronicle;
use tip_core::driver::{Controller, Phase};
use tip_core::error::SimError;
use tip_core::frame::make_frame;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tipd", about = "Tipping-cascade streaming daemon")]
struct Args {
    /// Path to a catalog JSON document (defaults to the builtin catalog).
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Scenario to start as soon as the daemon is up.
    #[arg(long)]
    scenario: Option<String>,

    /// Address to bind (defaults to 127.0.0.1).
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on for WebSocket clients.
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Milliseconds between simulation ticks.
    #[arg(long, default_value_t = 600u64)]
    tick_ms: u64,
}

/// Inbound control commands from the presentation layer.
enum Command {
    SelectScenario {
        id: String,
        reply: oneshot::Sender<Result<(), SimError>>,
    },
    Pause,
    Resume,
    Reset,
}

#[derive(Clone)]
struct AppState {
    tx: broadcast::Sender<String>,
    commands: mpsc::Sender<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(path) => Catalog::load_from_path(path)
            .with_context(|| format!("failed to load catalog from {:?}", path))?,
        None => Catalog::builtin(),
    };

    let mut controller = Controller::new(catalog);
    if let Some(id) = &args.scenario {
        let mut rng = ChaCha8Rng::from_entropy();
        controller
            .select_scenario(id, &mut rng)
            .with_context(|| format!("cannot start with scenario {:?}", id))?;
        info!(scenario = %id, "starting with scenario");
    }

    let (tx, _rx) = broadcast::channel::<String>(128);
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let state = AppState {
        tx: tx.clone(),
        commands: command_tx,
    };

    tokio::spawn(run_sim(controller, command_rx, tx, args.tick_ms));

    let app = Router::new()
        .route("/stream", get(ws_handler))
        .route("/scenario/:id", post(select_scenario))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/reset", post(reset))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;

    info!(%addr, "starting tipd");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}

/// The single task owning the controller. Commands and ticks interleave in
/// one `select!` loop, so there is never more than one in-flight tick and no
/// stale tick can land after a pause or reset takes effect.
async fn run_sim(
    mut controller: Controller,
    mut commands: mpsc::Receiver<Command>,
    tx: broadcast::Sender<String>,
    tick_ms: u64,
) {
    let mut rng = ChaCha8Rng::from_entropy();
    let mut ticker = interval(Duration::from_millis(tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame_seq: u64 = 0;

    publish_frame(&controller, &tx, &mut frame_seq, Vec::new());

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::SelectScenario { id, reply } => {
                        let outcome = controller.select_scenario(&id, &mut rng);
                        match &outcome {
                            Ok(()) => {
                                info!(scenario = %id, "scenario selected");
                                ticker.reset();
                            }
                            Err(err) => info!(%err, "scenario refused"),
                        }
                        let _ = reply.send(outcome);
                    }
                    Command::Pause => {
                        controller.pause();
                        info!("paused");
                    }
                    Command::Resume => {
                        controller.resume();
                        info!("resumed");
                        ticker.reset();
                    }
                    Command::Reset => {
                        controller.reset();
                        info!("reset to idle");
                    }
                }
                publish_frame(&controller, &tx, &mut frame_seq, Vec::new());
            }
            _ = ticker.tick(), if controller.phase() == Phase::Running => {
                match controller.tick(&mut rng) {
                    Ok(Some(diff)) => {
                        let chronicle = collect_chronicle(controller.catalog(), &diff);
                        for line in &chronicle {
                            info!(%line, "tipping event");
                        }
                        if diff.terminal {
                            info!("every element has tipped; run is terminal");
                        }
                        publish_frame(&controller, &tx, &mut frame_seq, chronicle);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        error!(?err, "tick failed");
                        controller.pause();
                    }
                }
            }
        }
    }
}

fn publish_frame(
    controller: &Controller,
    tx: &broadcast::Sender<String>,
    frame_seq: &mut u64,
    chronicle: Vec<String>,
) {
    *frame_seq += 1;
    let frame = make_frame(*frame_seq, controller.run(), controller.catalog(), chronicle);
    match frame.to_ndjson() {
        Ok(line) => {
            if tx.send(line).is_err() {
                tracing::trace!("no subscribers for frame t={}", frame_seq);
            }
        }
        Err(err) => error!(?err, "frame serialization failed"),
    }
}

async fn select_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (reply_tx, reply_rx) = oneshot::channel();
    let command = Command::SelectScenario { id, reply: reply_tx };
    if state.commands.send(command).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match reply_rx.await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(err)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
        }
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn pause(State(state): State<AppState>) -> StatusCode {
    send_command(&state, Command::Pause).await
}

async fn resume(State(state): State<AppState>) -> StatusCode {
    send_command(&state, Command::Resume).await
}

async fn reset(State(state): State<AppState>) -> StatusCode {
    send_command(&state, Command::Reset).await
}

async fn send_command(state: &AppState, command: Command) -> StatusCode {
    if state.commands.send(command).await.is_err() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::ACCEPTED
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move { handle_socket(socket, state.tx.subscribe()).await })
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    let (mut sink, _stream) = socket.split();
    while let Ok(line) = rx.recv().await {
        if sink.send(Message::Text(line)).await.is_err() {
            error!("websocket client disconnected");
            break;
        }
    }
}
