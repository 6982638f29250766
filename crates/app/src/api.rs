use std::sync::Arc;

use audio::{AudioMix, MixUpdate};
use axum::{
    Json, Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use snowfield_core::world::WorldSnapshot;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::ports::Caption;
use crate::runtime::ControlEvent;

#[derive(Clone)]
pub struct AppState {
    pub control_tx: mpsc::Sender<ControlEvent>,
    pub state_rx: watch::Receiver<WorldSnapshot>,
    pub caption_tx: broadcast::Sender<Caption>,
    pub audio: Arc<AudioMix>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRequest {
    Zoom { held: bool },
    Aim { bearing_deg: f64 },
    Replay,
    Mute { muted: bool },
    ToggleMute,
    Mix {
        wind: Option<f32>,
        env: Option<f32>,
        ui: Option<f32>,
    },
}

pub fn create_router(
    control_tx: mpsc::Sender<ControlEvent>,
    state_rx: watch::Receiver<WorldSnapshot>,
    caption_tx: broadcast::Sender<Caption>,
    audio: Arc<AudioMix>,
) -> Router {
    let state = AppState {
        control_tx,
        state_rx,
        caption_tx,
        audio,
    };
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/event", post(event))
        .route("/ws", get(ws_upgrade))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "ok"
}

#[axum::debug_handler]
async fn get_state(State(app_state): State<AppState>) -> impl IntoResponse {
    let snapshot = app_state.state_rx.borrow().clone();
    Json(snapshot)
}

async fn event(
    State(app_state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> impl IntoResponse {
    // Audio preferences are handled here directly; the rest goes to the
    // world task.
    let control = match req {
        EventRequest::Zoom { held } => ControlEvent::Zoom { held },
        EventRequest::Aim { bearing_deg } => ControlEvent::Aim { bearing_deg },
        EventRequest::Replay => ControlEvent::Replay,
        EventRequest::Mute { muted } => {
            app_state.audio.set_muted(muted);
            return (StatusCode::OK, "Mute updated").into_response();
        }
        EventRequest::ToggleMute => {
            let muted = app_state.audio.toggle_mute();
            return (StatusCode::OK, Json(serde_json::json!({ "muted": muted }))).into_response();
        }
        EventRequest::Mix { wind, env, ui } => {
            app_state.audio.set_mix(MixUpdate { wind, env, ui });
            return (StatusCode::OK, "Mix updated").into_response();
        }
    };

    match app_state.control_tx.send(control).await {
        Ok(_) => (StatusCode::OK, "Event sent").into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send event: channel closed",
        )
            .into_response(),
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsMessage {
    Snapshot(WorldSnapshot),
    Caption(Caption),
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_updates(socket, app_state))
}

/// Pushes every snapshot and caption to the connected renderer.
async fn stream_updates(socket: WebSocket, app_state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = WatchStream::new(app_state.state_rx.clone());
    let mut captions = app_state.caption_tx.subscribe();

    loop {
        tokio::select! {
            snapshot = snapshots.next() => {
                let Some(snapshot) = snapshot else { break };
                if send_json(&mut sender, &WsMessage::Snapshot(snapshot)).await.is_err() {
                    break;
                }
            }
            caption = captions.recv() => {
                match caption {
                    Ok(caption) => {
                        if send_json(&mut sender, &WsMessage::Caption(caption)).await.is_err() {
                            break;
                        }
                    }
                    // Lagged receivers just miss old captions.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }
    debug!("WebSocket client disconnected");
}

async fn send_json(
    sender: &mut (impl futures_util::Sink<Message, Error = axum::Error> + Unpin),
    message: &WsMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}
