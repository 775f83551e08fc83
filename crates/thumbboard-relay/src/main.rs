//! ThumbBoard WebSocket Relay Server
//!
//! Relays cursor presence between clients viewing the same board room.
//!
//! ## Protocol
//!
//! Messages are JSON text frames:
//! ```json
//! { "type": "join", "room": "room-id", "user": { "name": "Ana", "color": "#3366ff" } }
//! { "type": "cursor", "x": 100.0, "y": 200.0 }
//! { "type": "leave" }
//! ```

mod rooms;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use rooms::{Envelope, Peer, RoomRegistry};
use std::{net::SocketAddr, sync::Arc};
use thumbboard_core::presence::{ServerMessage, decode_client, encode};
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

const ADDR_VAR: &str = "THUMBBOARD_RELAY_ADDR";
const DEFAULT_ADDR: &str = "0.0.0.0:3030";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbboard_relay=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(RoomRegistry::default());

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = listen_addr(std::env::var(ADDR_VAR).ok().as_deref());
    info!("ThumbBoard relay listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

fn listen_addr(configured: Option<&str>) -> SocketAddr {
    let fallback = SocketAddr::from(([0, 0, 0, 0], 3030));
    match configured {
        Some(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid {}={:?} ({}), using {}", ADDR_VAR, value, e, DEFAULT_ADDR);
            fallback
        }),
        None => fallback,
    }
}

async fn index() -> &'static str {
    "ThumbBoard Relay Server - Connect via WebSocket at /ws"
}

async fn health(State(state): State<Arc<RoomRegistry>>) -> String {
    format!("ok ({} rooms)", state.room_count())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RoomRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

type Sender = SplitSink<WebSocket, Message>;

/// Send one message. Returns `false` once the socket is gone.
async fn send(sender: &mut Sender, message: &ServerMessage) -> bool {
    match encode(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to encode {:?}: {}", message, e);
            true
        }
    }
}

async fn next_broadcast(peer: &mut Peer) -> Result<Envelope, RecvError> {
    match peer.receiver_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<RoomRegistry>) {
    let mut peer = Peer::new(Uuid::new_v4().to_string());
    info!("New connection: {}", peer.id());

    let (mut sender, mut receiver) = socket.split();

    'connection: loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let replies = match decode_client(&text) {
                            Ok(message) => peer.handle(&state, message),
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer.id(), e);
                                vec![rooms::error(&e.to_string())]
                            }
                        };
                        for reply in &replies {
                            if !send(&mut sender, reply).await {
                                break 'connection;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let reply = rooms::error("Binary frames are not supported");
                        if !send(&mut sender, &reply).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer.id(), e);
                        break;
                    }
                }
            }

            envelope = next_broadcast(&mut peer) => {
                match envelope {
                    Ok(envelope) => {
                        if let Some(message) = peer.forward(envelope) {
                            if !send(&mut sender, &message).await {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Peer {} lagged in {:?}, skipped {} messages",
                            peer.id(),
                            peer.room(),
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => peer.leave(&state),
                }
            }
        }
    }

    peer.leave(&state);
    info!("Connection closed: {}", peer.id());
}
