//! The control-plane WebSocket: `/ws`. Pushes `init`, serves
//! `current_state` on request, fans out every store mutation, and enforces
//! a 30s ping/pong keepalive.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use scenariod_protocol::WsEvent;
use std::time::Duration;

use crate::state::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    if send(&mut sink, &WsEvent::Init {
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    })
    .await
    .is_err()
    {
        return;
    }

    let mut events = state.store.subscribe();

    loop {
        tokio::select! {
            inbound = tokio::time::timeout(PING_TIMEOUT, stream.next()) => {
                match inbound {
                    Ok(Some(Ok(Message::Text(text)))) => {
                        if !handle_inbound(&text, &mut sink, &state).await {
                            break;
                        }
                    }
                    Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                    Ok(Some(Ok(_))) => {}
                    Ok(Some(Err(_))) => break,
                    Err(_) => {
                        tracing::debug!("client silent for 30s, closing websocket");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if send(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "websocket client lagged, dropping events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Returns `false` when the connection should close.
async fn handle_inbound(
    text: &str,
    sink: &mut (impl SinkExt<Message> + Unpin),
    state: &AppState,
) -> bool {
    let Ok(event) = serde_json::from_str::<WsEvent>(text) else {
        tracing::debug!("ignoring unparseable websocket message");
        return true;
    };

    match event {
        WsEvent::Ping { timestamp } => send(sink, &WsEvent::Pong { timestamp }).await.is_ok(),
        WsEvent::GetCurrentState => send(
            sink,
            &WsEvent::CurrentState {
                status: state.store.status(),
                rules: state.store.rules.list(),
                config: state.store.config(),
            },
        )
        .await
        .is_ok(),
        _ => true,
    }
}

async fn send(sink: &mut (impl SinkExt<Message> + Unpin), event: &WsEvent) -> Result<(), ()> {
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
