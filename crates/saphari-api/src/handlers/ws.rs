//! WebSocket upgrade and the first-message authentication handshake.
//!
//! Connection lifecycle: `connecting → unauthenticated → authenticated →
//! closed`. The client has a fixed window to send `{"type":"auth",token}`;
//! until then every other message is ignored, except frames over the size
//! cap, which close the connection immediately.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use saphari_realtime::close_code;
use saphari_realtime::message::{ClientMessage, ServerMessage};

use crate::state::AppState;

/// GET /ws — WebSocket upgrade.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Outcome of the pre-authentication phase.
enum AuthOutcome {
    /// A valid auth message was verified.
    Authenticated(Uuid),
    /// An auth message carried an invalid token.
    Failed,
    /// A frame exceeded the size cap.
    Oversized,
    /// The client went away before authenticating.
    Disconnected,
}

/// Drives one WebSocket connection through handshake and fan-out.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let auth_timeout = Duration::from_millis(state.realtime.config().auth_timeout_ms);
    let max_bytes = state.realtime.config().max_message_bytes;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let outcome = tokio::time::timeout(
        auth_timeout,
        await_authentication(&state, &mut ws_rx, max_bytes),
    )
    .await;

    let user_id = match outcome {
        Ok(AuthOutcome::Authenticated(user_id)) => user_id,
        Ok(AuthOutcome::Failed) => {
            debug!("WebSocket authentication failed");
            send_json(&mut ws_tx, &ServerMessage::AuthError).await;
            close_with(&mut ws_tx, close_code::UNAUTHORIZED, "unauthorized").await;
            return;
        }
        Ok(AuthOutcome::Oversized) => {
            close_with(&mut ws_tx, close_code::MESSAGE_TOO_BIG, "message too big").await;
            return;
        }
        Ok(AuthOutcome::Disconnected) => return,
        Err(_) => {
            debug!("WebSocket authentication timed out");
            close_with(&mut ws_tx, close_code::UNAUTHORIZED, "unauthorized").await;
            return;
        }
    };

    let (handle, mut outbound_rx) = state.realtime.register(user_id);
    let conn_id = handle.id;
    let mut shutdown_rx = state.realtime.shutdown_receiver();

    // auth_ok goes down the socket before the loop starts draining the
    // outbound queue, so it precedes any broadcast delivered to the room.
    if !send_json(&mut ws_tx, &ServerMessage::AuthOk { user_id }).await {
        state.realtime.unregister(&conn_id);
        return;
    }

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection established");

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(msg) => {
                    if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if text.len() > max_bytes {
                        close_with(&mut ws_tx, close_code::MESSAGE_TOO_BIG, "message too big")
                            .await;
                        break;
                    }
                    // Clients have nothing else to say after the handshake.
                }
                Some(Ok(Message::Binary(data))) => {
                    if data.len() > max_bytes {
                        close_with(&mut ws_tx, close_code::MESSAGE_TOO_BIG, "message too big")
                            .await;
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = shutdown_rx.recv() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.realtime.unregister(&conn_id);
    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection closed");
}

/// Waits for the first valid auth message.
///
/// Non-auth messages are ignored rather than treated as errors, so older
/// dashboard builds that send an early ping are tolerated.
async fn await_authentication(
    state: &AppState,
    ws_rx: &mut SplitStream<WebSocket>,
    max_bytes: usize,
) -> AuthOutcome {
    while let Some(message) = ws_rx.next().await {
        let message = match message {
            Ok(m) => m,
            Err(_) => return AuthOutcome::Disconnected,
        };

        match message {
            Message::Text(text) => {
                if text.len() > max_bytes {
                    return AuthOutcome::Oversized;
                }
                let Ok(ClientMessage::Auth { token }) =
                    serde_json::from_str::<ClientMessage>(text.as_str())
                else {
                    continue;
                };
                return match state.jwt_verifier.verify_token(&token) {
                    Ok(claims) => AuthOutcome::Authenticated(claims.user_id()),
                    Err(e) => {
                        debug!(error = %e, "WebSocket token rejected");
                        AuthOutcome::Failed
                    }
                };
            }
            Message::Binary(data) => {
                if data.len() > max_bytes {
                    return AuthOutcome::Oversized;
                }
            }
            Message::Close(_) => return AuthOutcome::Disconnected,
            _ => {}
        }
    }

    AuthOutcome::Disconnected
}

/// Serialize and send one message; returns `false` when the socket is gone.
async fn send_json(ws_tx: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    let Ok(json) = serde_json::to_string(message) else {
        return false;
    };
    ws_tx.send(Message::Text(json.into())).await.is_ok()
}

/// Send a close frame with the given code.
async fn close_with(ws_tx: &mut SplitSink<WebSocket, Message>, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
}
