//! Integration tests for the WebSocket handshake and fan-out.

use std::collections::HashSet;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use saphari_core::traits::BroadcastEvent;

use crate::helpers::TestApp;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(3);

async fn connect(app: &TestApp) -> WsStream {
    let (ws, _) = connect_async(app.ws_url()).await.expect("ws connect");
    ws
}

async fn next_message(ws: &mut WsStream) -> Message {
    timeout(READ_TIMEOUT, ws.next())
        .await
        .expect("read timed out")
        .expect("stream ended")
        .expect("ws error")
}

async fn authenticate(ws: &mut WsStream, token: &str) -> Value {
    ws.send(Message::Text(
        json!({"type": "auth", "token": token}).to_string().into(),
    ))
    .await
    .expect("send auth");

    let reply = next_message(ws).await;
    serde_json::from_str(reply.to_text().expect("text reply")).expect("json reply")
}

fn close_code_of(message: Message) -> u16 {
    match message {
        Message::Close(Some(frame)) => frame.code.into(),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_valid_auth_receives_auth_ok() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let mut ws = connect(&app).await;

    let reply = authenticate(&mut ws, &app.token_for(user)).await;

    assert_eq!(reply["type"], "auth_ok");
    assert_eq!(reply["userId"], user.to_string());
    assert_eq!(app.realtime.connection_count(), 1);
}

#[tokio::test]
async fn test_invalid_token_rejected_and_closed() {
    let app = TestApp::spawn(&[]).await;
    let mut ws = connect(&app).await;

    let reply = authenticate(&mut ws, "not-a-valid-token").await;
    assert_eq!(reply["type"], "auth_error");

    let code = close_code_of(next_message(&mut ws).await);
    assert_eq!(code, 4401);
}

#[tokio::test]
async fn test_silent_connection_closed_unauthorized() {
    let app = TestApp::spawn(&[]).await;
    let mut ws = connect(&app).await;

    // Send nothing; the auth timer fires.
    let code = close_code_of(next_message(&mut ws).await);
    assert_eq!(code, 4401);
}

#[tokio::test]
async fn test_junk_before_auth_is_ignored() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let mut ws = connect(&app).await;

    ws.send(Message::Text(json!({"type": "ping"}).to_string().into()))
        .await
        .expect("send junk");
    ws.send(Message::Text("not even json".to_string().into()))
        .await
        .expect("send junk");

    let reply = authenticate(&mut ws, &app.token_for(user)).await;
    assert_eq!(reply["type"], "auth_ok");
}

#[tokio::test]
async fn test_oversized_message_closed_with_distinct_code() {
    let app = TestApp::spawn(&[]).await;
    let mut ws = connect(&app).await;

    let oversized = "x".repeat(8_193);
    ws.send(Message::Text(oversized.into()))
        .await
        .expect("send oversized");

    let code = close_code_of(next_message(&mut ws).await);
    assert_eq!(code, 1009);
}

#[tokio::test]
async fn test_broadcast_reaches_authenticated_connection() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let mut ws = connect(&app).await;
    authenticate(&mut ws, &app.token_for(user)).await;

    let targets: HashSet<Uuid> = [user].into_iter().collect();
    app.realtime
        .broadcast(
            &targets,
            &BroadcastEvent {
                topic: "saphari/pump-1/status/online".to_string(),
                payload: "offline".to_string(),
                ts: 1_234,
            },
        )
        .await;

    let event: Value =
        serde_json::from_str(next_message(&mut ws).await.to_text().unwrap()).unwrap();
    assert_eq!(event["topic"], "saphari/pump-1/status/online");
    assert_eq!(event["payload"], "offline");
    assert_eq!(event["ts"], 1_234);
}

#[tokio::test]
async fn test_multi_tab_user_gets_one_delivery_per_connection() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;

    let mut first = connect(&app).await;
    authenticate(&mut first, &app.token_for(user)).await;
    let mut second = connect(&app).await;
    authenticate(&mut second, &app.token_for(user)).await;

    let targets: HashSet<Uuid> = [user].into_iter().collect();
    let event_a = BroadcastEvent {
        topic: "saphari/pump-1/telemetry".to_string(),
        payload: "a".to_string(),
        ts: 1,
    };
    let event_b = BroadcastEvent {
        topic: "saphari/pump-1/telemetry".to_string(),
        payload: "b".to_string(),
        ts: 2,
    };
    app.realtime.broadcast(&targets, &event_a).await;
    app.realtime.broadcast(&targets, &event_b).await;

    // Each connection sees exactly one copy of each event, in order —
    // no duplicates slotted in between.
    for ws in [&mut first, &mut second] {
        let first_event: Value =
            serde_json::from_str(next_message(ws).await.to_text().unwrap()).unwrap();
        assert_eq!(first_event["payload"], "a");
        let second_event: Value =
            serde_json::from_str(next_message(ws).await.to_text().unwrap()).unwrap();
        assert_eq!(second_event["payload"], "b");
    }
}

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let user = Uuid::new_v4();
    let app = TestApp::spawn(&[user]).await;
    let mut ws = connect(&app).await;
    authenticate(&mut ws, &app.token_for(user)).await;
    assert_eq!(app.realtime.room_count(), 1);

    ws.close(None).await.expect("close");

    // Give the server a moment to observe the close.
    let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
    while app.realtime.connection_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(app.realtime.connection_count(), 0);
    assert_eq!(app.realtime.room_count(), 0, "empty room must be removed");
}
