use futures_util::{SinkExt, StreamExt};
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::*;

fn record(value: Value) -> Record {
    let Value::Object(record) = value else {
        panic!("test record must be a JSON object");
    };
    record
}

fn text_frame(value: Value) -> Frame {
    Frame::Text(value.to_string())
}

// =============================================================================
// DISPATCH
// =============================================================================

#[test]
fn ping_replies_pong() {
    let outcome = dispatch(&record(json!({"type": "ping"}))).expect("ping");
    assert_eq!(outcome, Outcome::Reply(record(json!({"type": "pong"}))));
}

#[test]
fn message_is_acknowledged_and_relayed() {
    let outcome = dispatch(&record(json!({"type": "message", "content": "hello", "user": "u1"}))).expect("message");
    let Outcome::ReplyAndRelay { reply, relay } = outcome else {
        panic!("message should reply and relay");
    };

    assert_eq!(reply["type"], json!("message_received"));
    assert_eq!(reply["status"], json!("success"));
    assert_eq!(relay["type"], json!("message"));
    assert_eq!(relay["content"], json!("hello"));
    assert_eq!(relay["user"], json!("u1"));
    assert_eq!(reply["id"], relay["id"]);
}

#[test]
fn message_without_user_is_anonymous() {
    let outcome = dispatch(&record(json!({"type": "message", "content": "hi"}))).expect("message");
    let Outcome::ReplyAndRelay { relay, .. } = outcome else {
        panic!("message should reply and relay");
    };
    assert_eq!(relay["user"], json!(ANONYMOUS_USER));
}

#[test]
fn message_without_content_is_rejected() {
    let err = dispatch(&record(json!({"type": "message", "user": "u1"}))).expect_err("no content");
    assert_eq!(err, "message content is required");

    let err = dispatch(&record(json!({"type": "message", "content": 5}))).expect_err("non-string content");
    assert_eq!(err, "message content is required");
}

#[test]
fn unknown_and_missing_types_are_rejected() {
    let err = dispatch(&record(json!({"type": "dance"}))).expect_err("unknown");
    assert_eq!(err, "unknown message type: dance");

    let err = dispatch(&record(json!({"content": "x"}))).expect_err("missing");
    assert_eq!(err, "message type is required");
}

#[test]
fn error_record_shape() {
    let err = error_record("boom");
    assert_eq!(err, record(json!({"type": "error", "status": "error", "message": "boom"})));
}

// =============================================================================
// INBOUND PROCESSING
// =============================================================================

#[tokio::test]
async fn process_inbound_relays_message_to_other_clients() {
    let state = AppState::new();
    let sender = Uuid::new_v4();
    let mut rx_sender = state.register(sender).await;
    let mut rx_peer = state.register(Uuid::new_v4()).await;

    let reply = process_inbound(
        &state,
        sender,
        &text_frame(json!({"type": "message", "content": "hello", "user": "u1"})),
    )
    .await;
    assert_eq!(reply["type"], json!("message_received"));

    let relayed = timeout(Duration::from_millis(200), rx_peer.recv())
        .await
        .expect("relay timed out")
        .expect("relay channel closed");
    assert_eq!(relayed["content"], json!("hello"));
    assert!(rx_sender.try_recv().is_err());
}

#[tokio::test]
async fn process_inbound_reports_undecodable_frames() {
    let state = AppState::new();
    let reply = process_inbound(&state, Uuid::new_v4(), &Frame::Text("{broken".to_owned())).await;
    assert_eq!(reply["type"], json!("error"));
    let message = reply["message"].as_str().expect("message");
    assert!(message.starts_with("invalid frame:"), "got {message}");
}

#[tokio::test]
async fn process_inbound_decodes_binary_frames() {
    let state = AppState::new();
    let frame = frames::encode_record(&record(json!({"type": "ping"})), Encoding::Protobuf).expect("encode");
    let reply = process_inbound(&state, Uuid::new_v4(), &frame).await;
    assert_eq!(reply, record(json!({"type": "pong"})));
}

// =============================================================================
// END TO END
// =============================================================================

#[tokio::test]
async fn websocket_ping_round_trip() {
    let addr = crate::spawn("127.0.0.1:0").await.expect("spawn");
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("connect");

    ws.send(WsMessage::Text(r#"{"type":"ping"}"#.into())).await.expect("send");
    let reply = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply timed out")
        .expect("stream ended")
        .expect("read");
    let WsMessage::Text(text) = reply else {
        panic!("json request should get a text reply");
    };
    assert_eq!(frames::decode_text(text.as_str()).expect("decode"), record(json!({"type": "pong"})));

    let _ = ws.close(None).await;
}

#[tokio::test]
async fn websocket_binary_request_gets_binary_reply() {
    let addr = crate::spawn("127.0.0.1:0").await.expect("spawn");
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("connect");

    let Frame::Binary(bytes) = frames::encode_record(&record(json!({"type": "ping"})), Encoding::Protobuf).expect("encode") else {
        panic!("protobuf encodes to binary");
    };
    ws.send(WsMessage::Binary(bytes.into())).await.expect("send");
    let reply = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply timed out")
        .expect("stream ended")
        .expect("read");
    let WsMessage::Binary(bytes) = reply else {
        panic!("binary request should get a binary reply");
    };
    assert_eq!(frames::decode_binary(&bytes).expect("decode"), record(json!({"type": "pong"})));

    let _ = ws.close(None).await;
}
