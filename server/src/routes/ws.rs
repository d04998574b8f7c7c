//! WebSocket handler: chat endpoint exercised by the scenario suite.
//!
//! DESIGN
//! ======
//! On upgrade, registers a client ID and enters a `select!` loop:
//! - Incoming client frames → decode + dispatch by `type`
//! - Relayed records from other clients → forward to client
//!
//! `dispatch` is pure: it validates a record and returns an `Outcome`. The
//! connection loop owns all outbound concerns: reply to sender and relay to
//! peers.
//!
//! PROTOCOL
//! ========
//! - `{"type":"ping"}` → `{"type":"pong"}`
//! - `{"type":"message","content":..,"user":..}` →
//!   `{"type":"message_received","status":"success","id":..}` to the sender,
//!   `{"type":"message","id":..,"content":..,"user":..}` to everyone else
//! - anything else → `{"type":"error","status":"error","message":..}`
//!
//! Replies go out in the encoding of the inbound frame (text JSON or binary
//! protobuf). Relays use the recipient's last-seen encoding.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{Encoding, Frame, Record};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Name recorded for chat messages that carry no `user`.
const ANONYMOUS_USER: &str = "Anonymous";

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of dispatching one inbound record.
#[derive(Debug, PartialEq)]
enum Outcome {
    /// Send a record to the sender only.
    Reply(Record),
    /// Reply to the sender, relay a different record to every other client.
    ReplyAndRelay { reply: Record, relay: Record },
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let mut relay_rx = state.register(client_id).await;
    let mut encoding = Encoding::Json;

    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let frame = match msg {
                    Message::Text(text) => Frame::Text(text.as_str().to_owned()),
                    Message::Binary(bytes) => Frame::Binary(bytes.to_vec()),
                    Message::Close(_) => break,
                    _ => continue,
                };
                encoding = frame.encoding();
                let reply = process_inbound(&state, client_id, &frame).await;
                if send_record(&mut socket, &reply, encoding).await.is_err() {
                    break;
                }
            }
            Some(record) = relay_rx.recv() => {
                if send_record(&mut socket, &record, encoding).await.is_err() {
                    break;
                }
            }
        }
    }

    state.unregister(client_id).await;
    info!(%client_id, "ws: client disconnected");
}

/// Decode one inbound frame, dispatch it, relay if needed, and return the
/// reply for the sender.
async fn process_inbound(state: &AppState, client_id: Uuid, frame: &Frame) -> Record {
    let record = match frames::decode_frame(frame) {
        Ok(record) => record,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return error_record(&format!("invalid frame: {e}"));
        }
    };

    let kind = record.get("type").and_then(Value::as_str).unwrap_or("-");
    info!(%client_id, kind, "ws: recv record");

    match dispatch(&record) {
        Ok(Outcome::Reply(reply)) => reply,
        Ok(Outcome::ReplyAndRelay { reply, relay }) => {
            let delivered = state.relay(&relay, Some(client_id)).await;
            info!(%client_id, delivered, "ws: relayed message");
            reply
        }
        Err(message) => {
            warn!(%client_id, %message, "ws: rejected record");
            error_record(&message)
        }
    }
}

/// Write `record` in `encoding`. A record the encoding cannot carry is
/// logged and dropped; only socket failures are returned.
async fn send_record(socket: &mut WebSocket, record: &Record, encoding: Encoding) -> Result<(), axum::Error> {
    let message = match frames::encode_record(record, encoding) {
        Ok(Frame::Text(text)) => Message::Text(text.into()),
        Ok(Frame::Binary(bytes)) => Message::Binary(bytes.into()),
        Err(e) => {
            warn!(error = %e, %encoding, "ws: dropped unencodable record");
            return Ok(());
        }
    };
    socket.send(message).await
}

// =============================================================================
// DISPATCH
// =============================================================================

fn dispatch(record: &Record) -> Result<Outcome, String> {
    match record.get("type").and_then(Value::as_str) {
        Some("ping") => Ok(Outcome::Reply(typed("pong"))),
        Some("message") => handle_message(record),
        Some(other) => Err(format!("unknown message type: {other}")),
        None => Err("message type is required".to_owned()),
    }
}

fn handle_message(record: &Record) -> Result<Outcome, String> {
    let Some(content) = record.get("content").and_then(Value::as_str) else {
        return Err("message content is required".to_owned());
    };
    let user = record
        .get("user")
        .and_then(Value::as_str)
        .unwrap_or(ANONYMOUS_USER);
    let id = Uuid::new_v4().to_string();

    let mut reply = typed("message_received");
    reply.insert("status".into(), json!("success"));
    reply.insert("id".into(), json!(id));

    let mut relay = typed("message");
    relay.insert("id".into(), json!(id));
    relay.insert("content".into(), json!(content));
    relay.insert("user".into(), json!(user));

    Ok(Outcome::ReplyAndRelay { reply, relay })
}

fn typed(kind: &str) -> Record {
    let mut record = Record::new();
    record.insert("type".into(), json!(kind));
    record
}

fn error_record(message: &str) -> Record {
    let mut record = typed("error");
    record.insert("status".into(), json!("error"));
    record.insert("message".into(), json!(message));
    record
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
