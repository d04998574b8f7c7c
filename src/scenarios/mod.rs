//! Built-in scenarios for the chat endpoint.

mod chat_messages;
mod chat_relay;
mod websocket_connection;

pub use chat_messages::ChatMessages;
pub use chat_relay::ChatRelay;
pub use websocket_connection::WebSocketConnection;

use crate::scenario::Scenario;

/// Every built-in scenario, in run order.
#[must_use]
pub fn builtin() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(WebSocketConnection),
        Box::new(ChatMessages::default()),
        Box::new(ChatRelay::default()),
    ]
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
