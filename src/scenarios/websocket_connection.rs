use async_trait::async_trait;
use serde_json::json;

use crate::scenario::{Scenario, ScenarioContext, ScenarioError, expect_field, record};

/// Connect, send `ping`, expect `pong`.
pub struct WebSocketConnection;

#[async_trait]
impl Scenario for WebSocketConnection {
    fn subject(&self) -> &str {
        "websocket connection answers ping with pong"
    }

    async fn run(&mut self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        ctx.client.send(&record([("type", json!("ping"))])).await?;

        let response = ctx.client.receive_default().await?;

        expect_field(&response, "type", &json!("pong"), "unexpected response type")
    }
}
