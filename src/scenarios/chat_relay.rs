use async_trait::async_trait;
use serde_json::json;
use wsclient::ConnectionClient;

use crate::scenario::{Scenario, ScenarioContext, ScenarioError, expect_field, record};

/// A second participant receives a chat message sent by the first.
///
/// The peer completes a ping round trip before the message is sent, so the
/// server has it registered by the time the relay goes out.
pub struct ChatRelay {
    pub content: String,
    pub user: String,
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self {
            content: "relay check".to_owned(),
            user: "relay_user".to_owned(),
        }
    }
}

impl ChatRelay {
    async fn exchange(&self, ctx: &mut ScenarioContext, peer: &mut ConnectionClient) -> Result<(), ScenarioError> {
        peer.connect(&ctx.config.ws_url).await?;
        let pong = peer.request(&record([("type", json!("ping"))]), ctx.config.receive_timeout).await?;
        expect_field(&pong, "type", &json!("pong"), "peer did not get pong")?;

        let message = record([
            ("type", json!("message")),
            ("content", json!(self.content)),
            ("user", json!(self.user)),
        ]);
        let ack = ctx.client.request(&message, ctx.config.receive_timeout).await?;
        expect_field(&ack, "status", &json!("success"), "message status is not success")?;

        let relayed = peer.receive_default().await?;
        expect_field(&relayed, "type", &json!("message"), "peer got an unexpected record")?;
        expect_field(&relayed, "content", &json!(self.content), "relayed content differs")?;
        expect_field(&relayed, "user", &json!(self.user), "relayed user differs")?;
        let Some(id) = ack.get("id") else {
            return Err(ScenarioError::Assertion("acknowledgement carries no id".to_owned()));
        };
        expect_field(&relayed, "id", id, "relay id does not match acknowledgement")
    }
}

#[async_trait]
impl Scenario for ChatRelay {
    fn subject(&self) -> &str {
        "chat message is relayed to other participants"
    }

    async fn run(&mut self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        let mut peer = ctx.new_client();
        let result = self.exchange(ctx, &mut peer).await;
        peer.close().await;
        result
    }
}
