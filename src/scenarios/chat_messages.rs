use async_trait::async_trait;
use serde_json::{Value, json};

use crate::scenario::{Scenario, ScenarioContext, ScenarioError, ensure, expect_field, record};

/// Send a chat message and expect a successful acknowledgement.
pub struct ChatMessages {
    pub content: String,
    pub user: String,
}

impl Default for ChatMessages {
    fn default() -> Self {
        Self {
            content: "test message".to_owned(),
            user: "test_user".to_owned(),
        }
    }
}

#[async_trait]
impl Scenario for ChatMessages {
    fn subject(&self) -> &str {
        "chat message is acknowledged"
    }

    async fn run(&mut self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        let message = record([
            ("type", json!("message")),
            ("content", json!(self.content)),
            ("user", json!(self.user)),
        ]);
        ctx.client.send(&message).await?;

        let response = ctx.client.receive_default().await?;

        expect_field(&response, "type", &json!("message_received"), "message was not received")?;
        expect_field(&response, "status", &json!("success"), "message status is not success")?;
        ensure(
            response
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.is_empty()),
            "acknowledgement carries no message id",
        )
    }
}
