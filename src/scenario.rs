//! Scenario contract and the context handed to each scenario.
//!
//! A scenario never looks up a client on its own. The runner builds a
//! [`ScenarioContext`] holding the suite config and a fresh
//! [`ConnectionClient`], then calls `setup`, `run`, and `teardown` with it.

use async_trait::async_trait;
use frames::Record;
use serde_json::Value;
use wsclient::{ClientError, ConnectionClient};

use crate::config::SuiteConfig;

/// Why a scenario failed.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The client reported an error; it is surfaced unchanged.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The exchange completed but a response did not match expectations.
    #[error("assertion failed: {0}")]
    Assertion(String),
}

/// Everything a scenario may touch while it runs.
pub struct ScenarioContext {
    pub config: SuiteConfig,
    /// Client connected in the default `setup` and closed in the default
    /// `teardown`.
    pub client: ConnectionClient,
}

impl ScenarioContext {
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        let client = client_for(&config);
        Self { config, client }
    }

    /// A second, disconnected client configured like [`ScenarioContext::client`].
    /// The scenario that creates it is responsible for closing it.
    #[must_use]
    pub fn new_client(&self) -> ConnectionClient {
        client_for(&self.config)
    }
}

fn client_for(config: &SuiteConfig) -> ConnectionClient {
    ConnectionClient::new()
        .with_encoding(config.encoding)
        .with_receive_timeout(config.receive_timeout)
}

/// One end-to-end test case against a running server.
#[async_trait]
pub trait Scenario: Send {
    /// Human-readable description shown in reports and matched by filters.
    fn subject(&self) -> &str;

    /// Called before `run`. Connects the context client by default.
    async fn setup(&mut self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        ctx.client.connect(&ctx.config.ws_url).await?;
        Ok(())
    }

    async fn run(&mut self, ctx: &mut ScenarioContext) -> Result<(), ScenarioError>;

    /// Called after `run`, and after a failed `setup`. Closes the context
    /// client by default.
    async fn teardown(&mut self, ctx: &mut ScenarioContext) {
        ctx.client.close().await;
    }
}

/// Build a record from key/value pairs.
#[must_use]
pub fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Fail with `message` unless `record[key] == expected`.
///
/// # Errors
///
/// Returns [`ScenarioError::Assertion`] naming the key, the expected value,
/// and what was actually received.
pub fn expect_field(record: &Record, key: &str, expected: &Value, message: &str) -> Result<(), ScenarioError> {
    match record.get(key) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(ScenarioError::Assertion(format!(
            "{message}: expected `{key}` = {expected}, got {actual}"
        ))),
        None => Err(ScenarioError::Assertion(format!(
            "{message}: expected `{key}` = {expected}, field missing"
        ))),
    }
}

/// Fail with `message` unless `condition` holds.
///
/// # Errors
///
/// Returns [`ScenarioError::Assertion`] carrying `message`.
pub fn ensure(condition: bool, message: &str) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message.to_owned()))
    }
}

#[cfg(test)]
#[path = "scenario_test.rs"]
mod tests;
