use std::time::Duration;

use frames::Encoding;
use serde_json::json;

use super::*;

struct Noop;

#[async_trait]
impl Scenario for Noop {
    fn subject(&self) -> &str {
        "noop"
    }

    async fn run(&mut self, _ctx: &mut ScenarioContext) -> Result<(), ScenarioError> {
        Ok(())
    }
}

#[test]
fn record_builds_from_pairs() {
    let built = record([("type", json!("ping")), ("n", json!(1))]);
    assert_eq!(built.len(), 2);
    assert_eq!(built["type"], json!("ping"));
    assert_eq!(built["n"], json!(1));
}

#[test]
fn expect_field_passes_on_match() {
    let response = record([("type", json!("pong"))]);
    expect_field(&response, "type", &json!("pong"), "unexpected response type").expect("should match");
}

#[test]
fn expect_field_reports_mismatch() {
    let response = record([("type", json!("error"))]);
    let err = expect_field(&response, "type", &json!("pong"), "unexpected response type").expect_err("mismatch");
    assert_eq!(
        err.to_string(),
        r#"assertion failed: unexpected response type: expected `type` = "pong", got "error""#
    );
}

#[test]
fn expect_field_reports_missing_key() {
    let err = expect_field(&Record::new(), "status", &json!("success"), "bad status").expect_err("missing");
    assert!(matches!(&err, ScenarioError::Assertion(m) if m.ends_with("field missing")));
}

#[test]
fn ensure_maps_false_to_assertion() {
    ensure(true, "unused").expect("true passes");
    let err = ensure(false, "relay never arrived").expect_err("false fails");
    assert!(matches!(err, ScenarioError::Assertion(m) if m == "relay never arrived"));
}

#[test]
fn context_clients_follow_config() {
    let config = SuiteConfig {
        encoding: Encoding::Protobuf,
        receive_timeout: Duration::from_millis(750),
        ..SuiteConfig::default()
    };
    let ctx = ScenarioContext::new(config);
    assert_eq!(ctx.client.encoding(), Encoding::Protobuf);
    assert_eq!(ctx.client.receive_timeout(), Duration::from_millis(750));
    assert!(!ctx.client.is_connected());

    let extra = ctx.new_client();
    assert_eq!(extra.encoding(), Encoding::Protobuf);
    assert_eq!(extra.receive_timeout(), Duration::from_millis(750));
}

#[tokio::test]
async fn default_setup_surfaces_connection_errors() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut ctx = ScenarioContext::new(SuiteConfig {
        ws_url: format!("ws://{addr}/ws"),
        ..SuiteConfig::default()
    });
    let err = Noop.setup(&mut ctx).await.expect_err("nothing listening");
    assert!(matches!(err, ScenarioError::Client(ClientError::Connection { .. })));
    assert!(!ctx.client.is_connected());
}

#[tokio::test]
async fn default_teardown_without_connection_is_harmless() {
    let mut ctx = ScenarioContext::new(SuiteConfig::default());
    Noop.teardown(&mut ctx).await;
    assert!(!ctx.client.is_connected());
}
