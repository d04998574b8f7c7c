//! Scenario suite for a chat WebSocket endpoint.
//!
//! Each scenario acquires a [`wsclient::ConnectionClient`] in `setup`,
//! performs a scripted exchange in `run`, and releases the client in
//! `teardown`. The [`runner::Runner`] calls those three steps directly and
//! collects a [`runner::Report`].

pub mod config;
pub mod health;
pub mod runner;
pub mod scenario;
pub mod scenarios;

pub use config::SuiteConfig;
pub use runner::{Outcome, Report, Runner, ScenarioReport};
pub use scenario::{Scenario, ScenarioContext, ScenarioError};
