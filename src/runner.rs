//! Sequential scenario runner.
//!
//! For each scenario: build a fresh context, call `setup`, call `run` only if
//! setup succeeded, and always call `teardown`. The first error from setup
//! or run becomes the scenario's failure cause; nothing is retried.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::scenario::{Scenario, ScenarioContext, ScenarioError};

/// Result of one scenario.
#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(ScenarioError),
    /// Excluded by the subject filter; no hooks were called.
    Skipped,
}

impl Outcome {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed(_) => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub subject: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Per-scenario results in execution order.
#[derive(Debug, Default)]
pub struct Report {
    pub scenarios: Vec<ScenarioReport>,
    pub elapsed: Duration,
}

impl Report {
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    /// True when no scenario failed. Skipped scenarios do not count against
    /// success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ScenarioError)> {
        self.scenarios.iter().filter_map(|s| match &s.outcome {
            Outcome::Failed(err) => Some((s.subject.as_str(), err)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.scenarios.iter().filter(|s| pred(&s.outcome)).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.scenarios {
            write!(f, "{} {}", s.outcome.label(), s.subject)?;
            match &s.outcome {
                Outcome::Failed(err) => writeln!(f, " ({:.2?}): {err}", s.elapsed)?,
                Outcome::Passed => writeln!(f, " ({:.2?})", s.elapsed)?,
                Outcome::Skipped => writeln!(f)?,
            }
        }
        write!(
            f,
            "{} scenarios: {} passed, {} failed, {} skipped ({:.2?})",
            self.total(),
            self.passed(),
            self.failed(),
            self.skipped(),
            self.elapsed
        )
    }
}

/// Runs scenarios one after another against `config`.
pub struct Runner {
    config: SuiteConfig,
}

impl Runner {
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, scenarios: Vec<Box<dyn Scenario>>) -> Report {
        let started = Instant::now();
        let mut report = Report::default();

        for mut scenario in scenarios {
            let result = if self.config.selects(scenario.subject()) {
                self.run_one(scenario.as_mut()).await
            } else {
                info!(subject = scenario.subject(), "scenario skipped");
                ScenarioReport {
                    subject: scenario.subject().to_owned(),
                    outcome: Outcome::Skipped,
                    elapsed: Duration::ZERO,
                }
            };
            report.scenarios.push(result);
        }

        report.elapsed = started.elapsed();
        info!(
            total = report.total(),
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "suite finished"
        );
        report
    }

    /// Run one scenario through setup, run, and teardown, ignoring the filter.
    pub async fn run_one(&self, scenario: &mut dyn Scenario) -> ScenarioReport {
        let subject = scenario.subject().to_owned();
        let mut ctx = ScenarioContext::new(self.config.clone());
        let started = Instant::now();

        let result = match scenario.setup(&mut ctx).await {
            Ok(()) => scenario.run(&mut ctx).await,
            Err(e) => Err(e),
        };
        scenario.teardown(&mut ctx).await;

        let elapsed = started.elapsed();
        let outcome = match result {
            Ok(()) => {
                info!(%subject, ?elapsed, "scenario passed");
                Outcome::Passed
            }
            Err(e) => {
                warn!(%subject, ?elapsed, error = %e, "scenario failed");
                Outcome::Failed(e)
            }
        };

        ScenarioReport {
            subject,
            outcome,
            elapsed,
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
