use std::time::Duration;

use clap::{Parser, Subcommand};
use frames::Encoding;
use wsprobe::config::{DEFAULT_WS_URL, timeout_from_secs};
use wsprobe::health::{HealthError, check_health};
use wsprobe::{Runner, SuiteConfig, scenarios};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid receive timeout {0}; expected a positive number of seconds")]
    InvalidTimeout(f64),
    #[error(transparent)]
    Health(#[from] HealthError),
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },
}

#[derive(Parser, Debug)]
#[command(name = "wsprobe", about = "WebSocket chat scenario runner")]
struct Cli {
    #[arg(long, env = "WSPROBE_URL", default_value = DEFAULT_WS_URL)]
    url: String,

    #[arg(long, env = "WSPROBE_TIMEOUT_SECS", default_value_t = 5.0)]
    timeout_secs: f64,

    #[arg(long, env = "WSPROBE_ENCODING", default_value = "json", help = "json or protobuf")]
    encoding: Encoding,

    #[arg(long, env = "WSPROBE_HEALTH_URL", help = "HTTP URL that must answer 2xx before the run")]
    health_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the built-in scenarios.
    Run {
        #[arg(long, env = "WSPROBE_FILTER", help = "Only run scenarios whose subject contains this text")]
        filter: Option<String>,
    },
    /// Print the subjects of the built-in scenarios.
    List,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::List => {
            for scenario in scenarios::builtin() {
                println!("{}", scenario.subject());
            }
            Ok(())
        }
        Command::Run { filter } => {
            let receive_timeout = timeout_from_secs(cli.timeout_secs).ok_or(CliError::InvalidTimeout(cli.timeout_secs))?;
            let config = SuiteConfig {
                ws_url: cli.url,
                receive_timeout,
                encoding: cli.encoding,
                health_url: cli.health_url,
                filter,
            };
            run_suite(config).await
        }
    }
}

async fn run_suite(config: SuiteConfig) -> Result<(), CliError> {
    if let Some(url) = &config.health_url {
        check_health(url, Duration::from_secs(5)).await?;
    }

    let runner = Runner::new(config);
    let report = runner.run(scenarios::builtin()).await;
    println!("{report}");

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}
