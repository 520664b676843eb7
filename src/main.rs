//! Lingo gateway.
//!
//! ```text
//!     Client ──▶ http server ──▶ routing ──▶ auth middleware ──▶ handlers
//!                                                                   │
//!                        ┌──────────────────────┬───────────────────┤
//!                        ▼                      ▼                   ▼
//!                 identity service        words service      experience store
//!                 (auth delegate)       (words delegate)         (MySQL)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lingo_gateway::config::loader::ConfigError;
use lingo_gateway::lifecycle::startup;
use lingo_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "lingo-gateway")]
#[command(about = "HTTP gateway for the language-learning application", long_about = None)]
struct Cli {
    /// TOML configuration file; the environment is used when omitted
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match startup::load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_version = %config.api.version,
        listen = %config.listen_address(),
        "lingo-gateway starting"
    );

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}

/// Logging is not configured yet, so errors go to stderr.
fn report_config_error(error: &ConfigError) {
    match error {
        ConfigError::Validation(errors) => {
            eprintln!("invalid configuration:");
            for e in errors {
                eprintln!("  - {e}");
            }
        }
        other => eprintln!("failed to load configuration: {other}"),
    }
}
