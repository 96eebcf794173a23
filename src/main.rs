use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use request_observer::{config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // Configuration decides the log level and format, so load it first
    let cfg = config::load_config(args.config.as_deref())?;
    logging::init_tracing(&cfg.log.level, &cfg.log.format);

    match args.command {
        cli::Commands::Ping => {
            commands::ping::execute(&cfg).await?;
        }
        cli::Commands::LogError {
            request_id,
            message,
            details,
            timeout_secs,
        } => {
            commands::record::log_error(&cfg, &request_id, &message, &details, timeout_secs)
                .await?;
        }
        cli::Commands::LogMetrics {
            request_id,
            service,
            duration_ms,
            status_code,
            timeout_secs,
        } => {
            commands::record::log_metrics(
                &cfg,
                &request_id,
                &service,
                duration_ms,
                status_code,
                timeout_secs,
            )
            .await?;
        }
        cli::Commands::Config => {
            commands::config::show(&cfg)?;
        }
    }

    Ok(())
}
