use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "request-observer", version, about = "Request error and latency recorder")]
pub struct Cli {
    /// Configuration file path (defaults to ./observer.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check that the datastore is reachable
    Ping,

    /// Record one error event
    LogError {
        /// Request identifier
        #[arg(long)]
        request_id: String,

        /// Short error summary
        #[arg(short, long)]
        message: String,

        /// Free-form details
        #[arg(short, long, default_value = "")]
        details: String,

        /// Give up on the insert after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Record one metrics event
    LogMetrics {
        /// Request identifier
        #[arg(long)]
        request_id: String,

        /// Invoked service or method name
        #[arg(short, long)]
        service: String,

        /// Elapsed time in milliseconds
        #[arg(long)]
        duration_ms: u64,

        /// Outcome code
        #[arg(long, default_value = "200")]
        status_code: i32,

        /// Give up on the insert after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Display the effective configuration (password masked)
    Config,
}
