use anyhow::{Context, Result};
use colored::Colorize;
use request_observer::config::ObserverConfig;
use request_observer::Observer;
use std::time::Instant;
use tracing::info;

/// Execute the ping command
///
/// Runs a single health check and fails with the wrapped driver error when
/// the datastore is unreachable
pub async fn execute(cfg: &ObserverConfig) -> Result<()> {
    println!("{} {}", "Pinging".yellow(), cfg.masked_uri());

    let observer = Observer::from_config(cfg)
        .await
        .context("Failed to create observer")?;

    let start = Instant::now();
    observer.ping().await?;
    let elapsed = start.elapsed();

    info!(duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX), "Ping succeeded");
    println!(
        "{} ({:.1} ms)",
        "✓ Datastore reachable".green(),
        elapsed.as_secs_f64() * 1000.0
    );

    Ok(())
}
