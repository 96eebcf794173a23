use anyhow::{Context, Result};
use colored::Colorize;
use request_observer::config::ObserverConfig;
use request_observer::{Observer, RequestContext};
use std::time::Duration;
use tracing::info;

fn context_for(timeout_secs: Option<u64>) -> RequestContext {
    match timeout_secs {
        Some(secs) => RequestContext::with_timeout(Duration::from_secs(secs)),
        None => RequestContext::background(),
    }
}

/// Execute the log-error command
pub async fn log_error(
    cfg: &ObserverConfig,
    request_id: &str,
    message: &str,
    details: &str,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let observer = Observer::from_config(cfg)
        .await
        .context("Failed to create observer")?;

    let ctx = context_for(timeout_secs);
    observer
        .log_error(&ctx, request_id, message, details)
        .await?;

    info!(request_id = %request_id, "Error event recorded");
    println!("{} {}", "✓ Recorded error event".green(), request_id);
    Ok(())
}

/// Execute the log-metrics command
///
/// Insert failures are only reported through the observer's log output,
/// matching how metrics are recorded during request handling.
pub async fn log_metrics(
    cfg: &ObserverConfig,
    request_id: &str,
    service: &str,
    duration_ms: u64,
    status_code: i32,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let observer = Observer::from_config(cfg)
        .await
        .context("Failed to create observer")?;

    let ctx = context_for(timeout_secs);
    observer
        .log_metrics(
            &ctx,
            request_id,
            service,
            Duration::from_millis(duration_ms),
            status_code,
        )
        .await;

    println!("{} {}", "✓ Submitted metrics event".green(), request_id);
    Ok(())
}
