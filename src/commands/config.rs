use anyhow::Result;
use colored::Colorize;
use request_observer::config::ObserverConfig;
use tracing::info;

/// Execute the config command
///
/// Displays the effective configuration with the connection password masked
pub fn show(cfg: &ObserverConfig) -> Result<()> {
    info!("Displaying effective configuration");

    let mut sanitized = cfg.clone();
    sanitized.mongo.uri = cfg.masked_uri();

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(&sanitized)?);

    Ok(())
}
