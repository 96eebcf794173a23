//! Command implementations for the CLI
//!
//! - ping: Check datastore connectivity
//! - log-error / log-metrics: Record a single event by hand
//! - config: Display the effective configuration

pub mod config;
pub mod ping;
pub mod record;
