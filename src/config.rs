use crate::observer::RequestIdStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `REQUEST_OBSERVER__MONGO__URI`
pub const ENV_PREFIX: &str = "REQUEST_OBSERVER";

/// File searched for when no explicit path is given (`observer.toml`)
pub const DEFAULT_CONFIG_NAME: &str = "observer";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObserverConfig {
    pub ping_timeout_secs: u64,
    pub request_id: RequestIdStrategy,
    pub mongo: MongoConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            ping_timeout_secs: 10,
            request_id: RequestIdStrategy::UnixNanos,
            mongo: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "obs".to_string(),
                collection: "events".to_string(),
            },
            log: LogConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl ObserverConfig {
    /// Connection URI with any password replaced by `***`
    pub fn masked_uri(&self) -> String {
        mask_uri_password(&self.mongo.uri)
    }
}

/// Load configuration from defaults, an optional file, and the environment
///
/// When `path` is `None`, `observer.toml` in the working directory is used if
/// present. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ObserverConfig> {
    let defaults = ObserverConfig::default();

    let mut builder = config::Config::builder()
        .set_default("mongo.uri", defaults.mongo.uri)?
        .set_default("mongo.database", defaults.mongo.database)?
        .set_default("mongo.collection", defaults.mongo.collection)?
        .set_default("ping_timeout_secs", defaults.ping_timeout_secs)?
        .set_default("request_id", "unix_nanos")?
        .set_default("log.level", defaults.log.level)?
        .set_default("log.format", defaults.log.format)?;

    builder = match path {
        Some(path) => builder.add_source(config::File::from(path).required(true)),
        None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };

    let config = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let cfg: ObserverConfig = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &ObserverConfig) -> anyhow::Result<()> {
    if cfg.ping_timeout_secs == 0 {
        anyhow::bail!("ping_timeout_secs must be greater than zero");
    }

    match cfg.log.format.as_str() {
        "json" | "pretty" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'json' or 'pretty'", other),
    }

    Ok(())
}

fn mask_uri_password(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };

    // Userinfo ends at the last '@' before the host list.
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return uri.to_string();
    };

    let userinfo = &rest[..at];
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}://{}:***{}", scheme, user, &rest[at..]),
        None => uri.to_string(),
    }
}
