//! Log sinks
//!
//! The observer reports its own insert failures through a dedicated
//! dispatcher instead of the process-wide subscriber, so recording failures
//! always reach stderr as JSON even when the host application logs elsewhere.

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// JSON lines on stderr, one object per event
pub fn json_stderr_dispatch() -> Dispatch {
    json_dispatch(std::io::stderr)
}

/// JSON lines written to `writer`
pub fn json_dispatch<W>(writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = fmt()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_current_span(false)
        .finish();

    Dispatch::new(subscriber)
}

/// Install the process-wide subscriber used by the command-line tool
///
/// `level` is used when `RUST_LOG` is unset. `format` is `json` or `pretty`.
pub fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        "pretty" => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }
}
