use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::{DemoError, Result};

const DEFAULT_FILTER: &str = "warn";

/// Resolve the log filter: an explicit directive wins, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`].
pub fn filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|err| DemoError::invalid(format!("--log {directive:?}: {err}"))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// parseable in `--format json` mode.
pub fn init(directive: Option<&str>, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(directive)?)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|err| DemoError::LogInit {
        message: err.to_string(),
    })
}
