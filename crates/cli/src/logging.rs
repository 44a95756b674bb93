//! Logging setup shared by the lockprobe binaries
//!
//! Logs always go to stderr; stdout is reserved for the report (and for the
//! holder's handshake lines).

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the prober
pub const PROBE_LOG_FILTER: &str = "warn,lockprobe_core=info,lockprobe_infra_system=info";

/// Default filter for helper processes
pub const QUIET_LOG_FILTER: &str = "warn";

/// Initialize tracing
///
/// # Environment Variables
///
/// - `RUST_LOG`: overrides `default_filter`
/// - `LOCKPROBE_LOG_FORMAT`: `json`, `pretty`, or anything else for compact
pub fn init_logging(default_filter: &str) -> Result<()> {
    let log_format = std::env::var("LOCKPROBE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("invalid log filter: {}", e))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
