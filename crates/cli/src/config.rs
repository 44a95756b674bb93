// Environment configuration for the binaries

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use lockprobe_core::application::constants::{
    DEFAULT_FIXTURE_DIR, DEFAULT_FIXTURE_DURATION, DEFAULT_FIXTURE_HEARTBEAT,
    DEFAULT_FIXTURE_INTERVAL,
};
use lockprobe_core::application::{FixtureConfig, FixtureMode};

pub const ENV_FIXTURE_DIR: &str = "LOCKPROBE_FIXTURE_DIR";
pub const ENV_FIXTURE_MODE: &str = "LOCKPROBE_FIXTURE_MODE";
pub const ENV_FIXTURE_LOCK: &str = "LOCKPROBE_FIXTURE_LOCK";
pub const ENV_FIXTURE_DURATION_SECS: &str = "LOCKPROBE_FIXTURE_DURATION_SECS";
pub const ENV_FIXTURE_INTERVAL_MS: &str = "LOCKPROBE_FIXTURE_INTERVAL_MS";

/// File name of the holder helper binary
pub const HOLDER_BIN_NAME: &str = "lockprobe-holder";

/// Holder helper next to the running executable
pub fn default_holder_bin() -> PathBuf {
    holder_bin_beside(std::env::current_exe())
}

/// Sibling of `exe`, or the bare helper name (looked up on PATH) when the
/// executable location is unknown
fn holder_bin_beside(exe: std::io::Result<PathBuf>) -> PathBuf {
    let name = format!("{}{}", HOLDER_BIN_NAME, std::env::consts::EXE_SUFFIX);
    match exe {
        Ok(exe) => exe.with_file_name(name),
        Err(e) => {
            warn!(error = %e, "Cannot locate current executable, using holder from PATH");
            PathBuf::from(name)
        }
    }
}

/// Load the fixture configuration from the process environment
pub fn fixture_config_from_env() -> Result<FixtureConfig> {
    fixture_config_from(|key| std::env::var(key).ok())
}

/// Load the fixture configuration through `lookup`
///
/// Unset variables fall back to the defaults; malformed ones are errors.
pub fn fixture_config_from<F>(lookup: F) -> Result<FixtureConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let output_dir = lookup(ENV_FIXTURE_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_DIR));

    let hold_lock = match lookup(ENV_FIXTURE_LOCK) {
        Some(value) => parse_bool(&value).with_context(|| format!("Invalid {}", ENV_FIXTURE_LOCK))?,
        None => true,
    };

    let duration = match lookup(ENV_FIXTURE_DURATION_SECS) {
        Some(value) => Duration::from_secs(
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_FIXTURE_DURATION_SECS, value))?,
        ),
        None => DEFAULT_FIXTURE_DURATION,
    };

    let interval = match lookup(ENV_FIXTURE_INTERVAL_MS) {
        Some(value) => Duration::from_millis(
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", ENV_FIXTURE_INTERVAL_MS, value))?,
        ),
        None => DEFAULT_FIXTURE_INTERVAL,
    };
    if interval.is_zero() {
        return Err(anyhow!("{} must be greater than zero", ENV_FIXTURE_INTERVAL_MS));
    }

    let mode = match lookup(ENV_FIXTURE_MODE).as_deref().map(str::trim) {
        None | Some("hold") => FixtureMode::Hold {
            heartbeat: DEFAULT_FIXTURE_HEARTBEAT,
        },
        Some("write") => FixtureMode::Write { interval },
        Some(other) => {
            return Err(anyhow!(
                "Invalid {}: {:?} (expected \"hold\" or \"write\")",
                ENV_FIXTURE_MODE,
                other
            ))
        }
    };

    Ok(FixtureConfig {
        output_dir,
        mode,
        hold_lock,
        duration,
        ..FixtureConfig::default()
    })
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("not a boolean: {:?}", other)),
    }
}
