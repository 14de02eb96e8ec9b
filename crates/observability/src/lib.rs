// crates/observability/src/lib.rs
//! Tracing setup shared by the bulkadd binaries.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Checked before `RUST_LOG`.
pub const LOG_ENV: &str = "BULKADD_LOG";

/// Build the filter from `BULKADD_LOG`, then `RUST_LOG`, then `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install a compact fmt subscriber writing to stderr.
///
/// Stdout stays free for command output. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter(default_level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to install tracing subscriber")?;
    tracing::debug!("Tracing initialized");
    Ok(())
}
