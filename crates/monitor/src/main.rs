//! Drowsiness Monitor - Main Entry Point
//!
//! Usage: `drowsiness-monitor [config.toml]` (or `DMS_CONFIG=...`).

use std::path::PathBuf;

use monitor::{init_logging, run, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("DMS_CONFIG"))
        .map(PathBuf::from);

    let (settings, config) = Settings::load(config_path.as_deref())?;
    init_logging(&settings.log_level, settings.log_format)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Features: eye tracking, yawn detection, head pose, statistics");

    run(settings, config).await?;
    Ok(())
}
