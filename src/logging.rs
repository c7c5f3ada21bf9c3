//! File-backed logger setup. The terminal is in raw mode while the apps run,
//! so log lines go to a file in the data directory instead of stderr.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

/// Install the global logger, appending to `path`. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("failed to install logger")?;

    log::info!("logging to {}", path.display());
    Ok(())
}
