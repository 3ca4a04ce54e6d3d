//! `log` backend setup. The TUI owns stdout/stderr while running, so records
//! only go to a file there; headless binaries log to stderr.

use anyhow::Context;
use log::LevelFilter;
use std::fs::File;
use std::path::Path;

/// File logging for the TUI. Without a path, logging stays off.
pub fn init(log_file: Option<&Path>, level: LevelFilter) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("create log file {}", path.display()))?;

    builder(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("install logger")?;
    log::info!("logging to {} at {level}", path.display());
    Ok(())
}

pub fn init_stderr(level: LevelFilter) {
    // A second init (tests, repeated calls) keeps the first logger.
    let _ = builder(level).target(env_logger::Target::Stderr).try_init();
}

fn builder(level: LevelFilter) -> env_logger::Builder {
    let mut b = env_logger::Builder::new();
    b.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        b.parse_filters(&filters);
    }
    b
}
