use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Target};

use crate::config::LoggingConfig;

/// Log file location under the local data directory
pub fn log_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("KeystrokeScrambler")
        .join("logs")
        .join("keystroke_scrambler.log")
}

/// Initialise the global logger.
///
/// `RUST_LOG` overrides the configured level. Returns the log file path
/// when logging to a file.
pub fn setup_logging(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(config.level_filter()?)
        .parse_default_env();

    let log_path = if config.to_file {
        let path = log_file_path();
        if let Some(dir) = path.parent() {
            create_dir_all(dir).context("Failed to create log directory")?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
        Some(path)
    } else {
        builder.target(Target::Stderr);
        None
    };

    builder.try_init().context("Logger already initialised")?;
    Ok(log_path)
}
