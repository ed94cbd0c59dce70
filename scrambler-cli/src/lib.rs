//! Host shell for the keystroke scrambler
//!
//! Loads the TOML configuration, sets up logging, picks the platform
//! backend and drives the engine from simple text commands.

pub mod analysis;
pub mod backend;
pub mod config;
pub mod logging;
pub mod session;

pub use analysis::{sample_summary, DelaySummary};
pub use config::{default_config_path, Config, GeneralConfig, LoggingConfig};
pub use session::{execute, status_line, Command, Reply, STATUS_ACTIVE, STATUS_INACTIVE};
