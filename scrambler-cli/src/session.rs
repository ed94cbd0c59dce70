//! Interactive control of a running engine

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use log::info;
use scrambler_core::Scrambler;

use crate::config::validate_base_delay_ms;

pub const STATUS_ACTIVE: &str = "Active: Scrambling enabled";
pub const STATUS_INACTIVE: &str = "Inactive: Normal typing";

pub const HELP: &str = "Commands: start, stop, status, delay <ms>, help, quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    Delay(u64),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| anyhow!("Empty command"))?;
        let parsed = match command.to_ascii_lowercase().as_str() {
            "start" | "on" => Command::Start,
            "stop" | "off" => Command::Stop,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "delay" => {
                let value = words.next().ok_or_else(|| anyhow!("Usage: delay <ms>"))?;
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("Invalid delay: {}", value))?;
                Command::Delay(ms)
            }
            other => bail!("Unknown command: {} ({})", other, HELP),
        };
        if words.next().is_some() {
            bail!("Unexpected arguments after {}", command);
        }
        Ok(parsed)
    }
}

pub fn status_line(scrambler: &Scrambler) -> &'static str {
    if scrambler.is_enabled() {
        STATUS_ACTIVE
    } else {
        STATUS_INACTIVE
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(String),
    Quit,
}

/// Apply a command to the engine and describe the result
pub fn execute(scrambler: &Scrambler, command: Command) -> Result<Reply> {
    let message = match command {
        Command::Start => {
            scrambler.start()?;
            status_line(scrambler).to_string()
        }
        Command::Stop => {
            scrambler.stop();
            status_line(scrambler).to_string()
        }
        Command::Status => {
            let mut status = format!(
                "{} (base delay {} ms, {} model)",
                status_line(scrambler),
                (scrambler.base_delay() * 1000.0).round() as u64,
                scrambler.delay_model()
            );
            if scrambler.is_degraded() {
                status.push_str(", injection failing: keys pass through");
            }
            status
        }
        Command::Delay(ms) => {
            validate_base_delay_ms(ms)?;
            scrambler.set_base_delay(ms as f64 / 1000.0)?;
            info!("Base delay changed to {} ms", ms);
            format!("Base delay set to {} ms", ms)
        }
        Command::Help => HELP.to_string(),
        Command::Quit => {
            scrambler.stop();
            return Ok(Reply::Quit);
        }
    };
    Ok(Reply::Message(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("start".parse::<Command>().unwrap(), Command::Start);
        assert_eq!("  STOP ".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("delay 150".parse::<Command>().unwrap(), Command::Delay(150));
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Command>().is_err());
        assert!("delay".parse::<Command>().is_err());
        assert!("delay fast".parse::<Command>().is_err());
        assert!("status now".parse::<Command>().is_err());
        assert!("scramble".parse::<Command>().is_err());
    }
}
