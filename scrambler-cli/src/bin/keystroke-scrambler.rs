use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use keystroke_scrambler::analysis::{parse_key, sample_summary};
use keystroke_scrambler::backend::create_platform;
use keystroke_scrambler::config::{default_config_path, Config};
use keystroke_scrambler::logging::setup_logging;
use keystroke_scrambler::session::{execute, status_line, Command, Reply, HELP};
use scrambler_core::{DelayModel, RunLoop, Scrambler, TypingPatternMap};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reschedules keystrokes to mask typing rhythm", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start scrambling and accept commands on stdin
    Run {
        /// Base delay in milliseconds (50-200)
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Delay model: pair-aware or flat
        #[arg(long)]
        model: Option<DelayModel>,

        /// Configuration file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Sample the delay between two keys
    Analyze {
        /// Previous key
        from: String,

        /// Current key
        to: String,

        /// Number of samples for the summary
        #[arg(long, default_value_t = 1000)]
        samples: usize,

        /// Base delay in milliseconds (50-200), defaults to the configured one
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Delay model: pair-aware or flat, defaults to the configured one
        #[arg(long)]
        model: Option<DelayModel>,

        /// Configuration file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Inspect or change the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the configuration file location
    Path,
    /// Print the current configuration
    Show,
    /// Set the base delay in milliseconds
    SetDelay { ms: u64 },
    /// Set the delay model (pair-aware or flat)
    SetModel { model: DelayModel },
}

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            base_delay_ms,
            model,
            config,
        } => run(base_delay_ms, model, config),
        Commands::Analyze {
            from,
            to,
            samples,
            base_delay_ms,
            model,
            config,
        } => analyze(&from, &to, samples, base_delay_ms, model, config),
        Commands::Config { action } => configure(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Load the config file, then apply command-line overrides
fn load_config(
    config_path: Option<PathBuf>,
    base_delay_ms: Option<u64>,
    model: Option<DelayModel>,
) -> Result<Config> {
    let config_path = match config_path {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(ms) = base_delay_ms {
        config.set_base_delay_ms(ms)?;
    }
    if let Some(model) = model {
        config.set_delay_model(model);
    }
    Ok(config)
}

fn run(base_delay_ms: Option<u64>, model: Option<DelayModel>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path, base_delay_ms, model)?;

    if let Some(log_path) = setup_logging(&config.logging)? {
        println!("Logging to {}", log_path.display());
    }

    let run_loop = Arc::new(RunLoop::spawn().context("Failed to start dispatch thread")?);
    let scrambler = Scrambler::with_delay_model(create_platform(run_loop.clone()), config.delay_model()?);
    scrambler.set_base_delay(config.base_delay_secs())?;
    info!(
        "Keystroke scrambler ready (base delay {} ms, {} model)",
        config.general.base_delay_ms,
        scrambler.delay_model()
    );

    if let Err(e) = scrambler.start() {
        error!("{}", e);
        eprintln!("{}", e);
        if e.is_permission_denied() {
            eprintln!("Grant the keyboard permission and type 'start' to retry.");
        }
    }
    println!("{}", status_line(&scrambler));
    println!("{}", HELP);

    let result = command_loop(&scrambler);

    scrambler.stop();
    run_loop.shutdown();
    info!("Keystroke scrambler exited");
    result
}

fn command_loop(scrambler: &Scrambler) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = line
            .parse::<Command>()
            .and_then(|command| execute(scrambler, command));
        match reply {
            Ok(Reply::Message(message)) => println!("{}", message),
            Ok(Reply::Quit) => return Ok(()),
            Err(e) => println!("Error: {:#}", e),
        }
        stdout.flush()?;
    }
    Ok(())
}

fn analyze(
    from: &str,
    to: &str,
    samples: usize,
    base_delay_ms: Option<u64>,
    model: Option<DelayModel>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path, base_delay_ms, model)?;
    let (from, to) = (parse_key(from)?, parse_key(to)?);
    let patterns = TypingPatternMap::new();

    println!("{}", patterns.analyze_transition(from, to));
    let summary = sample_summary(
        &patterns,
        config.delay_model()?,
        config.general.base_delay_ms,
        from,
        to,
        samples,
    )?;
    println!();
    println!("{}", summary);
    Ok(())
}

fn configure(action: ConfigAction) -> Result<()> {
    let path = default_config_path()?;
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        ConfigAction::SetDelay { ms } => {
            let mut config = Config::load_from(&path)?;
            config.set_base_delay_ms(ms)?;
            config.save_to(&path)?;
            println!("Base delay set to {} ms", ms);
        }
        ConfigAction::SetModel { model } => {
            let mut config = Config::load_from(&path)?;
            config.set_delay_model(model);
            config.save_to(&path)?;
            println!("Delay model set to {}", model);
        }
    }
    Ok(())
}
