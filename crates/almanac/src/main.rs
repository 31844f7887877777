//! almanac - A terminal month calendar
//!
//! Prints a month grid with holidays and season markers, and manages the
//! light/dark appearance preference used to color it.

mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use almanac_core::dates::parse_date;
use almanac_core::{AppearanceMode, Clock, Config, FixedClock, SystemClock, logging};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

/// almanac - A terminal month calendar
#[derive(Parser, Debug)]
#[command(name = "almanac", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a month grid (default: the current month)
    Show {
        #[command(flatten)]
        month: MonthArgs,

        #[command(flatten)]
        clock: ClockArgs,

        /// Print the grid as JSON instead of drawing it
        #[arg(long)]
        json: bool,
    },
    /// Show or change the light/dark appearance
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// List annotated days
    Events {
        /// Year to list (default: the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Only list this month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        #[command(flatten)]
        clock: ClockArgs,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct MonthArgs {
    /// Year to show (default: the current year)
    #[arg(long)]
    year: Option<i32>,

    /// Month to show, 1-12 (default: the current month)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

/// Pin "now" instead of reading the wall clock.
#[derive(ClapArgs, Debug, Default)]
struct ClockArgs {
    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, conflicts_with = "now")]
    today: Option<String>,

    /// Treat this RFC 3339 instant as now
    #[arg(long)]
    now: Option<String>,
}

impl ClockArgs {
    fn build(&self) -> Result<Box<dyn Clock>> {
        if let Some(ref now) = self.now {
            let clock = FixedClock::at(now).with_context(|| format!("invalid --now '{}'", now))?;
            return Ok(Box::new(clock));
        }
        if let Some(ref today) = self.today {
            let date = parse_date(today).with_context(|| format!("invalid --today '{}'", today))?;
            return Ok(Box::new(FixedClock::at_date(date)));
        }
        Ok(Box::new(SystemClock))
    }
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    /// Print the stored mode, the system signal and the effective theme
    Get {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist an appearance override
    Set {
        /// Mode to store
        mode: ModeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Follow the environment's color-scheme preference
    System,
    /// Always light
    Light,
    /// Always dark
    Dark,
}

impl From<ModeArg> for AppearanceMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::System => AppearanceMode::System,
            ModeArg::Light => AppearanceMode::Light,
            ModeArg::Dark => AppearanceMode::Dark,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    logging::init(args.verbose);

    // --print-example-config: print the example config with comments
    if args.print_example_config {
        print!("{}", almanac_core::config::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // Load configuration using XDG lookup chain
    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        debug!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    // Validate configuration (strict - fail on invalid values)
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    debug!("Configuration validated successfully");

    // --check-config: just validate and exit
    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        if args.verbose > 0 {
            println!("{}", config.summary());
        }
        return ExitCode::SUCCESS;
    }

    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    let command = args.command.unwrap_or(Command::Show {
        month: MonthArgs::default(),
        clock: ClockArgs::default(),
        json: false,
    });

    match run_command(command, &config, color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a subcommand against a validated config.
fn run_command(command: Command, config: &Config, color: bool) -> Result<()> {
    match command {
        Command::Show { month, clock, json } => {
            let clock = clock.build()?;
            commands::show::run(config, clock.as_ref(), month.year, month.month, json, color)
        }
        Command::Theme { action } => match action {
            ThemeAction::Get { json } => commands::theme::get(config, json, color),
            ThemeAction::Set { mode } => commands::theme::set(config, mode.into(), color),
        },
        Command::Events { year, month, clock } => {
            let clock = clock.build()?;
            commands::events::run(config, clock.as_ref(), year, month, color)
        }
    }
}
