//! Sortie auto-player.
//!
//! # Usage
//!
//! ```bash
//! # Run every enabled cycle until interrupted
//! sortie_bot --config config.ron run
//!
//! # Stop after two hours
//! sortie_bot run --max-minutes 120
//!
//! # Report where a template matches on the current screen
//! sortie_bot find combat_enemy_boss 0.8
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sortie_bot::{error::Result, BotConfig, Driver};
use sortie_core::cancel::Cancellation;
use sortie_core::capability::{ScreenMatcher, Template};
use sortie_core::controller::Controller;
use sortie_device::{Adb, AdbInput, AdbScreen, JitterPacer, SystemClock, TemplateLibrary};

#[derive(Parser)]
#[command(name = "sortie_bot")]
#[command(about = "Auto-player for sorties, commissions, missions and retirement")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "config.ron")]
    config: PathBuf,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enabled cycles until interrupted
    Run {
        /// Stop after this many minutes of wall time
        #[arg(long)]
        max_minutes: Option<u64>,
    },

    /// Capture one frame and report where a template matches
    Find {
        /// Template asset name (file stem)
        template: String,

        /// Minimum similarity
        similarity: f32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    let result = match cli.command.unwrap_or(Commands::Run { max_minutes: None }) {
        Commands::Run { max_minutes } => cmd_run(&cli.config, max_minutes),
        Commands::Find {
            template,
            similarity,
        } => cmd_find(&cli.config, &template, similarity),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Fatal error.");
            ExitCode::FAILURE
        }
    }
}

fn connect(config: &BotConfig) -> Result<(Adb, TemplateLibrary)> {
    let adb = Adb::new(&config.device.adb_path, config.device.serial.clone());
    adb.restart_server()?;
    let library = TemplateLibrary::load_dir(&config.device.assets_dir)?;
    info!(templates = library.len(), "Device ready.");
    Ok((adb, library))
}

fn cmd_run(config_path: &Path, max_minutes: Option<u64>) -> Result<()> {
    let config = BotConfig::load(config_path)?;
    let (adb, library) = connect(&config)?;

    let cancel = match max_minutes {
        Some(minutes) => {
            info!(minutes, "Run time limited.");
            Cancellation::with_deadline(Instant::now() + Duration::from_secs(minutes * 60))
        }
        None => Cancellation::new(),
    };
    let mut ctl = Controller::new(
        AdbScreen::new(adb.clone(), library),
        AdbInput::new(adb),
        JitterPacer::new(),
        SystemClock,
    )
    .with_cancellation(cancel);

    let mut driver = Driver::from_config(&config, ctl.now())?;
    driver.run(&mut ctl)?;
    Ok(())
}

fn cmd_find(config_path: &Path, template: &str, similarity: f32) -> Result<()> {
    let config = BotConfig::load(config_path)?;
    let (adb, library) = connect(&config)?;
    let mut screen = AdbScreen::new(adb, library);
    screen.refresh()?;

    let template = Template::Named(template.to_string());
    match screen.find(&template, similarity)? {
        Some(region) => info!(%template, similarity, ?region, "Best match."),
        None => info!(%template, similarity, "No match."),
    }
    let all = screen.find_all(&template, similarity)?;
    info!(%template, count = all.len(), points = ?all, "All matches.");
    Ok(())
}
