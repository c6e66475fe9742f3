// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::app_config::{Config, LogLevel};
use crate::app_controller::Controller;

mod app_config;
mod app_controller;
mod archive;
mod encoding;
mod errors;
mod format;
mod language_utils;
mod matching;
mod pool;
mod providers;
mod scan;
mod scoring;
mod subtitle;
mod video;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the best matching subtitles (default command)
    #[command(alias = "get")]
    Download(DownloadArgs),

    /// List scanned videos and their missing subtitle languages
    Scan {
        /// Input video file or directory to inspect
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Generate shell completions for subscout
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct DownloadArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Language codes to download subtitles for (e.g. 'en', 'fr', 'pt-BR')
    #[arg(short, long)]
    language: Vec<String>,

    /// Provider names to search, in order
    #[arg(short, long)]
    provider: Vec<String>,

    /// Minimum score for a subtitle to be downloaded
    #[arg(short, long)]
    min_score: Option<u32>,

    /// Prefer hearing impaired subtitles
    #[arg(long, conflicts_with = "no_hearing_impaired")]
    hearing_impaired: bool,

    /// Refuse hearing impaired subtitles
    #[arg(long)]
    no_hearing_impaired: bool,

    /// Download a single subtitle overall, saved without a language suffix
    #[arg(short, long)]
    single: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "subscout.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subscout - subtitle search and download
///
/// Searches the configured subtitle providers for a video file or a whole
/// directory, ranks the candidates against each video and saves the best
/// subtitle per language next to the video.
#[derive(Parser, Debug)]
#[command(name = "subscout")]
#[command(version)]
#[command(about = "Find and download the best matching subtitles")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger { level });
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {:5} {}\x1B[0m", color, now, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

async fn run_download(args: DownloadArgs) -> Result<()> {
    let mut config = Config::from_file_or_default(&args.config_path)?;

    // command line overrides
    if !args.language.is_empty() {
        config.languages = args.language;
    }
    if !args.provider.is_empty() {
        config.providers = args.provider;
    }
    if let Some(min_score) = args.min_score {
        config.min_score = min_score;
    }
    if args.hearing_impaired {
        config.hearing_impaired = Some(true);
    } else if args.no_hearing_impaired {
        config.hearing_impaired = Some(false);
    }
    if args.single {
        config.single = true;
    }
    if let Some(level) = args.log_level {
        config.log_level = level.into();
    }
    config.validate()?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::new(config);
    let reports = controller.download(&args.input_path).await?;

    let saved: usize = reports.iter().map(|r| r.saved.len()).sum();
    if saved == 0 {
        println!("No subtitle downloaded");
    }
    for report in reports {
        for path in report.saved {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn run_scan(input_path: PathBuf) -> Result<()> {
    let config = Config::default();
    let controller = Controller::new(config);

    for (video, missing) in controller.preview(&input_path)? {
        if missing.is_empty() {
            println!("{video}: complete");
        } else {
            println!("{video}: missing {}", missing.join(", "));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default,
    // the level is adjusted after loading the config
    CustomLogger::init(LevelFilter::Info).map_err(|e| anyhow!("{e}"))?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subscout", &mut std::io::stdout());
            Ok(())
        }
        Commands::Scan { input_path } => run_scan(input_path),
        Commands::Download(args) => run_download(args).await,
    }
}
