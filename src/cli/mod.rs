//! Command-line interface for the battery pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pipeline::{run_batch, BatchReport, StageSet};

#[derive(Parser)]
#[command(name = "battery-pipeline")]
#[command(about = "Battery-test CSV analysis pipeline", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Whole-dataset summary statistics, scatter plot, and voltage outliers
    Summarize {
        /// Directory containing CSV files (defaults to the working directory)
        #[arg(default_value = ".")]
        directory: PathBuf,
    },

    /// Per-mode statistics, mode plots, and the battery cycle analysis
    Modes {
        /// Directory containing CSV files (defaults to the working directory)
        #[arg(default_value = ".")]
        directory: PathBuf,
    },

    /// Daily mode resampling: time-series CSV and plot
    Timeseries {
        /// Directory containing CSV files (defaults to the working directory)
        #[arg(default_value = ".")]
        directory: PathBuf,
    },

    /// Run all analysis stages in one pass per file
    Run {
        /// Directory containing CSV files (defaults to the working directory)
        #[arg(default_value = ".")]
        directory: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = truncate_value(value, 39);
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Truncate to at most `max` characters, on a character boundary, with an
/// ellipsis when anything was cut.
fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let cut: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Summarize { directory } => {
            cmd_batch("Summary Analysis", &directory, &config, StageSet::summary_only());
        }
        Commands::Modes { directory } => {
            cmd_batch("Mode Analysis", &directory, &config, StageSet::modes_only());
        }
        Commands::Timeseries { directory } => {
            cmd_batch(
                "Time-Series Analysis",
                &directory,
                &config,
                StageSet::time_series_only(),
            );
        }
        Commands::Run { directory } => {
            cmd_batch("Full Analysis", &directory, &config, StageSet::all());
        }
    }
}

fn cmd_batch(title: &str, directory: &PathBuf, config: &PipelineConfig, stages: StageSet) {
    let start = Instant::now();

    let spinner = create_spinner("Processing CSV files...");

    let result = run_batch(directory, config, stages);

    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            if report.processed == 0 && report.skipped == 0 {
                println!("No CSV files found in {}", directory.display());
                return;
            }
            print_report(title, directory, &report, start);
        }
        Err(e) => {
            log::error!("{} failed: {:#}", title, e);
            std::process::exit(1);
        }
    }
}

fn print_report(title: &str, directory: &PathBuf, report: &BatchReport, start: Instant) {
    print_summary(
        &format!("{} Complete", title),
        &[
            ("Directory", directory.display().to_string()),
            ("Files processed", report.processed.to_string()),
            ("Files skipped", report.skipped.to_string()),
            ("Artifacts written", report.artifacts.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}
