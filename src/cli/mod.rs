//! Command-line interface for the flowviz pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

use crate::FlowvizConfig;

#[derive(Parser)]
#[command(name = "vp-flowviz")]
#[command(about = "Aggregate vertical-profile bird radar data for flow visualization", version)]
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
    /// Bin, filter and aggregate vp files into a flowviz CSV
    Run {
        /// Directory containing vp CSV files (overrides config)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        /// Directory for the flowviz CSV (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Project name used as output file prefix (overrides config)
        #[arg(short, long)]
        project: Option<String>,
        /// Minimum bird density for a record to be aggregated (overrides config)
        #[arg(long)]
        min_density: Option<f64>,
    },

    /// List the vp files that would be read, with their row counts
    Scan {
        /// Directory containing vp CSV files (overrides config)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
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
        Some(path) => match FlowvizConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                error!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FlowvizConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Run { input_dir, output_dir, project, min_density } => {
            cmd_run(config, input_dir, output_dir, project, min_density);
        }
        Commands::Scan { input_dir } => {
            cmd_scan(config, input_dir);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path);
        }
    }
}

fn cmd_run(
    mut config: FlowvizConfig,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    project: Option<String>,
    min_density: Option<f64>,
) {
    use crate::processors::pipeline;

    let start = Instant::now();

    // Apply CLI overrides
    if let Some(dir) = input_dir {
        config.project.vp_data_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.project.processed_data_dir = dir;
    }
    if let Some(name) = project {
        config.project.name = name;
    }
    if let Some(density) = min_density {
        config.filtering.min_density = density;
    }

    println!("Running flowviz pipeline...");
    println!("Project: {}", config.project.name);
    println!("Input directory: {}", config.project.vp_data_dir.display());
    println!("Output file: {}", config.output_path().display());

    let spinner = create_spinner("Loading and aggregating vp data...");

    match pipeline::run_pipeline(&config) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Flowviz Export Complete",
                &[
                    ("Project", config.project.name.clone()),
                    ("Files loaded", summary.files_loaded.to_string()),
                    ("Records loaded", summary.records_loaded.to_string()),
                    ("Records kept", summary.records_kept.to_string()),
                    ("Groups", summary.groups.to_string()),
                    ("Rows written", summary.rows_written.to_string()),
                    ("Radars", join_or_none(&summary.coverage.observed)),
                    ("Missing radars", join_or_none(&summary.coverage.missing)),
                    ("Unexpected radars", join_or_none(&summary.coverage.unexpected)),
                    ("Output file", summary.output_path.display().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Pipeline failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_scan(config: FlowvizConfig, input_dir: Option<PathBuf>) {
    use crate::core::loaders;

    let start = Instant::now();
    let directory = input_dir.unwrap_or(config.project.vp_data_dir);

    let files = match loaders::find_vp_files(&directory, &config.input) {
        Ok(files) => files,
        Err(e) => {
            error!("Scan failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut total_records = 0;
    for path in &files {
        match loaders::load_vp_csv(path) {
            Ok(records) => {
                println!("  {:>8}  {}", records.len(), path.display());
                total_records += records.len();
            }
            Err(e) => {
                error!("Failed to parse {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    print_summary(
        "Scan Complete",
        &[
            ("Directory", directory.display().to_string()),
            (
                "File rule",
                format!("*{}*{}", config.input.file_marker, config.input.file_extension),
            ),
            ("Files", files.len().to_string()),
            ("Records", total_records.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_init_config(path: &PathBuf) {
    match FlowvizConfig::default().to_yaml(path) {
        Ok(()) => println!("Wrote default config to {}", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
