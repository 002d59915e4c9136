//! Command-line parsing for the ChIP-qPCR quantifier.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! quantification code; `app` does the dispatch.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "chipq", version, about = "ChIP-qPCR percent-input quantification")]
pub struct Cli {
    /// Experiment layout (YAML).
    #[arg(long, global = true, env = "CHIPQ_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Quantify every series, print tables and charts, and optionally export.
    Report(ReportArgs),
    /// Print the positional row layout every series file must follow.
    Layout,
    /// Re-render tables and charts from a saved results JSON.
    Plot(PlotArgs),
    /// Write synthetic series files that follow the configured layout.
    Simulate(SimulateArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same pipeline as `chipq report`, but renders panels in a
    /// terminal UI using Ratatui.
    Tui(DataArgs),
}

/// Where series come from and how failures are treated.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Directory of series CSV files (overrides `data_dir` in the config).
    #[arg(long, env = "CHIPQ_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fail the run if any series fails.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,

    /// Export per-target results to CSV (long format).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export final ratios to JSON (readable by `chipq plot`).
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Write a markdown debug bundle under `debug/`.
    #[arg(long)]
    pub debug: bool,
}

/// Options for plotting a saved results file.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Results JSON produced by `chipq report --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,

    /// Antibodies to show, in file order.
    #[arg(long, default_value_t = 6)]
    pub max_panels: usize,

    /// Print tables only.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Output directory (defaults to the configured data directory).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Number of series files to write.
    #[arg(short = 'n', long, default_value_t = 4)]
    pub series: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Replicate noise (standard deviation, cycles).
    #[arg(long, default_value_t = 0.15)]
    pub noise: f64,
}
