//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the experiment layout
//! - runs the quantification pipeline
//! - prints tables/charts
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Cli, Command, DataArgs, PlotArgs, ReportArgs, SimulateArgs};
use crate::domain::ExperimentConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `chipq` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `chipq` and `chipq --strict` to behave like `chipq report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Report(args) => handle_report(&cli.config, args),
        Command::Layout => handle_layout(&cli.config),
        Command::Plot(args) => handle_plot(args),
        Command::Simulate(args) => handle_simulate(&cli.config, args),
        Command::Tui(args) => handle_tui(&cli.config, args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn handle_report(config_path: &Path, args: ReportArgs) -> Result<(), AppError> {
    let config = ExperimentConfig::load(config_path)?;
    let data_dir = data_dir(&config, &args.data);
    let run = pipeline::run_from_dir(&config, &data_dir)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    let results = run.results();
    let panels = crate::report::build_panels(&results, &config.samples, config.panel_antibodies());
    print!("{}", crate::report::format_panels(&panels));
    if !args.no_plot {
        print!("{}", crate::plot::render_panel_charts(&panels, args.width, args.height));
    }
    print!("{}", crate::report::format_failures(&run.failures));

    // Before `check`: failed runs still get a bundle.
    if args.debug {
        let path = crate::debug::write_debug_bundle(Path::new("debug"), &run, &config)?;
        println!("\nDebug bundle: {}", path.display());
    }

    run.check(args.data.strict)?;

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &run)?;
    }
    if let Some(path) = &args.export_json {
        let file = crate::io::results::ResultsFile::new(results, &config);
        crate::io::results::write_results_json(path, &file)?;
    }

    Ok(())
}

fn handle_layout(config_path: &Path) -> Result<(), AppError> {
    let config = ExperimentConfig::load(config_path)?;
    print!("{}", crate::report::format_layout(&config));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::results::read_results_json(&args.results)?;
    let n = args.max_panels.min(file.antibodies.len());
    let panels = crate::report::build_panels(&file.series, &file.samples, &file.antibodies[..n]);

    println!(
        "Results: {} series, generated {} by {}",
        file.series.len(),
        file.generated.to_rfc3339(),
        file.tool
    );
    print!("{}", crate::report::format_panels(&panels));
    if !args.no_plot {
        print!("{}", crate::plot::render_panel_charts(&panels, args.width, args.height));
    }
    Ok(())
}

fn handle_simulate(config_path: &Path, args: SimulateArgs) -> Result<(), AppError> {
    let config = ExperimentConfig::load(config_path)?;
    let out = args.out.unwrap_or_else(|| config.data_dir.clone());
    let spec = crate::data::SimulationSpec {
        series: args.series,
        seed: args.seed,
        noise: args.noise,
    };
    let paths = crate::data::write_simulated(&out, &config, &spec)?;
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_tui(config_path: &Path, args: DataArgs) -> Result<(), AppError> {
    let config = ExperimentConfig::load(config_path)?;
    let data_dir = data_dir(&config, &args);
    crate::tui::run(config, data_dir, args.strict)
}

fn data_dir(config: &ExperimentConfig, args: &DataArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| config.data_dir.clone())
}

/// Rewrite argv so `chipq` defaults to `chipq report`.
///
/// Rules:
/// - `chipq`                      -> `chipq report`
/// - `chipq --strict ...`         -> `chipq report --strict ...`
/// - `chipq --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "report" | "layout" | "plot" | "simulate" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_report() {
        assert_eq!(rewrite_args(args(&["chipq"])), args(&["chipq", "report"]));
        assert_eq!(
            rewrite_args(args(&["chipq", "-v", "--strict"])),
            args(&["chipq", "report", "-v", "--strict"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_are_untouched() {
        for argv in [
            args(&["chipq", "tui"]),
            args(&["chipq", "--help"]),
            args(&["chipq", "simulate", "-n", "3"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }
}
