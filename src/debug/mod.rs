//! Debug bundle writer for inspecting every stage of a run.
//!
//! The bundle is a single markdown file with, per series, the averaged Ct
//! table, the IgG differential and the final ratios, plus the failures.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{ExperimentConfig, SampleTable};
use crate::error::AppError;

/// Write a bundle into `dir` (created if missing) and return its path.
pub fn write_debug_bundle(
    dir: &Path,
    run: &RunOutput,
    config: &ExperimentConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("chipq_debug_{ts}.md"));
    let file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;

    let mut out = BufWriter::new(file);
    write_bundle(&mut out, run, config)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    log::info!("wrote debug bundle to {}", path.display());
    Ok(path)
}

fn write_bundle<W: Write>(
    out: &mut W,
    run: &RunOutput,
    config: &ExperimentConfig,
) -> std::io::Result<()> {
    writeln!(out, "# chipq debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- samples: {}", config.samples.join(", "))?;
    writeln!(out, "- antibodies: {}", config.antibodies.join(", "))?;
    writeln!(out, "- controls: {}", config.controls.join(", "))?;
    writeln!(
        out,
        "- replicates: {}, header_row: {}, input_volume: {}%",
        config.num_replicates, config.header_row, config.input_volume
    )?;
    writeln!(
        out,
        "- rows per series: {} ({} averaged)",
        config.expected_row_count(),
        config.consumed_row_count()
    )?;
    writeln!(out, "- series: {} quantified, {} failed", run.series.len(), run.failures.len())?;

    for (name, quant) in &run.series {
        writeln!(out, "\n## Series: {name}")?;
        write_table(out, "Mean Ct", &quant.ct, 4)?;
        write_table(out, "IgG differential (cycles)", &quant.diff, 4)?;
        write_table(out, "Percent input", &quant.ratios, 6)?;
    }

    if !run.failures.is_empty() {
        writeln!(out, "\n## Failures")?;
        for f in &run.failures {
            writeln!(out, "- `{}` [{}]: {}", f.series, f.stage, f.source)?;
        }
    }
    Ok(())
}

fn write_table<W: Write>(
    out: &mut W,
    title: &str,
    table: &SampleTable,
    decimals: usize,
) -> std::io::Result<()> {
    writeln!(out, "\n### {title}")?;

    let targets: Vec<&str> = table
        .iter()
        .next()
        .map(|(_, values)| values.targets().collect())
        .unwrap_or_default();

    writeln!(out, "| sample | {} |", targets.join(" | "))?;
    writeln!(out, "| -{} |", " | -".repeat(targets.len()))?;
    for (sample, values) in table.iter() {
        let cells: Vec<String> = targets
            .iter()
            .map(|t| match values.get(t) {
                Some(v) if v.is_finite() => format!("{v:.decimals$}"),
                _ => "-".to_string(),
            })
            .collect();
        writeln!(out, "| {sample} | {} |", cells.join(" | "))?;
    }
    Ok(())
}
