//! Export per-series results to CSV.
//!
//! The export is long format (one row per series/sample/target) so it is easy
//! to pivot in spreadsheets or load in downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::error::AppError;

const HEADER: [&str; 6] = ["series", "sample", "target", "ct", "igg_diff", "percent_input"];

/// Write every quantified series to a CSV file.
pub fn write_results_csv(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    write_results_csv_to(file, run)?;
    log::info!("wrote results CSV to {}", path.display());
    Ok(())
}

/// Same as [`write_results_csv`], into any writer.
pub fn write_results_csv_to<W: Write>(writer: W, run: &RunOutput) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for (series, quant) in &run.series {
        for (sample, ratios) in quant.ratios.iter() {
            for (target, ratio) in ratios.iter() {
                let record = [
                    series.clone(),
                    sample.to_string(),
                    target.to_string(),
                    fmt_opt(quant.ct.value(sample, target), 4),
                    fmt_opt(quant.diff.value(sample, target), 4),
                    format!("{ratio:.10}"),
                ];
                out.write_record(&record)
                    .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
            }
        }
    }

    out.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}
