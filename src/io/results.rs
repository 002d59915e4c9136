//! Read/write results JSON files.
//!
//! A results file is the portable form of a run: the layout it was computed
//! with plus the final ratios of every quantified series. `chipq plot` reads
//! it back to re-render tables and charts without touching the series data.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::{ExperimentConfig, SeriesResults};
use crate::error::AppError;

/// On-disk schema of `--export-json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated: DateTime<Local>,
    pub samples: Vec<String>,
    pub antibodies: Vec<String>,
    pub input_volume: f64,
    pub series: SeriesResults,
}

impl ResultsFile {
    pub fn new(results: SeriesResults, config: &ExperimentConfig) -> Self {
        Self {
            tool: "chipq".to_string(),
            generated: Local::now(),
            samples: config.samples.clone(),
            antibodies: config.antibodies.clone(),
            input_volume: config.input_volume,
            series: results,
        }
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, file: &ResultsFile) -> Result<(), AppError> {
    let out = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create results JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(out), file)
        .map_err(|e| AppError::new(4, format!("Failed to write results JSON: {e}")))?;
    log::info!("wrote results JSON to {}", path.display());
    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display()))
    })?;
    let results: ResultsFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FinalRatios, TargetValues};

    #[test]
    fn results_file_survives_disk() {
        let config = ExperimentConfig::new(&["B", "A"], &["IgG", "H3"], &[], 2, 2.0);
        let mut tv = TargetValues::new();
        tv.insert("IgG", 0.001);
        tv.insert("H3", 0.5);
        tv.insert("input", 0.02);
        let mut ratios = FinalRatios::new();
        ratios.insert("B", tv);
        let mut results = SeriesResults::new();
        results.insert("day1".to_string(), ratios);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let original = ResultsFile::new(results, &config);
        write_results_json(&path, &original).unwrap();

        let loaded = read_results_json(&path).unwrap();
        assert_eq!(loaded.tool, "chipq");
        assert_eq!(loaded.samples, ["B", "A"]);
        let targets: Vec<&str> = loaded.series["day1"].get("B").unwrap().targets().collect();
        assert_eq!(targets, ["IgG", "H3", "input"]);
        assert_eq!(loaded.series, original.series);
    }

    #[test]
    fn garbage_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_results_json(&path).unwrap_err().exit_code(), 2);
    }
}
