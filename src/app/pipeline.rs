//! Shared quantification pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! discover series -> read rows -> average -> subtract IgG -> percent input
//!
//! Series are independent, so they are processed in parallel; each one owns
//! its rows and its outputs. The CLI and the TUI can then focus on
//! presentation (printing vs widgets).

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;

use crate::domain::{ExperimentConfig, SeriesResults, SeriesRows};
use crate::error::{AppError, SeriesError, Stage};
use crate::io::discover::{SeriesSource, discover_series};
use crate::io::ingest::read_series;
use crate::quant::{SeriesQuant, quantify_series};

/// All computed outputs of a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Successfully quantified series, by name.
    pub series: BTreeMap<String, SeriesQuant>,
    /// Failed series, ordered by name.
    pub failures: Vec<SeriesError>,
}

impl RunOutput {
    /// Final ratios keyed by series name (the artifact handed to presentation).
    pub fn results(&self) -> SeriesResults {
        self.series
            .iter()
            .map(|(name, quant)| (name.clone(), quant.ratios.clone()))
            .collect()
    }

    /// Apply the failure policy.
    ///
    /// - `strict`: any failed series fails the run
    /// - otherwise: fail only when nothing could be quantified
    pub fn check(&self, strict: bool) -> Result<(), AppError> {
        if strict {
            if let Some(first) = self.failures.first() {
                return Err(first.clone().into());
            }
        }
        if self.series.is_empty() {
            let detail = self
                .failures
                .iter()
                .map(|f| format!("  {f}"))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(AppError::new(
                3,
                format!("No series could be quantified:\n{detail}"),
            ));
        }
        Ok(())
    }

    fn from_outcomes(outcomes: Vec<(String, Result<SeriesQuant, SeriesError>)>) -> Self {
        let mut out = RunOutput::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(quant) => {
                    log::info!("quantified series `{name}`");
                    out.series.insert(name, quant);
                }
                Err(err) => {
                    log::warn!("{err}");
                    out.failures.push(err);
                }
            }
        }
        out.failures.sort_by(|a, b| a.series.cmp(&b.series));
        out
    }
}

/// Discover every series in `data_dir` and quantify them.
pub fn run_from_dir(config: &ExperimentConfig, data_dir: &Path) -> Result<RunOutput, AppError> {
    config.validate()?;
    let sources = discover_series(data_dir)?;
    Ok(run_pipeline(config, &sources))
}

/// Read and quantify each series file.
pub fn run_pipeline(config: &ExperimentConfig, sources: &[SeriesSource]) -> RunOutput {
    let outcomes = sources
        .par_iter()
        .map(|source| (source.name.clone(), process_source(source, config)))
        .collect();
    RunOutput::from_outcomes(outcomes)
}

/// Quantify series whose rows are already in memory.
pub fn quantify_rows(config: &ExperimentConfig, rows: &BTreeMap<String, SeriesRows>) -> RunOutput {
    let outcomes = rows
        .par_iter()
        .map(|(name, rows)| (name.clone(), quantify_series(name, rows, config)))
        .collect();
    RunOutput::from_outcomes(outcomes)
}

fn process_source(
    source: &SeriesSource,
    config: &ExperimentConfig,
) -> Result<SeriesQuant, SeriesError> {
    let rows = read_series(&source.path, config)
        .map_err(|e| SeriesError::new(&source.name, Stage::Ingest, e))?;
    quantify_series(&source.name, &rows, config)
}
