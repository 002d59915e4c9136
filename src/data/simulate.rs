//! Synthetic plate exports for demos and end-to-end checks.
//!
//! Each series file follows the configured positional layout exactly, so the
//! output of `chipq simulate` can be fed straight back into `chipq report`.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ExperimentConfig, INPUT_TARGET, REFERENCE_ANTIBODY};
use crate::error::AppError;

/// Background Ct for the IgG pull-down.
const IGG_CT: f64 = 31.0;
/// Input chromatin comes up early.
const INPUT_CT: f64 = 23.0;
/// Ct for the first non-IgG antibody; later ones are progressively weaker.
const ANTIBODY_CT: f64 = 25.0;
const ANTIBODY_STEP: f64 = 1.5;
/// No-template and similar controls barely amplify.
const CONTROL_CT: f64 = 36.5;
/// Per-series drift of enriched targets (a time course, for example).
const SERIES_DRIFT: f64 = 0.4;

#[derive(Debug, Clone, Copy)]
pub struct SimulationSpec {
    pub series: usize,
    pub seed: u64,
    /// Standard deviation of replicate noise, in cycles.
    pub noise: f64,
}

/// Render one series file as CSV text.
pub fn simulate_series(
    config: &ExperimentConfig,
    index: usize,
    spec: &SimulationSpec,
) -> Result<String, AppError> {
    check_noise(spec.noise)?;
    let noise = Normal::new(0.0, spec.noise)
        .map_err(|e| AppError::new(2, format!("Invalid noise level {}: {e}", spec.noise)))?;
    let mut rng = StdRng::seed_from_u64(spec.seed.wrapping_add(index as u64));

    let mut out = String::new();
    for k in 1..config.header_row {
        if k == 1 {
            out.push_str(&format!("# chipq simulate seed={} series={index}\n", spec.seed));
        } else {
            out.push_str("#\n");
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut well = 0usize;
    let mut push = |writer: &mut csv::Writer<Vec<u8>>, sample: &str, target: &str, ct: f64| {
        let record = [well_name(well), sample.to_string(), target.to_string(), format!("{ct:.3}")];
        well += 1;
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to render simulated row: {e}")))
    };

    writer
        .write_record(["Well", "Sample", "Target", "Ct"])
        .map_err(|e| AppError::new(4, format!("Failed to render simulated header: {e}")))?;

    let drift = SERIES_DRIFT * index as f64;
    for sample in &config.samples {
        let sample_shift: f64 = rng.gen_range(-1.0..1.0);
        for (k, antibody) in config.antibodies.iter().enumerate() {
            let base = if antibody == REFERENCE_ANTIBODY {
                IGG_CT
            } else {
                ANTIBODY_CT + ANTIBODY_STEP * k as f64 - drift
            };
            for _ in 0..config.num_replicates {
                push(&mut writer, sample, antibody, base + sample_shift + noise.sample(&mut rng))?;
            }
        }
        for _ in 0..config.num_replicates {
            push(&mut writer, sample, INPUT_TARGET, INPUT_CT + noise.sample(&mut rng))?;
        }
    }
    for control in &config.controls {
        for _ in 0..config.num_replicates {
            push(&mut writer, control, control, CONTROL_CT + noise.sample(&mut rng))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::new(4, format!("Failed to render simulated series: {e}")))?;
    out.push_str(&String::from_utf8_lossy(&bytes));
    Ok(out)
}

/// Write `spec.series` files into `out_dir`, returning their paths.
pub fn write_simulated(
    out_dir: &Path,
    config: &ExperimentConfig,
    spec: &SimulationSpec,
) -> Result<Vec<PathBuf>, AppError> {
    if spec.series == 0 {
        return Err(AppError::new(2, "Series count must be > 0."));
    }
    check_noise(spec.noise)?;
    config.validate()?;
    create_dir_all(out_dir)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", out_dir.display())))?;

    let width = spec.series.to_string().len().max(2);
    let mut paths = Vec::with_capacity(spec.series);
    for index in 0..spec.series {
        let text = simulate_series(config, index, spec)?;
        let path = out_dir.join(format!("series_{:0width$}.csv", index + 1));
        let mut file = File::create(&path)
            .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
        file.write_all(text.as_bytes())
            .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
        log::info!("wrote simulated series {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}

/// `Normal::new` accepts a negative deviation, so the range is checked here.
fn check_noise(noise: f64) -> Result<(), AppError> {
    if noise.is_finite() && noise >= 0.0 {
        Ok(())
    } else {
        Err(AppError::new(2, format!("Invalid noise level {noise}: must be a finite value >= 0.")))
    }
}

/// 96-well plate naming: A1..H12, wrapping.
fn well_name(i: usize) -> String {
    let row = (b'A' + ((i / 12) % 8) as u8) as char;
    format!("{row}{}", i % 12 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_from_dir;

    fn config() -> ExperimentConfig {
        let mut config =
            ExperimentConfig::new(&["WT", "KO"], &["IgG", "H3K4me3", "H3K27ac"], &["NTC"], 3, 2.0);
        config.header_row = 3;
        config
    }

    fn spec() -> SimulationSpec {
        SimulationSpec {
            series: 3,
            seed: 7,
            noise: 0.1,
        }
    }

    #[test]
    fn same_seed_same_plate() {
        let a = simulate_series(&config(), 1, &spec()).unwrap();
        let b = simulate_series(&config(), 1, &spec()).unwrap();
        let c = simulate_series(&config(), 2, &spec()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn layout_matches_config() {
        let config = config();
        let text = simulate_series(&config, 0, &spec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("# chipq simulate"));
        assert_eq!(lines[1], "#");
        assert_eq!(lines[2], "Well,Sample,Target,Ct");
        assert_eq!(lines.len(), 3 + config.expected_row_count());
        assert!(lines[3].starts_with("A1,WT,IgG,"));
        assert!(lines[12].starts_with("A10,WT,input,"));
        assert!(lines.last().unwrap().starts_with("C3,NTC,NTC,"));
    }

    #[test]
    fn simulated_series_quantify_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_simulated(dir.path(), &config(), &spec()).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("series_01.csv"));

        let run = run_from_dir(&config(), dir.path()).unwrap();
        assert!(run.failures.is_empty(), "{:?}", run.failures);
        assert_eq!(run.series.len(), 3);
        for quant in run.series.values() {
            let input = quant.ratios.value("WT", "input").unwrap();
            assert!((input - 0.02).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let zero = SimulationSpec { series: 0, ..spec() };
        assert_eq!(write_simulated(dir.path(), &config(), &zero).unwrap_err().exit_code(), 2);
        let noisy = SimulationSpec { noise: -1.0, ..spec() };
        assert_eq!(simulate_series(&config(), 0, &noisy).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn negative_or_nan_noise_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plates");
        for noise in [-0.5, f64::NAN, f64::INFINITY] {
            let bad = SimulationSpec { noise, ..spec() };
            assert_eq!(write_simulated(&out, &config(), &bad).unwrap_err().exit_code(), 2);
        }
        assert!(!out.exists());

        let flat = SimulationSpec { noise: 0.0, ..spec() };
        assert!(simulate_series(&config(), 0, &flat).is_ok());
    }
}
