//! Quantification pipeline for a single series.
//!
//! rows -> replicate averaging -> IgG background subtraction -> percent input
//!
//! Every stage is a pure function of its inputs; series never share state.

pub mod average;
pub mod normalize;
pub mod ratio;

pub use average::*;
pub use normalize::*;
pub use ratio::*;

use crate::domain::{
    CtValues, ExperimentConfig, FinalRatios, IgGDifferential, RawRow, TargetValues,
};
use crate::error::{QuantError, SeriesError, Stage};

/// All stage outputs for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuant {
    pub ct: CtValues,
    pub diff: IgGDifferential,
    pub ratios: FinalRatios,
}

/// Reject a stage output holding an infinite or NaN value.
pub(crate) fn ensure_finite(
    sample: &str,
    values: TargetValues,
) -> Result<TargetValues, QuantError> {
    let non_finite = values
        .iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(target, value)| (target.to_string(), value));
    match non_finite {
        Some((target, value)) => Err(QuantError::NonFiniteValue {
            sample: sample.to_string(),
            target,
            value,
        }),
        None => Ok(values),
    }
}

/// Run every stage for one series, tagging failures with the series and stage.
pub fn quantify_series(
    series: &str,
    rows: &[RawRow],
    config: &ExperimentConfig,
) -> Result<SeriesQuant, SeriesError> {
    let ct = average_ct(rows, config)
        .map_err(|e| SeriesError::new(series, Stage::Averaging, e))?;
    let diff = igg_differential(&ct, config)
        .map_err(|e| SeriesError::new(series, Stage::Normalization, e))?;
    let ratios = final_ratio(&diff, config)
        .map_err(|e| SeriesError::new(series, Stage::Ratio, e))?;
    Ok(SeriesQuant { ct, diff, ratios })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cts: &[f64]) -> Vec<RawRow> {
        cts.iter()
            .enumerate()
            .map(|(i, ct)| RawRow::new(i + 2, ct.to_string()))
            .collect()
    }

    fn config() -> ExperimentConfig {
        ExperimentConfig::new(&["A", "B"], &["IgG", "H3"], &["c1"], 2, 2.0)
    }

    fn plate() -> Vec<RawRow> {
        rows(&[
            30.0, 30.5, // A IgG
            24.0, 24.5, // A H3
            22.0, 22.25, // A input
            31.0, 31.0, // B IgG
            27.0, 27.5, // B H3
            23.0, 23.5, // B input
            36.0, 36.0, // control
        ])
    }

    #[test]
    fn full_pipeline_on_small_plate() {
        let quant = quantify_series("plate1", &plate(), &config()).unwrap();

        assert_eq!(quant.ct.value("A", "IgG"), Some(30.25));
        assert_eq!(quant.diff.value("A", "IgG"), Some(0.0));
        assert_eq!(quant.diff.value("A", "H3"), Some(6.0));

        for sample in ["A", "B"] {
            let input = quant.ratios.value(sample, "input").unwrap();
            assert!((input - 0.02).abs() < 1e-15);
        }
        // A: H3 diff 6, input diff 8.125 -> 2^(6 - 8.125) * 2 / 100
        let expected = (-2.125_f64).exp2() / 50.0;
        assert!((quant.ratios.value("A", "H3").unwrap() - expected).abs() < 1e-15);
    }

    #[test]
    fn lower_ct_means_higher_ratio() {
        let quant = quantify_series("plate1", &plate(), &config()).unwrap();
        for sample in ["A", "B"] {
            let ct_h3 = quant.ct.value(sample, "H3").unwrap();
            let ct_igg = quant.ct.value(sample, "IgG").unwrap();
            assert!(ct_h3 < ct_igg);
            let h3 = quant.ratios.value(sample, "H3").unwrap();
            assert!(h3 > quant.ratios.value(sample, "IgG").unwrap());
        }
    }

    #[test]
    fn every_stage_keeps_the_same_keys() {
        let quant = quantify_series("plate1", &plate(), &config()).unwrap();
        for table in [&quant.ct, &quant.diff, &quant.ratios] {
            let samples: Vec<&str> = table.samples().collect();
            assert_eq!(samples, ["A", "B"]);
            for (_, values) in table.iter() {
                let targets: Vec<&str> = values.targets().collect();
                assert_eq!(targets, ["IgG", "H3", "input"]);
            }
        }
    }

    #[test]
    fn rerun_is_bit_identical() {
        let a = quantify_series("plate1", &plate(), &config()).unwrap();
        let b = quantify_series("plate1", &plate(), &config()).unwrap();
        for (sample, values) in a.ratios.iter() {
            for (target, v) in values.iter() {
                let w = b.ratios.value(sample, target).unwrap();
                assert_eq!(v.to_bits(), w.to_bits());
            }
        }
    }

    #[test]
    fn truncated_series_fails_in_averaging() {
        let mut rows = plate();
        rows.pop();
        let err = quantify_series("plate1", &rows, &config()).unwrap_err();
        assert_eq!(err.series, "plate1");
        assert_eq!(err.stage, Stage::Averaging);
        assert_eq!(
            err.source,
            QuantError::InsufficientRows {
                required: 14,
                available: 13
            }
        );
    }

    #[test]
    fn missing_igg_fails_in_normalization() {
        let config = ExperimentConfig::new(&["A", "B"], &["H3K4", "H3"], &["c1"], 2, 2.0);
        let err = quantify_series("plate1", &plate(), &config).unwrap_err();
        assert_eq!(err.stage, Stage::Normalization);
        assert!(matches!(err.source, QuantError::MissingReferenceAntibody { .. }));
    }

    #[test]
    fn overflowing_replicates_fail_in_averaging() {
        let mut rows = plate();
        rows[0] = RawRow::new(2, "1e308");
        rows[1] = RawRow::new(3, "1e308");
        let err = quantify_series("plate1", &rows, &config()).unwrap_err();
        assert_eq!(err.stage, Stage::Averaging);
        assert!(matches!(
            err.source,
            QuantError::NonFiniteValue { ref sample, ref target, .. }
                if sample == "A" && target == "IgG"
        ));
    }

    #[test]
    fn extreme_but_finite_differential_fails_in_ratio() {
        // Every Ct is finite, but H3 sits 2100 cycles above input and 2^2100 overflows.
        let rows = rows(&[
            1500.0, 1500.0, // A IgG
            -600.0, -600.0, // A H3
            1500.0, 1500.0, // A input
            31.0, 31.0, // B IgG
            27.0, 27.5, // B H3
            23.0, 23.5, // B input
            36.0, 36.0, // control
        ]);
        let err = quantify_series("plate1", &rows, &config()).unwrap_err();
        assert_eq!(err.stage, Stage::Ratio);
        assert!(matches!(
            err.source,
            QuantError::NonFiniteValue { ref target, .. } if target == "H3"
        ));
    }

    #[test]
    fn bad_input_volume_fails_in_ratio() {
        let mut config = config();
        config.input_volume = 0.0;
        let err = quantify_series("plate1", &plate(), &config).unwrap_err();
        assert_eq!(err.stage, Stage::Ratio);
    }
}
