//! Percent-input normalization.
//!
//! ```text
//! ratio(t) = 2^diff(t) / ((100 / input_volume) * 2^diff(input))
//!          = 2^(diff(t) - diff(input)) * input_volume / 100
//! ```
//!
//! Differentials are log2 cycle counts, so `2^x` turns them into linear fold
//! enrichment; `100 / input_volume` undoes the input dilution. The second form
//! is the one computed; `input` always comes out as exactly `input_volume / 100`.
//! A result that still overflows fails with `NonFiniteValue`.

use crate::domain::{ExperimentConfig, FinalRatios, IgGDifferential, INPUT_TARGET};
use crate::error::QuantError;

use super::ensure_finite;

pub fn final_ratio(
    diff: &IgGDifferential,
    config: &ExperimentConfig,
) -> Result<FinalRatios, QuantError> {
    if !(config.input_volume.is_finite() && config.input_volume > 0.0) {
        return Err(QuantError::InvalidConfiguration(format!(
            "input_volume must be a positive number (got {})",
            config.input_volume
        )));
    }
    let scale = config.input_volume / 100.0;

    let mut out = FinalRatios::with_capacity(config.samples.len());
    for sample in &config.samples {
        let Some(values) = diff.get(sample) else {
            return Err(QuantError::InvalidConfiguration(format!(
                "no differentials for sample `{sample}`"
            )));
        };
        let Some(input) = values.get(INPUT_TARGET) else {
            return Err(QuantError::InvalidConfiguration(format!(
                "sample `{sample}` has no `{INPUT_TARGET}` differential"
            )));
        };
        let ratios = values.map_values(|d| (d - input).exp2() * scale);
        out.insert(sample.clone(), ensure_finite(sample, ratios)?);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetValues;

    fn diff_for(sample_values: &[(&str, f64, f64, f64)]) -> IgGDifferential {
        let mut diff = IgGDifferential::new();
        for (sample, igg, h3, input) in sample_values {
            let mut tv = TargetValues::new();
            tv.insert("IgG", *igg);
            tv.insert("H3", *h3);
            tv.insert("input", *input);
            diff.insert(*sample, tv);
        }
        diff
    }

    #[test]
    fn input_ratio_is_the_same_for_every_sample() {
        let config = ExperimentConfig::new(&["A", "B"], &["IgG", "H3"], &[], 2, 2.0);
        let diff = diff_for(&[("A", 0.0, 8.25, 5.75), ("B", 0.0, -1.5, 12.125)]);
        let ratios = final_ratio(&diff, &config).unwrap();
        for sample in ["A", "B"] {
            let r = ratios.value(sample, "input").unwrap();
            assert!((r - 0.02).abs() < 1e-15, "{sample}: {r}");
        }
    }

    #[test]
    fn ratio_matches_closed_form() {
        let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, 1.0);
        let diff = diff_for(&[("A", 0.0, 8.0, 5.0)]);
        let ratios = final_ratio(&diff, &config).unwrap();
        // 2^8 / (100 * 2^5) = 0.08 ; IgG: 1 / (100 * 32)
        assert!((ratios.value("A", "H3").unwrap() - 0.08).abs() < 1e-15);
        assert!((ratios.value("A", "IgG").unwrap() - 1.0 / 3200.0).abs() < 1e-15);
    }

    #[test]
    fn larger_differential_gives_larger_ratio() {
        let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, 2.0);
        let diff = diff_for(&[("A", 0.0, 3.0, 4.0)]);
        let ratios = final_ratio(&diff, &config).unwrap();
        assert!(ratios.value("A", "H3").unwrap() > ratios.value("A", "IgG").unwrap());
    }

    #[test]
    fn non_positive_input_volume_is_rejected() {
        let diff = diff_for(&[("A", 0.0, 1.0, 1.0)]);
        for volume in [0.0, -2.0, f64::NAN] {
            let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, volume);
            assert!(matches!(
                final_ratio(&diff, &config),
                Err(QuantError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn large_comparable_differentials_stay_finite() {
        let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, 2.0);
        let diff = diff_for(&[("A", 0.0, 2000.0, 2000.0)]);
        let ratios = final_ratio(&diff, &config).unwrap();
        assert_eq!(ratios.value("A", "input"), Some(0.02));
        assert_eq!(ratios.value("A", "H3"), Some(0.02));
        assert_eq!(ratios.value("A", "IgG"), Some(0.0));
    }

    #[test]
    fn overflowing_ratio_is_rejected() {
        let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, 2.0);
        let diff = diff_for(&[("A", 0.0, 2000.0, 0.0)]);
        assert_eq!(
            final_ratio(&diff, &config),
            Err(QuantError::NonFiniteValue {
                sample: "A".to_string(),
                target: "H3".to_string(),
                value: f64::INFINITY,
            })
        );
    }
}
