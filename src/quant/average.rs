//! Replicate averaging.
//!
//! Rows are consumed strictly by position. For each sample (config order):
//!
//! ```text
//! antibody[0] x num_replicates, antibody[1] x num_replicates, ..., input x num_replicates
//! ```
//!
//! Control rows trail the consumed block and are never read, but they still
//! count towards the required series length.

use crate::domain::{CtValues, ExperimentConfig, INPUT_TARGET, RawRow, TargetValues};
use crate::error::QuantError;

use super::ensure_finite;

/// Average replicate Ct values for every sample and target.
///
/// `rows` may be longer than `config.expected_row_count()`; the excess is ignored.
/// A shorter sequence fails with `InsufficientRows` before anything is parsed.
/// Replicates whose sum overflows fail with `NonFiniteValue`.
pub fn average_ct(rows: &[RawRow], config: &ExperimentConfig) -> Result<CtValues, QuantError> {
    check_layout(config)?;

    let required = config.expected_row_count();
    if rows.len() < required {
        return Err(QuantError::InsufficientRows {
            required,
            available: rows.len(),
        });
    }

    let mut cursor = RowCursor::new(rows, required);
    let mut out = CtValues::with_capacity(config.samples.len());

    for sample in &config.samples {
        let mut values = TargetValues::with_capacity(config.antibodies.len() + 1);
        for antibody in &config.antibodies {
            let mean = cursor.pull_mean(config.num_replicates)?;
            log::debug!("{sample}/{antibody}: mean Ct {mean:.4}");
            values.insert(antibody.clone(), mean);
        }
        let mean = cursor.pull_mean(config.num_replicates)?;
        log::debug!("{sample}/{INPUT_TARGET}: mean Ct {mean:.4}");
        values.insert(INPUT_TARGET, mean);
        out.insert(sample.clone(), ensure_finite(sample, values)?);
    }

    Ok(out)
}

fn check_layout(config: &ExperimentConfig) -> Result<(), QuantError> {
    if config.num_replicates == 0 {
        return Err(QuantError::InvalidConfiguration(
            "num_replicates must be at least 1".to_string(),
        ));
    }
    if config.samples.is_empty() || config.antibodies.is_empty() {
        return Err(QuantError::InvalidConfiguration(
            "samples and antibodies must both be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Forward-only pull over a materialized row sequence.
struct RowCursor<'a> {
    rows: &'a [RawRow],
    next: usize,
    required: usize,
}

impl<'a> RowCursor<'a> {
    fn new(rows: &'a [RawRow], required: usize) -> Self {
        Self {
            rows,
            next: 0,
            required,
        }
    }

    /// Consume the next `n` rows and return the arithmetic mean of their Ct.
    fn pull_mean(&mut self, n: usize) -> Result<f64, QuantError> {
        let end = self.next + n;
        let Some(chunk) = self.rows.get(self.next..end) else {
            return Err(QuantError::InsufficientRows {
                required: self.required,
                available: self.rows.len(),
            });
        };

        let mut sum = 0.0;
        for row in chunk {
            sum += row.ct_value()?;
        }
        self.next = end;
        Ok(sum / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cts: &[&str]) -> Vec<RawRow> {
        cts.iter()
            .enumerate()
            .map(|(i, ct)| RawRow::new(i + 2, *ct))
            .collect()
    }

    fn config() -> ExperimentConfig {
        ExperimentConfig::new(&["A", "B"], &["IgG", "H3"], &["c1"], 2, 2.0)
    }

    #[test]
    fn replicate_pairs_average_exactly() {
        let rows = rows(&[
            "10", "12", // A IgG
            "20", "21", // A H3
            "25", "25.5", // A input
            "11", "11", // B IgG
            "30", "31", // B H3
            "24", "26", // B input
            "35", "35", // control, unread
        ]);
        let ct = average_ct(&rows, &config()).unwrap();

        assert_eq!(ct.value("A", "IgG"), Some(11.0));
        assert_eq!(ct.value("A", "H3"), Some(20.5));
        assert_eq!(ct.value("A", "input"), Some(25.25));
        assert_eq!(ct.value("B", "IgG"), Some(11.0));
        assert_eq!(ct.value("B", "H3"), Some(30.5));
        assert_eq!(ct.value("B", "input"), Some(25.0));
    }

    #[test]
    fn output_follows_config_order() {
        let rows = rows(&["1"; 14]);
        let ct = average_ct(&rows, &config()).unwrap();
        let samples: Vec<&str> = ct.samples().collect();
        assert_eq!(samples, ["A", "B"]);
        let targets: Vec<&str> = ct.get("B").unwrap().targets().collect();
        assert_eq!(targets, ["IgG", "H3", "input"]);
    }

    #[test]
    fn one_row_short_is_insufficient() {
        let rows = rows(&["20"; 13]);
        let err = average_ct(&rows, &config()).unwrap_err();
        assert_eq!(
            err,
            QuantError::InsufficientRows {
                required: 14,
                available: 13
            }
        );
    }

    #[test]
    fn excess_rows_are_ignored() {
        let mut cts = vec!["20"; 14];
        cts.extend(["garbage", "more garbage"]);
        let ct = average_ct(&rows(&cts), &config()).unwrap();
        assert_eq!(ct.value("B", "input"), Some(20.0));
    }

    #[test]
    fn malformed_ct_reports_its_line() {
        let mut cts = vec!["20"; 14];
        cts[3] = "Undetermined";
        let err = average_ct(&rows(&cts), &config()).unwrap_err();
        assert_eq!(
            err,
            QuantError::MalformedRow {
                line: 5,
                value: Some("Undetermined".to_string())
            }
        );
    }

    #[test]
    fn malformed_control_rows_are_never_read() {
        let mut cts = vec!["20"; 14];
        cts[12] = "";
        cts[13] = "n/a";
        assert!(average_ct(&rows(&cts), &config()).is_ok());
    }

    #[test]
    fn three_replicates_are_pulled_together() {
        let config = ExperimentConfig::new(&["A"], &["IgG"], &[], 3, 1.0);
        let ct = average_ct(&rows(&["9", "10", "11", "20", "21", "22"]), &config).unwrap();
        assert_eq!(ct.value("A", "IgG"), Some(10.0));
        assert_eq!(ct.value("A", "input"), Some(21.0));
    }

    #[test]
    fn zero_replicates_is_invalid() {
        let mut config = config();
        config.num_replicates = 0;
        assert!(matches!(
            average_ct(&[], &config),
            Err(QuantError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn overflowing_sum_is_not_a_mean() {
        let config = ExperimentConfig::new(&["A"], &["IgG", "H3"], &[], 2, 2.0);
        let rows = rows(&["30", "30", "1.5e308", "1.5e308", "22", "22"]);
        assert_eq!(
            average_ct(&rows, &config),
            Err(QuantError::NonFiniteValue {
                sample: "A".to_string(),
                target: "H3".to_string(),
                value: f64::INFINITY,
            })
        );
    }
}
