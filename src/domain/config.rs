//! Experiment configuration (`config.yaml`).
//!
//! The order of `samples` and `antibodies` is significant: it fixes the
//! positional row layout of every series file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{INPUT_TARGET, REFERENCE_ANTIBODY};
use crate::error::{AppError, QuantError};

/// Immutable experiment layout + normalization constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub samples: Vec<String>,
    pub antibodies: Vec<String>,
    /// Only the length matters: control rows are counted but never averaged.
    #[serde(default)]
    pub controls: Vec<String>,
    #[serde(default = "default_num_replicates")]
    pub num_replicates: usize,
    /// 1-based line of the column header row.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    /// Dilution factor of the input control (percent of chromatin kept as input).
    pub input_volume: f64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_ct_column")]
    pub ct_column: String,
    /// How many antibodies get a table/chart panel.
    #[serde(default = "default_max_panels")]
    pub max_panels: usize,
}

fn default_num_replicates() -> usize {
    2
}

fn default_header_row() -> usize {
    1
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_ct_column() -> String {
    "Ct".to_string()
}

fn default_max_panels() -> usize {
    6
}

impl ExperimentConfig {
    /// Build a config with tool-level defaults for everything but the layout.
    pub fn new(
        samples: &[&str],
        antibodies: &[&str],
        controls: &[&str],
        num_replicates: usize,
        input_volume: f64,
    ) -> Self {
        Self {
            samples: samples.iter().map(|s| s.to_string()).collect(),
            antibodies: antibodies.iter().map(|s| s.to_string()).collect(),
            controls: controls.iter().map(|s| s.to_string()).collect(),
            num_replicates,
            header_row: default_header_row(),
            input_volume,
            data_dir: default_data_dir(),
            ct_column: default_ct_column(),
            max_panels: default_max_panels(),
        }
    }

    /// Parse and validate a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read config '{}': {e}", path.display()))
        })?;
        let config = Self::from_yaml(&text)
            .map_err(|e| AppError::new(2, format!("{} ({})", e, path.display())))?;
        log::info!(
            "loaded config '{}': {} samples, {} antibodies, {} rows per series",
            path.display(),
            config.samples.len(),
            config.antibodies.len(),
            config.expected_row_count()
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| AppError::new(2, format!("Invalid config YAML: {e}")))?;
        config.validate()?;
        if !config.has_reference_antibody() {
            log::warn!(
                "antibodies {:?} do not include `{REFERENCE_ANTIBODY}`; every series will fail normalization",
                config.antibodies
            );
        }
        Ok(config)
    }

    /// Number of rows a series file must contain after the header.
    ///
    /// `num_replicates * (samples * (antibodies + 1) + controls)`; the `+ 1` is
    /// the input control of each sample.
    pub fn expected_row_count(&self) -> usize {
        let points = self.samples.len() * (self.antibodies.len() + 1) + self.controls.len();
        points * self.num_replicates
    }

    /// Rows actually consumed by averaging (the trailing control block is not).
    pub fn consumed_row_count(&self) -> usize {
        self.samples.len() * (self.antibodies.len() + 1) * self.num_replicates
    }

    pub fn has_reference_antibody(&self) -> bool {
        self.antibodies.iter().any(|a| a == REFERENCE_ANTIBODY)
    }

    /// Antibodies that get a presentation panel.
    pub fn panel_antibodies(&self) -> &[String] {
        let n = self.max_panels.min(self.antibodies.len());
        &self.antibodies[..n]
    }

    pub fn validate(&self) -> Result<(), QuantError> {
        if !(self.input_volume.is_finite() && self.input_volume > 0.0) {
            return Err(QuantError::InvalidConfiguration(format!(
                "input_volume must be a positive number (got {})",
                self.input_volume
            )));
        }
        if self.num_replicates == 0 {
            return Err(QuantError::InvalidConfiguration(
                "num_replicates must be at least 1".to_string(),
            ));
        }
        if self.header_row == 0 {
            return Err(QuantError::InvalidConfiguration(
                "header_row is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.samples.is_empty() {
            return Err(QuantError::InvalidConfiguration("samples is empty".to_string()));
        }
        if self.antibodies.is_empty() {
            return Err(QuantError::InvalidConfiguration("antibodies is empty".to_string()));
        }
        if let Some(dup) = first_duplicate(&self.samples) {
            return Err(QuantError::InvalidConfiguration(format!("duplicate sample `{dup}`")));
        }
        if let Some(dup) = first_duplicate(&self.antibodies) {
            return Err(QuantError::InvalidConfiguration(format!("duplicate antibody `{dup}`")));
        }
        if self.antibodies.iter().any(|a| a == INPUT_TARGET) {
            return Err(QuantError::InvalidConfiguration(format!(
                "`{INPUT_TARGET}` is reserved for the input control and cannot be an antibody"
            )));
        }
        Ok(())
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names.iter().find(|n| !seen.insert(n.as_str())).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> ExperimentConfig {
        ExperimentConfig::new(&["A", "B"], &["IgG", "H3"], &["c1"], 2, 2.0)
    }

    #[test]
    fn expected_row_count_matches_layout_formula() {
        assert_eq!(two_by_two().expected_row_count(), 14);
        assert_eq!(two_by_two().consumed_row_count(), 12);
    }

    #[test]
    fn yaml_defaults_are_applied() {
        let config = ExperimentConfig::from_yaml(
            "samples: [A, B]\nantibodies: [IgG, H3K4me3]\ninput_volume: 1\n",
        )
        .unwrap();
        assert_eq!(config.num_replicates, 2);
        assert_eq!(config.header_row, 1);
        assert!(config.controls.is_empty());
        assert_eq!(config.ct_column, "Ct");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.expected_row_count(), 12);
    }

    #[test]
    fn yaml_with_full_layout() {
        let yaml = "\
samples:
  - WT
  - KO
antibodies:
  - IgG
  - H3
  - H3K27ac
controls: [NTC, gDNA]
num_replicates: 3
header_row: 8
input_volume: 2.5
";
        let config = ExperimentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.samples, ["WT", "KO"]);
        assert_eq!(config.header_row, 8);
        assert_eq!(config.expected_row_count(), 3 * (2 * 4 + 2));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = two_by_two();
        config.input_volume = 0.0;
        assert!(matches!(config.validate(), Err(QuantError::InvalidConfiguration(_))));

        let mut config = two_by_two();
        config.num_replicates = 0;
        assert!(matches!(config.validate(), Err(QuantError::InvalidConfiguration(_))));

        let mut config = two_by_two();
        config.samples.clear();
        assert!(matches!(config.validate(), Err(QuantError::InvalidConfiguration(_))));

        let mut config = two_by_two();
        config.antibodies.push("input".to_string());
        assert!(matches!(config.validate(), Err(QuantError::InvalidConfiguration(_))));

        let mut config = two_by_two();
        config.antibodies.push("H3".to_string());
        assert!(matches!(config.validate(), Err(QuantError::InvalidConfiguration(_))));
    }

    #[test]
    fn missing_igg_is_not_a_configuration_error() {
        let config = ExperimentConfig::new(&["A"], &["H3"], &[], 2, 1.0);
        assert!(config.validate().is_ok());
        assert!(!config.has_reference_antibody());
    }

    #[test]
    fn panel_antibodies_are_capped() {
        let mut config = ExperimentConfig::new(
            &["A"],
            &["IgG", "a", "b", "c", "d", "e", "f", "g"],
            &[],
            2,
            1.0,
        );
        assert_eq!(config.panel_antibodies().len(), 6);
        config.max_panels = 2;
        assert_eq!(config.panel_antibodies(), ["IgG", "a"]);
    }

    #[test]
    fn bad_yaml_is_an_input_error() {
        let err = ExperimentConfig::from_yaml("samples: [A\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = ExperimentConfig::from_yaml("samples: [A]\nantibodies: [IgG]\ninput_volume: -1\n")
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
