//! IgG background subtraction.

use crate::domain::{CtValues, ExperimentConfig, IgGDifferential, REFERENCE_ANTIBODY};
use crate::error::QuantError;

use super::ensure_finite;

/// Compute `IgG Ct - target Ct` for every sample and target (including `input`).
///
/// The `IgG` entry itself is always `0`. Lower target Ct (more material)
/// gives a larger differential.
pub fn igg_differential(
    ct: &CtValues,
    config: &ExperimentConfig,
) -> Result<IgGDifferential, QuantError> {
    let mut out = IgGDifferential::with_capacity(config.samples.len());

    for sample in &config.samples {
        let reference = ct
            .get(sample)
            .and_then(|values| values.get(REFERENCE_ANTIBODY).map(|igg| (values, igg)));
        let Some((values, igg)) = reference else {
            return Err(QuantError::MissingReferenceAntibody {
                sample: sample.clone(),
            });
        };
        let diff = values.map_values(|target_ct| igg - target_ct);
        out.insert(sample.clone(), ensure_finite(sample, diff)?);
    }

    Ok(out)
}
