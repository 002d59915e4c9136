//! Shared domain types.
//!
//! Every per-series table (`CtValues`, `IgGDifferential`, `FinalRatios`) has the
//! same shape: samples in configuration order, each holding one value per
//! target (antibodies in configuration order, then `input`). Order is kept
//! explicitly so presentation can rely on it.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QuantError;

/// Target name used for the input-control measurement point of each sample.
pub const INPUT_TARGET: &str = "input";

/// Antibody whose Ct is subtracted as non-specific background.
pub const REFERENCE_ANTIBODY: &str = "IgG";

/// One measurement record as supplied by the row source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the series file (for error messages).
    pub line: usize,
    /// Raw Ct text; `None` when the column or cell is missing.
    pub ct: Option<String>,
}

impl RawRow {
    pub fn new(line: usize, ct: impl Into<String>) -> Self {
        Self {
            line,
            ct: Some(ct.into()),
        }
    }

    /// Parse the Ct field as a finite real number.
    pub fn ct_value(&self) -> Result<f64, QuantError> {
        let Some(raw) = self.ct.as_deref() else {
            return Err(QuantError::MalformedRow {
                line: self.line,
                value: None,
            });
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(QuantError::MalformedRow {
                line: self.line,
                value: Some(raw.to_string()),
            }),
        }
    }
}

/// Ordered rows for one series.
pub type SeriesRows = Vec<RawRow>;

/// Values keyed by target name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetValues {
    entries: Vec<(String, f64)>,
}

impl TargetValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    /// Insert or overwrite a value. Overwriting keeps the original position.
    pub fn insert(&mut self, target: impl Into<String>, value: f64) {
        let target = target.into();
        match self.entries.iter_mut().find(|(t, _)| *t == target) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((target, value)),
        }
    }

    pub fn get(&self, target: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.get(target).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(t, v)| (t.as_str(), *v))
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// Apply `f` to every value, keeping keys and order.
    pub fn map_values(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(t, v)| (t.clone(), f(*v)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-sample target tables, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    rows: Vec<(String, TargetValues)>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            rows: Vec::with_capacity(n),
        }
    }

    /// Insert or replace a sample's values. Replacing keeps the original position.
    pub fn insert(&mut self, sample: impl Into<String>, values: TargetValues) {
        let sample = sample.into();
        match self.rows.iter_mut().find(|(s, _)| *s == sample) {
            Some(slot) => slot.1 = values,
            None => self.rows.push((sample, values)),
        }
    }

    pub fn get(&self, sample: &str) -> Option<&TargetValues> {
        self.rows.iter().find(|(s, _)| s == sample).map(|(_, v)| v)
    }

    /// Shorthand for `get(sample)?.get(target)`.
    pub fn value(&self, sample: &str, target: &str) -> Option<f64> {
        self.get(sample)?.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetValues)> + '_ {
        self.rows.iter().map(|(s, v)| (s.as_str(), v))
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Averaged Ct per sample and target.
pub type CtValues = SampleTable;

/// `IgG Ct - target Ct` per sample and target.
pub type IgGDifferential = SampleTable;

/// Percent-input ratio per sample and target.
pub type FinalRatios = SampleTable;

/// Final ratios for every successfully quantified series, keyed by series name.
pub type SeriesResults = BTreeMap<String, FinalRatios>;

impl Serialize for TargetValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (t, v) in &self.entries {
            map.serialize_entry(t, v)?;
        }
        map.end()
    }
}

impl Serialize for SampleTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (s, v) in &self.rows {
            map.serialize_entry(s, v)?;
        }
        map.end()
    }
}

struct TargetValuesVisitor;

impl<'de> Visitor<'de> for TargetValuesVisitor {
    type Value = TargetValues;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of target name to number")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = TargetValues::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((target, value)) = access.next_entry::<String, f64>()? {
            out.insert(target, value);
        }
        Ok(out)
    }
}

impl<'de> Deserialize<'de> for TargetValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TargetValuesVisitor)
    }
}

struct SampleTableVisitor;

impl<'de> Visitor<'de> for SampleTableVisitor {
    type Value = SampleTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of sample name to target values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = SampleTable::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((sample, values)) = access.next_entry::<String, TargetValues>()? {
            out.insert(sample, values);
        }
        Ok(out)
    }
}

impl<'de> Deserialize<'de> for SampleTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SampleTableVisitor)
    }
}
