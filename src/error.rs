//! Error types.
//!
//! - `QuantError`: what can go wrong while quantifying one series
//! - `SeriesError`: a `QuantError` tagged with the series name and pipeline stage
//! - `AppError`: what the binary reports (message + process exit code)

use thiserror::Error;

/// Failure while reading or quantifying a single series.
///
/// Every kind is terminal for the series it occurred in; nothing is retried
/// or replaced by a default value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantError {
    /// A consumed row has no Ct value, or the value is not a finite number.
    #[error("line {line}: {}", describe_ct(.value))]
    MalformedRow { line: usize, value: Option<String> },

    /// The row sequence ran out before every positional pull completed.
    #[error("series has {available} rows but the layout needs {required}")]
    InsufficientRows { required: usize, available: usize },

    /// A sample has no averaged Ct for the `IgG` reference antibody.
    #[error("sample `{sample}` has no `IgG` Ct value to subtract as background")]
    MissingReferenceAntibody { sample: String },

    /// Finite inputs produced an infinite or NaN value for `sample`/`target`.
    #[error("`{sample}`/`{target}`: result {value} is not a finite number")]
    NonFiniteValue {
        sample: String,
        target: String,
        value: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The series file could not be opened or parsed as CSV.
    #[error("{0}")]
    SourceUnavailable(String),
}

fn describe_ct(value: &Option<String>) -> String {
    match value {
        None => "missing Ct value".to_string(),
        Some(v) => format!("Ct value '{v}' is not a number"),
    }
}

/// Pipeline stage in which a series failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingest,
    Averaging,
    Normalization,
    Ratio,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Averaging => "averaging",
            Stage::Normalization => "normalization",
            Stage::Ratio => "ratio",
        };
        f.write_str(name)
    }
}

/// A per-series failure, naming the series and the stage that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("series `{series}` failed during {stage}: {source}")]
pub struct SeriesError {
    pub series: String,
    pub stage: Stage,
    #[source]
    pub source: QuantError,
}

impl SeriesError {
    pub fn new(series: impl Into<String>, stage: Stage, source: QuantError) -> Self {
        Self {
            series: series.into(),
            stage,
            source,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<QuantError> for AppError {
    fn from(err: QuantError) -> Self {
        match err {
            QuantError::InvalidConfiguration(_) => AppError::new(2, err.to_string()),
            other => AppError::new(3, other.to_string()),
        }
    }
}
