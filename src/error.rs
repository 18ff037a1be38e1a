use std::path::PathBuf;

use thiserror::Error;

use crate::report::ChartKind;

/// Errors raised while reading the life-expectancy CSV.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File is missing or unreadable
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed CSV (bad header, wrong field count, invalid UTF-8, ...)
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A non-empty cell that cannot be coerced to the column's type
    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Errors raised while drawing, encoding, or writing a chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no data to render for the {0} chart")]
    EmptyData(ChartKind),

    #[error("invalid figure size {width}x{height} pixels")]
    InvalidFigure { width: u32, height: u32 },

    /// Values that leave the axis range unbounded
    #[error("non-finite values in the {0} chart")]
    NonFiniteData(ChartKind),

    #[error("drawing failed while {stage}: {message}")]
    Draw {
        stage: &'static str,
        message: String,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Adapter for plotters errors, which are generic over the backend.
    pub(crate) fn draw<E: std::fmt::Display>(stage: &'static str, err: E) -> Self {
        RenderError::Draw {
            stage,
            message: err.to_string(),
        }
    }
}

/// Errors raised while reading a JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
