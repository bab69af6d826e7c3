//! Error types.

use chrono::NaiveDate;

use crate::metric::Metric;
use crate::region::RegionCode;

#[derive(thiserror::Error, Debug)]
pub enum CovidtrackError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Failed to fetch source data: {0}")]
    FetchFailure(#[from] reqwest::Error),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Invalid region code: {0:?}")]
    InvalidRegion(String),
    #[error("More than one correction targets {region} {date} {metric}")]
    ConflictingCorrection {
        region: RegionCode,
        date: NaiveDate,
        metric: Metric,
    },
    #[error("Corrections can only target source fields, not {0}")]
    InvalidCorrection(Metric),
    #[error("Rolling window must be at least one observation")]
    InvalidWindow,
    #[error("Column {column} has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Wrapped IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CovidtrackError>;
