use covidtrack::error::CovidtrackError;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum CovidtrackCliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("covidtrack error: {0}")]
    CovidtrackError(#[from] CovidtrackError),
    #[error("Invalid TOML in config file: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type CovidtrackCliResult<T> = Result<T, CovidtrackCliError>;
