use std::time::Duration;

use log::info;
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;

/// Download the full feed snapshot. Network failures, non-success statuses and a body that
/// is not a JSON array all surface as `FetchFailure`.
pub async fn fetch_records(config: &Config) -> Result<Vec<Value>> {
    info!("Fetching records from {}", config.source_url);
    let records = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?
        .get(&config.source_url)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<Value>>()
        .await?;
    info!("Fetched {} records", records.len());
    Ok(records)
}
