use std::sync::Arc;

use log::debug;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::state::PipelineState;
use crate::table::CanonicalTable;

// Re-exports
pub use column_names as COL;

// Modules
pub mod aggregate;
pub mod column_names;
pub mod config;
pub mod correction;
pub mod derived;
pub mod enrich;
pub mod error;
pub mod fetch;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod ingest;
pub mod lookup;
pub mod metric;
pub mod observation;
pub mod pipeline;
pub mod region;
pub mod series;
pub mod state;
pub mod table;
pub mod views;

/// Type for the covidtrack pipeline and its resident table
#[derive(Debug)]
pub struct Covidtrack {
    pub config: Config,
    pub pipeline: Pipeline,
    pub state: PipelineState,
}

impl Covidtrack {
    /// Setup the Covidtrack object with default configuration
    pub fn new() -> Result<Self> {
        Self::new_with_config(Config::default())
    }

    /// Setup the Covidtrack object with custom configuration. Fails if the configured
    /// corrections conflict. The resident table starts empty.
    pub fn new_with_config(config: Config) -> Result<Self> {
        debug!("config: {config:?}");
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self {
            config,
            pipeline,
            state: PipelineState::default(),
        })
    }

    /// Fetch the feed and rebuild the canonical table, replacing the resident one.
    pub async fn rebuild_canonical_table(&self) -> Result<Arc<CanonicalTable>> {
        self.state.refresh(&self.config, &self.pipeline).await
    }

    pub fn snapshot(&self) -> Arc<CanonicalTable> {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::metric::Metric;
    use crate::views::{self, Scaling};

    #[tokio::test]
    async fn rebuild_serves_views() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/daily.json");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"[
                        {"date": 20200602, "state": "NY", "positiveIncrease": 1000, "totalTestResultsIncrease": 50000},
                        {"date": 20200601, "state": "NY", "positiveIncrease": 1200, "totalTestResultsIncrease": 40000},
                        {"date": 20200602, "state": "WY", "positiveIncrease": 10, "totalTestResultsIncrease": 500}
                    ]"#,
                );
        });
        let covidtrack = Covidtrack::new_with_config(Config {
            source_url: server.url("/daily.json"),
            ..Config::default()
        })
        .unwrap();
        assert!(covidtrack.snapshot().is_empty());

        let table = covidtrack.rebuild_canonical_table().await.unwrap();
        assert_eq!(table.len(), 3);
        let ny = &table.observations()[0];
        assert_eq!(ny.get(Metric::PositivityRate), 2.0);

        let national =
            views::national_daily_sum(&covidtrack.snapshot(), Metric::PositiveIncrease, Scaling::Raw)
                .unwrap();
        assert_eq!(national.len(), 2);
        assert_eq!(
            national
                .column(&crate::series::ColumnKey::Metric(Metric::PositiveIncrease))
                .unwrap(),
            &[1200.0, 1010.0]
        );
    }
}
