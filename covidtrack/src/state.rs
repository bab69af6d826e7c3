use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch;
use crate::pipeline::Pipeline;
use crate::table::CanonicalTable;

/// Holds the resident canonical table. Readers take a snapshot and keep using it for as
/// long as they like; a rebuild swaps in a new table without disturbing them.
#[derive(Debug, Default)]
pub struct PipelineState {
    table: RwLock<Arc<CanonicalTable>>,
}

impl PipelineState {
    pub fn new(table: CanonicalTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn snapshot(&self) -> Arc<CanonicalTable> {
        // A poisoned lock still holds a complete table: the only write is a pointer swap.
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Install `table` and return the installed snapshot. Concurrent replacements resolve
    /// last-writer-wins, but each caller gets back the table it installed.
    pub fn replace(&self, table: CanonicalTable) -> Arc<CanonicalTable> {
        let table = Arc::new(table);
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = Arc::clone(&table);
        table
    }

    /// Fetch, rebuild and install a new table. On failure the error is logged and
    /// returned, and the previous table stays live.
    pub async fn refresh(&self, config: &Config, pipeline: &Pipeline) -> Result<Arc<CanonicalTable>> {
        match fetch::fetch_records(config).await {
            Ok(records) => {
                let table = self.replace(pipeline.run(&records));
                info!("Refreshed: {} rows built at {}", table.len(), table.built_at());
                Ok(table)
            }
            Err(e) => {
                warn!("Refresh failed, keeping previous table: {e}");
                Err(e)
            }
        }
    }
}
