//! Stages 1 to 4 wired together: raw feed records in, canonical table out.

use log::{debug, info};
use serde_json::Value;

use crate::config::Config;
use crate::correction::{self, CorrectionSet};
use crate::derived::{self, IcuShift};
use crate::enrich;
use crate::error::Result;
use crate::ingest;
use crate::lookup::{CategoryLookup, PopulationLookup};
use crate::table::CanonicalTable;

/// Everything a rebuild needs besides the raw records. Validated once, on construction, so
/// a bad configuration is reported before any fetch happens.
#[derive(Clone, Debug)]
pub struct Pipeline {
    cutoff: chrono::NaiveDate,
    corrections: CorrectionSet,
    icu_shift: IcuShift,
    categories: CategoryLookup,
    populations: PopulationLookup,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Result<Self> {
        let corrections = CorrectionSet::with_extra(&config.corrections)?;
        debug!("{} corrections configured", corrections.len());
        Ok(Self {
            cutoff: config.cutoff_date,
            corrections,
            icu_shift: config.icu_shift,
            categories: CategoryLookup::default(),
            populations: PopulationLookup::default(),
        })
    }

    /// Replace the built-in lookups.
    pub fn with_lookups(mut self, categories: CategoryLookup, populations: PopulationLookup) -> Self {
        self.categories = categories;
        self.populations = populations;
        self
    }

    pub fn run(&self, records: &[Value]) -> CanonicalTable {
        let raw = ingest::normalize(records, self.cutoff);
        let mut observations = correction::prune(raw);
        self.corrections.apply(&mut observations);
        correction::clamp_non_negative(&mut observations);
        derived::append_derived(&mut observations, self.icu_shift);
        enrich::enrich(&mut observations, &self.categories, &self.populations);
        info!(
            "Built canonical table: {} rows from {} records",
            observations.len(),
            records.len()
        );
        CanonicalTable::new(observations)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::correction::CorrectionRule;
    use crate::error::CovidtrackError;
    use crate::lookup::Category;
    use crate::metric::Metric;

    fn feed() -> Vec<Value> {
        vec![
            json!({"date": 20200626, "state": "NJ", "deathIncrease": 25, "positive": 170000,
                   "death": 13000, "inIcuCumulative": null, "hash": "a"}),
            json!({"date": 20200625, "state": "NJ", "deathIncrease": 1877, "positive": 169000,
                   "death": 12975}),
            json!({"date": 20200624, "state": "NJ", "deathIncrease": -4}),
            json!({"date": 20200625, "state": "AS", "positive": 0}),
            json!({"date": 20200220, "state": "NJ", "positive": 1}),
            json!({"date": "bogus", "state": "NJ"}),
        ]
    }

    #[test]
    fn run_applies_every_stage() {
        let table = Pipeline::from_config(&Config::default()).unwrap().run(&feed());
        // Pre-cutoff and malformed records are gone.
        assert_eq!(table.len(), 4);
        let nj = |d| {
            table
                .observations()
                .iter()
                .find(|o| o.region.as_str() == "NJ" && o.date == NaiveDate::from_ymd_opt(2020, 6, d).unwrap())
                .unwrap()
        };
        assert_eq!(nj(25).get(Metric::DeathIncrease), 23.0);
        assert_eq!(nj(24).get(Metric::DeathIncrease), 0.0);
        assert_eq!(nj(26).category, Some(Category::WonByClinton));
        assert!(nj(26).get(Metric::DeathsPerCase) > 0.0);
        // Territories keep their rows but get no lookups.
        let american_samoa = &table.observations()[0];
        assert_eq!(american_samoa.region.as_str(), "AS");
        assert_eq!(american_samoa.population, None);
        assert!(american_samoa.get(Metric::DeathsPerCase).is_nan());
    }

    #[test]
    fn conflicting_configured_correction_fails_construction() {
        let config = Config {
            corrections: vec![CorrectionRule::new(
                "NJ".parse().unwrap(),
                NaiveDate::from_ymd_opt(2020, 6, 25).unwrap(),
                Metric::DeathIncrease,
                0.0,
            )],
            ..Config::default()
        };
        assert!(matches!(
            Pipeline::from_config(&config),
            Err(CovidtrackError::ConflictingCorrection { .. })
        ));
    }

    #[test]
    fn custom_lookups_replace_builtin_ones() {
        let pipeline = Pipeline::from_config(&Config::default())
            .unwrap()
            .with_lookups(
                [("AS".parse().unwrap(), Category::WonByTrump)].into_iter().collect(),
                [("AS".parse().unwrap(), 55_000.0)].into_iter().collect(),
            );
        let table = pipeline.run(&feed());
        assert_eq!(table.categorized().count(), 1);
        assert_eq!(table.population_scaled().count(), 1);
    }
}
