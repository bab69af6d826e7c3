use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use strum::IntoEnumIterator;

use crate::error::Result;
use crate::lookup::Category;
use crate::metric::Metric;
use crate::observation::{gap_to_none, Observation, ObservationRecord};
use crate::region::RegionCode;
use crate::COL;

/// The output of pipeline stages 1 to 4: every (region, date) observation in canonical
/// order, with derived metrics appended and lookups joined.
///
/// A table is immutable once built; refreshing replaces it wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalTable {
    observations: Vec<Observation>,
    built_at: DateTime<Utc>,
}

impl CanonicalTable {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            built_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// The base view: every row, region ascending then newest date first.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rows whose region has a category.
    pub fn categorized(&self) -> impl Iterator<Item = (&Observation, Category)> {
        self.observations
            .iter()
            .filter_map(|obs| obs.category.map(|category| (obs, category)))
    }

    /// Rows whose region has a population, with that population. Every per-capita view
    /// draws its rows from here.
    pub fn population_scaled(&self) -> impl Iterator<Item = (&Observation, f64)> {
        self.observations
            .iter()
            .filter_map(|obs| obs.population.map(|population| (obs, population)))
    }

    /// Regions with at least one row.
    pub fn regions(&self) -> BTreeSet<&RegionCode> {
        self.observations.iter().map(|obs| &obs.region).collect()
    }

    pub fn to_records(&self) -> Vec<ObservationRecord> {
        self.observations.iter().map(Observation::to_record).collect()
    }

    /// Rebuild a table from records. The records are assumed to already be in canonical
    /// order, as produced by [`CanonicalTable::to_records`].
    pub fn from_records(records: impl IntoIterator<Item = ObservationRecord>) -> Self {
        Self::new(records.into_iter().map(Observation::from).collect())
    }

    /// One row per observation: state, date, every metric, category and population.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new(
                COL::STATE,
                self.observations
                    .iter()
                    .map(|obs| obs.region.to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                COL::DATE,
                self.observations
                    .iter()
                    .map(|obs| obs.date.format("%Y-%m-%d").to_string())
                    .collect::<Vec<_>>(),
            ),
        ];
        for metric in Metric::iter() {
            columns.push(Series::new(
                metric.as_ref(),
                self.observations
                    .iter()
                    .map(|obs| gap_to_none(obs.get(metric)))
                    .collect::<Vec<_>>(),
            ));
        }
        columns.push(Series::new(
            COL::CATEGORY,
            self.observations
                .iter()
                .map(|obs| obs.category.map(|c| c.to_string()))
                .collect::<Vec<_>>(),
        ));
        columns.push(Series::new(
            COL::POPULATION,
            self.observations
                .iter()
                .map(|obs| obs.population)
                .collect::<Vec<_>>(),
        ));
        Ok(DataFrame::new(columns)?)
    }
}

impl Default for CanonicalTable {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn fixture() -> CanonicalTable {
        let date = |d| NaiveDate::from_ymd_opt(2020, 10, d).unwrap();
        let mut aa = Observation::new("AA".parse().unwrap(), date(2)).with(Metric::Positive, 4.0);
        aa.category = Some(Category::WonByTrump);
        aa.population = Some(1_000_000.0);
        let mut bb = Observation::new("BB".parse().unwrap(), date(1));
        bb.population = Some(2_000_000.0);
        let zz = Observation::new("ZZ".parse().unwrap(), date(1)).with(Metric::Death, 1.0);
        CanonicalTable::new(vec![aa, bb, zz])
    }

    #[test]
    fn filtered_views_keep_the_base_view_intact() {
        let table = fixture();
        assert_eq!(table.len(), 3);
        let categorized: Vec<&str> = table
            .categorized()
            .map(|(obs, _)| obs.region.as_str())
            .collect();
        assert_eq!(categorized, vec!["AA"]);
        let scaled: Vec<(&str, f64)> = table
            .population_scaled()
            .map(|(obs, population)| (obs.region.as_str(), population))
            .collect();
        assert_eq!(scaled, vec![("AA", 1_000_000.0), ("BB", 2_000_000.0)]);
        assert_eq!(table.regions().len(), 3);
    }

    #[test]
    fn records_round_trip_through_json() {
        let table = fixture();
        let json = serde_json::to_string(&table.to_records()).unwrap();
        let records: Vec<ObservationRecord> = serde_json::from_str(&json).unwrap();
        let back = CanonicalTable::from_records(records);
        assert_eq!(back.observations(), table.observations());
    }

    #[test]
    fn dataframe_has_one_row_per_observation() {
        let df = fixture().to_dataframe().unwrap();
        assert_eq!(df.height(), 3);
        // state, date, every metric, category, population
        assert_eq!(df.width(), Metric::iter().count() + 4);
        assert_eq!(df.column(COL::CATEGORY).unwrap().null_count(), 2);
        assert_eq!(df.column("positive").unwrap().null_count(), 2);
    }
}
