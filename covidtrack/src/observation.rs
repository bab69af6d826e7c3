use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumCount, IntoEnumIterator};

use crate::lookup::Category;
use crate::metric::Metric;
use crate::region::RegionCode;

/// One normalized feed record before pruning: every upstream field is still present.
#[derive(Clone, Debug, PartialEq)]
pub struct RawObservation {
    pub region: RegionCode,
    pub date: NaiveDate,
    pub fields: Map<String, Value>,
}

/// One (region, date) row of the canonical table.
///
/// Missing values are stored as NaN. Two observations compare equal when every value is
/// equal or both are NaN.
#[derive(Clone, Debug)]
pub struct Observation {
    pub region: RegionCode,
    pub date: NaiveDate,
    values: [f64; Metric::COUNT],
    pub category: Option<Category>,
    pub population: Option<f64>,
}

impl Observation {
    pub fn new(region: RegionCode, date: NaiveDate) -> Self {
        Self {
            region,
            date,
            values: [f64::NAN; Metric::COUNT],
            category: None,
            population: None,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values[metric.index()] = value;
    }

    /// Builder-style [`Observation::set`], mostly useful for fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    pub fn to_record(&self) -> ObservationRecord {
        ObservationRecord {
            state: self.region.clone(),
            date: self.date,
            values: Metric::iter()
                .map(|metric| (metric, gap_to_none(self.get(metric))))
                .collect(),
            category: self.category,
            population: self.population,
        }
    }
}

pub(crate) fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region
            && self.date == other.date
            && self.category == other.category
            && self.population == other.population
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| same_value(*a, *b))
    }
}

pub(crate) fn gap_to_none(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Row-oriented interchange form of an [`Observation`]. NaN gaps become `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub state: RegionCode,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: std::collections::BTreeMap<Metric, Option<f64>>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub population: Option<f64>,
}

impl From<ObservationRecord> for Observation {
    fn from(record: ObservationRecord) -> Self {
        let mut observation = Observation::new(record.state, record.date);
        for (metric, value) in record.values {
            observation.set(metric, value.unwrap_or(f64::NAN));
        }
        observation.category = record.category;
        observation.population = record.population;
        observation
    }
}
