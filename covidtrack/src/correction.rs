//! Stage 2: prune to the allow-listed fields, patch known-bad source values, clamp
//! impossible negatives.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CovidtrackError, Result};
use crate::metric::Metric;
use crate::observation::{Observation, RawObservation};
use crate::region::RegionCode;

/// Keep only the fields in [`Metric::SOURCE`]. Anything else the feed sends is discarded;
/// allow-listed fields that are absent, `null` or non-numeric become NaN.
pub fn prune(raw: Vec<RawObservation>) -> Vec<Observation> {
    raw.into_iter()
        .map(|record| {
            let mut observation = Observation::new(record.region, record.date);
            for metric in Metric::SOURCE {
                if let Some(value) = record.fields.get(metric.as_ref()).and_then(Value::as_f64) {
                    observation.set(metric, value);
                }
            }
            observation
        })
        .collect()
}

/// A manual fix for a single known-erroneous upstream value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub region: RegionCode,
    pub date: NaiveDate,
    pub metric: Metric,
    pub value: f64,
}

impl CorrectionRule {
    pub fn new(region: RegionCode, date: NaiveDate, metric: Metric, value: f64) -> Self {
        Self {
            region,
            date,
            metric,
            value,
        }
    }
}

/// The corrections applied on every rebuild. At most one rule may target a given cell, so
/// applying the set is order independent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrectionSet {
    by_row: HashMap<(RegionCode, NaiveDate), Vec<(Metric, f64)>>,
}

impl CorrectionSet {
    pub fn new(rules: impl IntoIterator<Item = CorrectionRule>) -> Result<Self> {
        let mut cells = HashSet::new();
        let mut by_row: HashMap<_, Vec<_>> = HashMap::new();
        for rule in rules {
            if !rule.metric.is_source() {
                return Err(CovidtrackError::InvalidCorrection(rule.metric));
            }
            if !cells.insert((rule.region.clone(), rule.date, rule.metric)) {
                return Err(CovidtrackError::ConflictingCorrection {
                    region: rule.region,
                    date: rule.date,
                    metric: rule.metric,
                });
            }
            by_row
                .entry((rule.region, rule.date))
                .or_default()
                .push((rule.metric, rule.value));
        }
        Ok(Self { by_row })
    }

    /// The built-in rules plus any configured extras.
    pub fn with_extra(extra: &[CorrectionRule]) -> Result<Self> {
        Self::new(builtin_rules().into_iter().chain(extra.iter().cloned()))
    }

    pub fn len(&self) -> usize {
        self.by_row.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_row.is_empty()
    }

    /// Overwrite every targeted cell that exists in `observations`.
    pub fn apply(&self, observations: &mut [Observation]) {
        let mut applied = 0;
        for observation in observations.iter_mut() {
            if let Some(patches) = self
                .by_row
                .get(&(observation.region.clone(), observation.date))
            {
                for (metric, value) in patches {
                    observation.set(*metric, *value);
                    applied += 1;
                }
            }
        }
        debug!("Applied {applied} of {} corrections", self.len());
    }
}

fn builtin_rules() -> Vec<CorrectionRule> {
    let mut rules = vec![];
    // New Jersey reported its probable-death backlog as a single day.
    if let (Ok(region), Some(date)) = ("NJ".parse(), NaiveDate::from_ymd_opt(2020, 6, 25)) {
        rules.push(CorrectionRule::new(region, date, Metric::DeathIncrease, 23.0));
    }
    rules
}

/// Clamp every [`Metric::NON_NEGATIVE`] value to zero. NaN gaps are left alone.
pub fn clamp_non_negative(observations: &mut [Observation]) {
    for observation in observations.iter_mut() {
        for metric in Metric::NON_NEGATIVE {
            if observation.get(metric) < 0.0 {
                observation.set(metric, 0.0);
            }
        }
    }
}
