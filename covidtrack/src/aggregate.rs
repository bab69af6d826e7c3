//! The reusable tabular algorithms behind every view: group-by sums, pivots, rolling means
//! and running totals. All of them treat NaN as a gap.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a rolling mean is reported relative to its averaging window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    /// At the last observation of the window (a trailing average).
    #[default]
    End,
    /// Shifted back by the window length, so the value for row `i` averages rows
    /// `i + 1 ..= i + n`.
    Start,
}

/// Sum values per date, skipping gaps. A date whose values are all gaps sums to zero.
pub fn sum_by_date<I>(rows: I) -> BTreeMap<NaiveDate, f64>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut sums = BTreeMap::new();
    for (date, value) in rows {
        let sum = sums.entry(date).or_insert(0.0);
        if !value.is_nan() {
            *sum += value;
        }
    }
    sums
}

/// Sum values per (date, key), skipping gaps.
pub fn sum_by_date_and_key<K, I>(rows: I) -> BTreeMap<NaiveDate, BTreeMap<K, f64>>
where
    K: Ord,
    I: IntoIterator<Item = (NaiveDate, K, f64)>,
{
    let mut sums: BTreeMap<NaiveDate, BTreeMap<K, f64>> = BTreeMap::new();
    for (date, key, value) in rows {
        let sum = sums.entry(date).or_default().entry(key).or_insert(0.0);
        if !value.is_nan() {
            *sum += value;
        }
    }
    sums
}

/// Spread grouped sums into one column per key, in `keys` order. Dates with no row for a
/// key get a gap in that key's column.
pub fn pivot<K: Ord>(
    grouped: &BTreeMap<NaiveDate, BTreeMap<K, f64>>,
    keys: &[K],
) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    let dates: Vec<NaiveDate> = grouped.keys().copied().collect();
    let columns = keys
        .iter()
        .map(|key| {
            grouped
                .values()
                .map(|by_key| by_key.get(key).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();
    (dates, columns)
}

/// Mean of each `window`-long run of `values`. The first `window - 1` results are gaps, as
/// is any result whose window contains a gap. [`Alignment::Start`] then shifts the whole
/// series back by `window`, leaving the last `window` results as gaps.
pub fn rolling_mean(values: &[f64], window: usize, alignment: Alignment) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    let trailing: Vec<f64> = (0..values.len())
        .map(|idx| {
            if idx + 1 < window {
                return f64::NAN;
            }
            let span = &values[idx + 1 - window..=idx];
            if span.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                span.iter().sum::<f64>() / window as f64
            }
        })
        .collect();
    match alignment {
        Alignment::End => trailing,
        Alignment::Start => (0..trailing.len())
            .map(|idx| trailing.get(idx + window).copied().unwrap_or(f64::NAN))
            .collect(),
    }
}

/// Running total that passes over gaps: a gap stays a gap and does not reset the total.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    values
        .iter()
        .map(|value| {
            if value.is_nan() {
                f64::NAN
            } else {
                total += value;
                total
            }
        })
        .collect()
}
