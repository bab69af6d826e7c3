//! Stage 5: request-time aggregation views over a resident [`CanonicalTable`]. None of
//! them modify the table.

use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::aggregate;
use crate::derived::ratio;
use crate::error::Result;
use crate::lookup::Category;
use crate::metric::Metric;
use crate::observation::Observation;
use crate::region::RegionCode;
use crate::series::{ColumnKey, SeriesTable};
use crate::table::CanonicalTable;

/// Whether values are reported as-is or per 1,000,000 residents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    #[default]
    Raw,
    /// Each row is divided by its region's population in millions before any summing.
    /// Rows from regions without a population are excluded.
    PerMillion,
}

impl Scaling {
    pub fn key(self, metric: Metric) -> ColumnKey {
        match self {
            Scaling::Raw => ColumnKey::Metric(metric),
            Scaling::PerMillion => ColumnKey::PerMillion(metric),
        }
    }
}

/// The rows a view includes under `scaling`, each paired with the divisor its values are
/// scaled by. Per-capita rows come from [`CanonicalTable::population_scaled`].
fn scaled_rows(table: &CanonicalTable, scaling: Scaling) -> Vec<(&Observation, f64)> {
    match scaling {
        Scaling::Raw => table.observations().iter().map(|obs| (obs, 1.0)).collect(),
        Scaling::PerMillion => table
            .population_scaled()
            .map(|(obs, population)| (obs, population / 1_000_000.0))
            .collect(),
    }
}

/// Daily total of `metric` over every region, date ascending.
pub fn national_daily_sum(
    table: &CanonicalTable,
    metric: Metric,
    scaling: Scaling,
) -> Result<SeriesTable> {
    let sums = aggregate::sum_by_date(
        scaled_rows(table, scaling)
            .into_iter()
            .map(|(obs, divisor)| (obs.date, ratio(obs.get(metric), divisor))),
    );
    let (dates, values): (Vec<_>, Vec<_>) = sums.into_iter().unzip();
    let mut series = SeriesTable::new(dates);
    series.push_column(scaling.key(metric), values)?;
    Ok(series)
}

/// Observations for one region on or after `since`, oldest first. Empty when the region
/// has no data.
pub fn region_subset<'a>(
    table: &'a CanonicalTable,
    region: &RegionCode,
    since: Option<NaiveDate>,
) -> Vec<&'a Observation> {
    table
        .observations()
        .iter()
        .filter(|obs| &obs.region == region)
        .filter(|obs| since.map_or(true, |since| obs.date >= since))
        .sorted_by_key(|obs| obs.date)
        .collect()
}

/// [`region_subset`] as a plottable table with one column per requested metric.
pub fn region_series(
    table: &CanonicalTable,
    region: &RegionCode,
    metrics: &[Metric],
    since: Option<NaiveDate>,
    scaling: Scaling,
) -> Result<SeriesTable> {
    let rows: Vec<(&Observation, f64)> = scaled_rows(table, scaling)
        .into_iter()
        .filter(|(obs, _)| &obs.region == region)
        .filter(|(obs, _)| since.map_or(true, |since| obs.date >= since))
        .sorted_by_key(|(obs, _)| obs.date)
        .collect();
    let mut series = SeriesTable::new(rows.iter().map(|(obs, _)| obs.date).collect());
    for metric in metrics {
        let values = rows
            .iter()
            .map(|(obs, divisor)| ratio(obs.get(*metric), *divisor))
            .collect();
        series.push_column(scaling.key(*metric), values)?;
    }
    debug!("{region}: {} rows for {} metrics", series.len(), metrics.len());
    Ok(series)
}

/// Daily sums of `metric` per category, one column per category present in the data.
/// With `cumulative`, each column becomes its running total.
pub fn category_grouped_sum(
    table: &CanonicalTable,
    metric: Metric,
    scaling: Scaling,
    cumulative: bool,
) -> Result<SeriesTable> {
    let grouped = aggregate::sum_by_date_and_key(
        scaled_rows(table, scaling)
            .into_iter()
            .filter_map(|(obs, divisor)| {
                obs.category
                    .map(|category| (obs.date, category, ratio(obs.get(metric), divisor)))
            }),
    );
    let present: Vec<Category> = Category::iter()
        .filter(|category| grouped.values().any(|by_key| by_key.contains_key(category)))
        .collect();
    let (dates, columns) = aggregate::pivot(&grouped, &present);
    let mut series = SeriesTable::new(dates);
    for (category, values) in present.into_iter().zip(columns) {
        let values = if cumulative {
            aggregate::cumulative_sum(&values)
        } else {
            values
        };
        series.push_column(ColumnKey::Category(category), values)?;
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use nonempty::nonempty;

    use super::*;
    use crate::aggregate::Alignment;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 11, d).unwrap()
    }

    fn obs(
        region: &str,
        date: NaiveDate,
        value: f64,
        category: Option<Category>,
        population: Option<f64>,
    ) -> Observation {
        let mut obs =
            Observation::new(region.parse().unwrap(), date).with(Metric::PositiveIncrease, value);
        obs.category = category;
        obs.population = population;
        obs
    }

    /// AA (1M, Trump) and BB (2M, Clinton) report 100 each day; ZZ has no lookups.
    fn fixture() -> CanonicalTable {
        let mut rows = vec![];
        for d in [2, 1] {
            rows.push(obs("AA", day(d), 100.0, Some(Category::WonByTrump), Some(1e6)));
        }
        for d in [2, 1] {
            rows.push(obs("BB", day(d), 100.0, Some(Category::WonByClinton), Some(2e6)));
        }
        rows.push(obs("ZZ", day(2), 7.0, None, None));
        CanonicalTable::new(rows)
    }

    fn column(series: &SeriesTable, key: ColumnKey) -> Vec<f64> {
        series.column(&key).unwrap().to_vec()
    }

    #[test]
    fn national_sum_includes_every_region() {
        let series =
            national_daily_sum(&fixture(), Metric::PositiveIncrease, Scaling::Raw).unwrap();
        assert_eq!(series.dates(), &[day(1), day(2)]);
        assert_eq!(
            column(&series, ColumnKey::Metric(Metric::PositiveIncrease)),
            vec![200.0, 207.0]
        );
    }

    #[test]
    fn per_capita_scales_before_summing() {
        let table = fixture();
        let series =
            national_daily_sum(&table, Metric::PositiveIncrease, Scaling::PerMillion).unwrap();
        // AA contributes 100, BB contributes 50; ZZ has no population and is left out.
        assert_eq!(
            column(&series, ColumnKey::PerMillion(Metric::PositiveIncrease)),
            vec![150.0, 150.0]
        );

        let aa = region_series(
            &table,
            &"AA".parse().unwrap(),
            &[Metric::PositiveIncrease],
            None,
            Scaling::PerMillion,
        )
        .unwrap();
        let bb = region_series(
            &table,
            &"BB".parse().unwrap(),
            &[Metric::PositiveIncrease],
            None,
            Scaling::PerMillion,
        )
        .unwrap();
        let key = ColumnKey::PerMillion(Metric::PositiveIncrease);
        assert_eq!(column(&aa, key.clone())[0], 100.0);
        assert_eq!(column(&bb, key)[0], 50.0);
    }

    #[test]
    fn scaling_after_summing_gives_a_different_answer() {
        let table = fixture();
        let raw = national_daily_sum(&table, Metric::PositiveIncrease, Scaling::Raw).unwrap();
        let total_population: f64 = 3.0;
        let aggregate_then_scale =
            column(&raw, ColumnKey::Metric(Metric::PositiveIncrease))[0] / total_population;
        let scale_then_aggregate = column(
            &national_daily_sum(&table, Metric::PositiveIncrease, Scaling::PerMillion).unwrap(),
            ColumnKey::PerMillion(Metric::PositiveIncrease),
        )[0];
        assert_ne!(aggregate_then_scale, scale_then_aggregate);
    }

    #[test]
    fn region_without_population_is_absent_from_per_capita_views() {
        let table = fixture();
        let zz = "ZZ".parse().unwrap();
        assert_eq!(region_subset(&table, &zz, None).len(), 1);
        let scaled = region_series(
            &table,
            &zz,
            &[Metric::PositiveIncrease],
            None,
            Scaling::PerMillion,
        )
        .unwrap();
        assert!(scaled.is_empty());
    }

    #[test]
    fn region_subset_is_oldest_first_and_honours_since() {
        let table = fixture();
        let aa = "AA".parse().unwrap();
        let dates: Vec<NaiveDate> = region_subset(&table, &aa, None)
            .iter()
            .map(|obs| obs.date)
            .collect();
        assert_eq!(dates, vec![day(1), day(2)]);
        assert_eq!(region_subset(&table, &aa, Some(day(2))).len(), 1);
        assert!(region_subset(&table, &"QQ".parse().unwrap(), None).is_empty());
    }

    #[test]
    fn category_sum_pivots_and_accumulates() {
        let table = fixture();
        let series =
            category_grouped_sum(&table, Metric::PositiveIncrease, Scaling::Raw, false).unwrap();
        let names: Vec<String> = series.keys().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["States Won By Clinton", "States Won By Trump"]);
        assert_eq!(
            column(&series, ColumnKey::Category(Category::WonByTrump)),
            vec![100.0, 100.0]
        );

        let cumulative =
            category_grouped_sum(&table, Metric::PositiveIncrease, Scaling::Raw, true).unwrap();
        assert_eq!(
            column(&cumulative, ColumnKey::Category(Category::WonByClinton)),
            vec![100.0, 200.0]
        );
    }

    #[test]
    fn category_per_capita_sum_scales_each_region_first() {
        let rows = vec![
            obs("AA", day(1), 100.0, Some(Category::WonByTrump), Some(1e6)),
            obs("BB", day(1), 100.0, Some(Category::WonByTrump), Some(2e6)),
        ];
        let table = CanonicalTable::new(rows.clone());
        let series =
            category_grouped_sum(&table, Metric::PositiveIncrease, Scaling::PerMillion, false)
                .unwrap();
        assert_eq!(
            column(&series, ColumnKey::Category(Category::WonByTrump)),
            vec![150.0]
        );

        // A categorized region without a population is left out of the per-capita sum.
        let mut with_unscaled = rows;
        with_unscaled.push(obs("CC", day(1), 900.0, Some(Category::WonByTrump), None));
        let series = category_grouped_sum(
            &CanonicalTable::new(with_unscaled),
            Metric::PositiveIncrease,
            Scaling::PerMillion,
            false,
        )
        .unwrap();
        assert_eq!(
            column(&series, ColumnKey::Category(Category::WonByTrump)),
            vec![150.0]
        );
        assert_eq!(series.keys().count(), 1);
    }

    #[test]
    fn category_sum_leaves_missing_cells_as_gaps() {
        let rows = vec![
            obs("AA", day(2), 5.0, Some(Category::WonByTrump), None),
            obs("AA", day(1), 5.0, Some(Category::WonByTrump), None),
            obs("BB", day(2), 3.0, Some(Category::WonByClinton), None),
        ];
        let series = category_grouped_sum(
            &CanonicalTable::new(rows),
            Metric::PositiveIncrease,
            Scaling::Raw,
            true,
        )
        .unwrap();
        let clinton = column(&series, ColumnKey::Category(Category::WonByClinton));
        assert!(clinton[0].is_nan());
        assert_eq!(clinton[1], 3.0);
    }

    #[test]
    fn rolling_decoration_applies_to_any_view() {
        let rows: Vec<Observation> = (1..=10)
            .rev()
            .map(|d| obs("AA", day(d), d as f64, None, None))
            .collect();
        let key = ColumnKey::Metric(Metric::PositiveIncrease);
        let series = national_daily_sum(
            &CanonicalTable::new(rows),
            Metric::PositiveIncrease,
            Scaling::Raw,
        )
        .unwrap()
        .with_rolling(&[key.clone()], &nonempty![7], Alignment::End)
        .unwrap();
        let rolled = column(&series, ColumnKey::rolling(key, 7, Alignment::End));
        assert!(rolled[..6].iter().all(|v| v.is_nan()));
        assert_eq!(&rolled[6..], &[4.0, 5.0, 6.0, 7.0]);
    }
}
