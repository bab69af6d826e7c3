//! Stage 3: ratio columns and the day-over-day ICU differential.

use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::observation::Observation;

/// How `icuIncrease` finds the "previous" row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcuShift {
    /// Look one row ahead across the whole table, ignoring region boundaries. The oldest row
    /// of each region is differenced against the newest row of the next region. Kept as the
    /// default so published series match the dashboard's historical output.
    #[default]
    Global,
    /// Look one row ahead within a region only; each region's oldest row has no
    /// predecessor and gets NaN.
    PerRegion,
}

/// `numerator / denominator`, or NaN when the denominator is zero or either side is a gap.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() || numerator.is_nan() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Append `deathsPerCase`, `positivityRate` and `icuIncrease`.
///
/// `observations` must be in canonical order (region ascending, newest date first), which
/// makes the next row the previous day of the same region everywhere but at region ends.
pub fn append_derived(observations: &mut [Observation], shift: IcuShift) {
    for observation in observations.iter_mut() {
        let deaths_per_case = ratio(
            observation.get(Metric::Death),
            observation.get(Metric::Positive),
        );
        let positivity = ratio(
            100.0 * observation.get(Metric::PositiveIncrease),
            observation.get(Metric::TotalTestResultsIncrease),
        );
        observation.set(Metric::DeathsPerCase, deaths_per_case);
        observation.set(Metric::PositivityRate, positivity);
    }

    let icu: Vec<f64> = observations
        .iter()
        .map(|obs| obs.get(Metric::InIcuCumulative))
        .collect();
    for idx in 0..observations.len() {
        let previous = match observations.get(idx + 1) {
            Some(next) if shift == IcuShift::Global || next.region == observations[idx].region => {
                icu[idx + 1]
            }
            _ => f64::NAN,
        };
        observations[idx].set(Metric::IcuIncrease, icu[idx] - previous);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn obs(region: &str, day: u32) -> Observation {
        Observation::new(
            region.parse().unwrap(),
            NaiveDate::from_ymd_opt(2020, 7, day).unwrap(),
        )
    }

    fn icu_fixture() -> Vec<Observation> {
        vec![
            obs("AA", 3).with(Metric::InIcuCumulative, 30.0),
            obs("AA", 2).with(Metric::InIcuCumulative, 25.0),
            obs("AA", 1).with(Metric::InIcuCumulative, 21.0),
            obs("BB", 3).with(Metric::InIcuCumulative, 500.0),
            obs("BB", 2).with(Metric::InIcuCumulative, 480.0),
        ]
    }

    fn icu_increase(table: &[Observation]) -> Vec<f64> {
        table.iter().map(|o| o.get(Metric::IcuIncrease)).collect()
    }

    #[test]
    fn ratios_use_nan_for_undefined_denominators() {
        let mut table = vec![
            obs("AA", 1)
                .with(Metric::Death, 5.0)
                .with(Metric::Positive, 100.0)
                .with(Metric::PositiveIncrease, 20.0)
                .with(Metric::TotalTestResultsIncrease, 400.0),
            obs("AA", 2)
                .with(Metric::Death, 0.0)
                .with(Metric::Positive, 0.0)
                .with(Metric::PositiveIncrease, 3.0)
                .with(Metric::TotalTestResultsIncrease, 0.0),
            obs("AA", 3),
        ];
        append_derived(&mut table, IcuShift::Global);
        assert_eq!(table[0].get(Metric::DeathsPerCase), 0.05);
        assert_eq!(table[0].get(Metric::PositivityRate), 5.0);
        assert!(table[1].get(Metric::DeathsPerCase).is_nan());
        assert!(table[1].get(Metric::PositivityRate).is_nan());
        assert!(table[2].get(Metric::DeathsPerCase).is_nan());
    }

    #[test]
    fn global_shift_crosses_region_boundaries() {
        let mut table = icu_fixture();
        append_derived(&mut table, IcuShift::Global);
        let values = icu_increase(&table);
        assert_eq!(values[0], 5.0);
        assert_eq!(values[1], 4.0);
        // AA's oldest row is differenced against BB's newest row.
        assert_eq!(values[2], 21.0 - 500.0);
        assert_eq!(values[3], 20.0);
        assert!(values[4].is_nan(), "last row has no lookahead");
    }

    #[test]
    fn per_region_shift_stops_at_region_boundaries() {
        let mut table = icu_fixture();
        append_derived(&mut table, IcuShift::PerRegion);
        let values = icu_increase(&table);
        assert_eq!(values[0], 5.0);
        assert_eq!(values[1], 4.0);
        assert!(values[2].is_nan());
        assert_eq!(values[3], 20.0);
        assert!(values[4].is_nan());
    }

    #[test]
    fn icu_shift_reads_from_config_names() {
        let shift: IcuShift = serde_json::from_str("\"per_region\"").unwrap();
        assert_eq!(shift, IcuShift::PerRegion);
        assert_eq!(IcuShift::default(), IcuShift::Global);
    }
}
