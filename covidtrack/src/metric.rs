//! Numeric columns of an observation.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

/// Every numeric column an [`crate::observation::Observation`] carries. The string form of
/// each variant is the upstream feed's field name (or, for derived metrics, the name the
/// derived column is published under).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Metric {
    Positive,
    Negative,
    Death,
    HospitalizedCumulative,
    HospitalizedCurrently,
    InIcuCumulative,
    InIcuCurrently,
    OnVentilatorCurrently,
    PositiveIncrease,
    NegativeIncrease,
    DeathIncrease,
    HospitalizedIncrease,
    TotalTestResults,
    TotalTestResultsIncrease,
    DeathsPerCase,
    PositivityRate,
    IcuIncrease,
}

impl Metric {
    /// The allow-list of upstream fields kept by pruning. Changing this list changes the
    /// published schema, so new upstream fields never reach a chart by accident.
    pub const SOURCE: [Metric; 14] = [
        Metric::Positive,
        Metric::Negative,
        Metric::Death,
        Metric::HospitalizedCumulative,
        Metric::HospitalizedCurrently,
        Metric::InIcuCumulative,
        Metric::InIcuCurrently,
        Metric::OnVentilatorCurrently,
        Metric::PositiveIncrease,
        Metric::NegativeIncrease,
        Metric::DeathIncrease,
        Metric::HospitalizedIncrease,
        Metric::TotalTestResults,
        Metric::TotalTestResultsIncrease,
    ];

    pub const DERIVED: [Metric; 3] = [
        Metric::DeathsPerCase,
        Metric::PositivityRate,
        Metric::IcuIncrease,
    ];

    /// Daily increases cannot be negative; upstream back-corrections that show up as
    /// negative increases are clamped to zero.
    pub const NON_NEGATIVE: [Metric; 5] = [
        Metric::PositiveIncrease,
        Metric::NegativeIncrease,
        Metric::DeathIncrease,
        Metric::HospitalizedIncrease,
        Metric::TotalTestResultsIncrease,
    ];

    pub fn is_source(self) -> bool {
        !Self::DERIVED.contains(&self)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn metric_names_match_feed_fields() {
        assert_eq!(Metric::PositiveIncrease.to_string(), "positiveIncrease");
        assert_eq!(Metric::InIcuCumulative.as_ref(), "inIcuCumulative");
        assert_eq!(
            Metric::from_str("totalTestResultsIncrease").unwrap(),
            Metric::TotalTestResultsIncrease
        );
        assert!(Metric::from_str("dataQualityGrade").is_err());
    }

    #[test]
    fn source_and_derived_partition_all_metrics() {
        assert_eq!(
            Metric::SOURCE.len() + Metric::DERIVED.len(),
            Metric::COUNT,
            "every metric is either a source field or derived"
        );
        for metric in Metric::iter() {
            assert_eq!(metric.is_source(), Metric::SOURCE.contains(&metric));
        }
        assert!(Metric::NON_NEGATIVE.iter().all(|m| m.is_source()));
    }

    #[test]
    fn index_follows_declaration_order() {
        for (idx, metric) in Metric::iter().enumerate() {
            assert_eq!(metric.index(), idx);
        }
    }
}
