use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::correction::CorrectionRule;
use crate::derived::IcuShift;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Daily per-region report feed, returning a JSON array of flat records.
    pub source_url: String,
    /// Records dated before this are dropped during ingestion.
    pub cutoff_date: NaiveDate,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub icu_shift: IcuShift,
    /// Applied on top of the built-in corrections.
    pub corrections: Vec<CorrectionRule>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: "https://api.covidtracking.com/v1/states/daily.json".into(),
            cutoff_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or_default(),
            request_timeout_secs: 30,
            refresh_interval_secs: 30,
            icu_shift: IcuShift::default(),
            corrections: vec![],
        }
    }
}
