//! This module stores the names of the non-metric columns of the upstream feed and of the
//! tables produced from it. Metric column names are carried by [`crate::metric::Metric`].
//! Note that the feed names must stay synchronised with the upstream daily report schema!

/// Report date, `YYYYMMDD` in the feed.
pub const DATE: &str = "date";
/// Two-letter region code.
pub const STATE: &str = "state";

pub const CATEGORY: &str = "category";
pub const POPULATION: &str = "population";
