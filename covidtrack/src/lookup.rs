//! Static per-region lookups joined onto the canonical table during enrichment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::region::RegionCode;

/// Political category of a region, taken from the 2016 presidential election result.
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
)]
pub enum Category {
    #[strum(serialize = "States Won By Clinton")]
    WonByClinton,
    #[strum(serialize = "States Won By Trump")]
    WonByTrump,
}

/// Region selector options: every code the daily feed reports, with its display label.
pub const REGIONS: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MP", "Northern Mariana Islands"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NA", "National"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VI", "Virgin Islands"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

/// 2019 population estimates for the fifty states and DC.
const POPULATIONS: &[(&str, f64)] = &[
    ("AK", 731545.0),
    ("AL", 4903185.0),
    ("AR", 3017804.0),
    ("AZ", 7278717.0),
    ("CA", 39512223.0),
    ("CO", 5758736.0),
    ("CT", 3565287.0),
    ("DC", 705749.0),
    ("DE", 973764.0),
    ("FL", 21477737.0),
    ("GA", 10617423.0),
    ("HI", 1415872.0),
    ("IA", 3155070.0),
    ("ID", 1787065.0),
    ("IL", 12671821.0),
    ("IN", 6732219.0),
    ("KS", 2913314.0),
    ("KY", 4467673.0),
    ("LA", 4648794.0),
    ("MA", 6892503.0),
    ("MD", 6045680.0),
    ("ME", 1344212.0),
    ("MI", 9986857.0),
    ("MN", 5639632.0),
    ("MO", 6137428.0),
    ("MS", 2976149.0),
    ("MT", 1068778.0),
    ("NC", 10488084.0),
    ("ND", 762062.0),
    ("NE", 1934408.0),
    ("NH", 1359711.0),
    ("NJ", 8882190.0),
    ("NM", 2096829.0),
    ("NV", 3080156.0),
    ("NY", 19453561.0),
    ("OH", 11689100.0),
    ("OK", 3956971.0),
    ("OR", 4217737.0),
    ("PA", 12801989.0),
    ("RI", 1059361.0),
    ("SC", 5148714.0),
    ("SD", 884659.0),
    ("TN", 6829174.0),
    ("TX", 28995881.0),
    ("UT", 3205958.0),
    ("VA", 8535519.0),
    ("VT", 623989.0),
    ("WA", 7614893.0),
    ("WI", 5822434.0),
    ("WV", 1792147.0),
    ("WY", 578759.0),
];

/// 2016 presidential election outcome per state. Territories have no entry.
const CATEGORIES: &[(&str, Category)] = &[
    ("AK", Category::WonByTrump),
    ("AL", Category::WonByTrump),
    ("AR", Category::WonByTrump),
    ("AZ", Category::WonByTrump),
    ("CA", Category::WonByClinton),
    ("CO", Category::WonByClinton),
    ("CT", Category::WonByClinton),
    ("DC", Category::WonByClinton),
    ("DE", Category::WonByClinton),
    ("FL", Category::WonByTrump),
    ("GA", Category::WonByTrump),
    ("HI", Category::WonByClinton),
    ("IA", Category::WonByTrump),
    ("ID", Category::WonByTrump),
    ("IL", Category::WonByClinton),
    ("IN", Category::WonByTrump),
    ("KS", Category::WonByTrump),
    ("KY", Category::WonByTrump),
    ("LA", Category::WonByTrump),
    ("MA", Category::WonByClinton),
    ("MD", Category::WonByClinton),
    ("ME", Category::WonByClinton),
    ("MI", Category::WonByTrump),
    ("MN", Category::WonByClinton),
    ("MO", Category::WonByTrump),
    ("MS", Category::WonByTrump),
    ("MT", Category::WonByTrump),
    ("NC", Category::WonByTrump),
    ("ND", Category::WonByTrump),
    ("NE", Category::WonByTrump),
    ("NH", Category::WonByClinton),
    ("NJ", Category::WonByClinton),
    ("NM", Category::WonByClinton),
    ("NV", Category::WonByClinton),
    ("NY", Category::WonByClinton),
    ("OH", Category::WonByTrump),
    ("OK", Category::WonByTrump),
    ("OR", Category::WonByClinton),
    ("PA", Category::WonByTrump),
    ("RI", Category::WonByClinton),
    ("SC", Category::WonByTrump),
    ("SD", Category::WonByTrump),
    ("TN", Category::WonByTrump),
    ("TX", Category::WonByTrump),
    ("UT", Category::WonByTrump),
    ("VA", Category::WonByClinton),
    ("VT", Category::WonByClinton),
    ("WA", Category::WonByClinton),
    ("WI", Category::WonByTrump),
    ("WV", Category::WonByTrump),
    ("WY", Category::WonByTrump),
];

/// Full display name of a region, if it is one of the selector options.
pub fn region_name(region: &RegionCode) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(code, _)| *code == region.as_str())
        .map(|(_, name)| *name)
}

fn from_table<T: Copy>(table: &[(&str, T)]) -> HashMap<RegionCode, T> {
    table
        .iter()
        .filter_map(|(code, value)| code.parse().ok().map(|region| (region, *value)))
        .collect()
}

/// Maps a region to its [`Category`]. Regions without an entry are left out of
/// category-grouped views.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryLookup(HashMap<RegionCode, Category>);

impl CategoryLookup {
    pub fn get(&self, region: &RegionCode) -> Option<Category> {
        self.0.get(region).copied()
    }
}

impl Default for CategoryLookup {
    fn default() -> Self {
        Self(from_table(CATEGORIES))
    }
}

impl FromIterator<(RegionCode, Category)> for CategoryLookup {
    fn from_iter<I: IntoIterator<Item = (RegionCode, Category)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Maps a region to its population. Only used as the divisor of per-capita scaling;
/// regions without an entry are left out of per-capita views.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationLookup(HashMap<RegionCode, f64>);

impl PopulationLookup {
    pub fn get(&self, region: &RegionCode) -> Option<f64> {
        self.0.get(region).copied()
    }
}

impl Default for PopulationLookup {
    fn default() -> Self {
        Self(from_table(POPULATIONS))
    }
}

impl FromIterator<(RegionCode, f64)> for PopulationLookup {
    fn from_iter<I: IntoIterator<Item = (RegionCode, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
