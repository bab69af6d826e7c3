use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CovidtrackError;

/// A two-letter region code (U.S. state, territory, or the `NA` national pseudo-region).
///
/// Parsing is case insensitive and always yields the upper-case form. Any syntactically valid
/// code is accepted; whether the data contains it is a question for the views.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RegionCode {
    type Err = CovidtrackError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(value.to_ascii_uppercase()))
        } else {
            Err(CovidtrackError::InvalidRegion(value.to_string()))
        }
    }
}

impl TryFrom<String> for RegionCode {
    type Error = CovidtrackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionCode> for String {
    fn from(value: RegionCode) -> Self {
        value.0
    }
}

impl Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_should_parse_if_two_letters() {
        let region = RegionCode::from_str("nj");
        assert!(region.is_ok(), "A two letter code should parse");
        assert_eq!(region.unwrap().as_str(), "NJ", "Codes are upper-cased");
    }

    #[test]
    fn region_should_not_parse_if_incorrect() {
        assert!(RegionCode::from_str("N").is_err(), "Too short");
        assert!(RegionCode::from_str("NJY").is_err(), "Too long");
        assert!(RegionCode::from_str("N1").is_err(), "Digits are not codes");
        assert!(RegionCode::from_str("").is_err(), "Empty is not a code");
    }

    #[test]
    fn region_should_round_trip_through_json() {
        let region: RegionCode = "ny".parse().unwrap();
        let json = serde_json::to_string(&region).unwrap();
        assert_eq!(json, "\"NY\"");
        let back: RegionCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, region);
        assert!(serde_json::from_str::<RegionCode>("\"New York\"").is_err());
    }
}
