//! Stage 1: flatten raw feed records into a uniform, date-bounded table.

use std::collections::HashSet;

use chrono::NaiveDate;
use log::{debug, warn};
use serde_json::Value;

use crate::error::{CovidtrackError, Result};
use crate::observation::RawObservation;
use crate::region::RegionCode;
use crate::COL;

/// Parse the feed's `YYYYMMDD` date, given either as a JSON number or a string.
pub fn parse_date(value: &Value) -> Result<NaiveDate> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(CovidtrackError::MalformedRecord(format!(
                "date is not a number or string: {other}"
            )))
        }
    };
    NaiveDate::parse_from_str(&text, "%Y%m%d")
        .map_err(|e| CovidtrackError::MalformedRecord(format!("unparsable date {text:?}: {e}")))
}

/// Turn one feed record into a [`RawObservation`], failing with `MalformedRecord` when the
/// record is not an object or lacks a valid region code or date.
pub fn parse_record(record: &Value) -> Result<RawObservation> {
    let fields = record.as_object().ok_or_else(|| {
        CovidtrackError::MalformedRecord(format!("record is not an object: {record}"))
    })?;
    let date = fields
        .get(COL::DATE)
        .ok_or_else(|| CovidtrackError::MalformedRecord("missing date".into()))
        .and_then(parse_date)?;
    let region: RegionCode = fields
        .get(COL::STATE)
        .and_then(Value::as_str)
        .ok_or_else(|| CovidtrackError::MalformedRecord(format!("missing state on {date}")))?
        .parse()
        .map_err(|e| CovidtrackError::MalformedRecord(format!("{e} on {date}")))?;
    Ok(RawObservation {
        region,
        date,
        fields: fields.clone(),
    })
}

/// Normalize a full feed snapshot.
///
/// Malformed records and repeated (region, date) pairs are logged and dropped; records
/// dated before `cutoff` are skipped. The result is ordered by region, newest date first.
pub fn normalize(records: &[Value], cutoff: NaiveDate) -> Vec<RawObservation> {
    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let mut observations = Vec::with_capacity(records.len());
    for record in records {
        let obs = match parse_record(record) {
            Ok(obs) => obs,
            Err(e) => {
                warn!("Dropping record: {e}");
                dropped += 1;
                continue;
            }
        };
        if obs.date < cutoff {
            continue;
        }
        if !seen.insert((obs.region.clone(), obs.date)) {
            warn!("Dropping duplicate record for {} {}", obs.region, obs.date);
            dropped += 1;
            continue;
        }
        observations.push(obs);
    }
    observations.sort_by(|a, b| a.region.cmp(&b.region).then(b.date.cmp(&a.date)));
    debug!(
        "Normalized {} of {} records ({dropped} dropped)",
        observations.len(),
        records.len()
    );
    observations
}
