//! Query-volume timeline reconstruction.
//!
//! The volume endpoint answers `{"dates": [start_ms, end_ms], "queries": [n0, n1, ...]}`
//! with one count per hour. Only the first timestamp is used: bucket `i` is placed at
//! `dates[0] + i hours`. The server's actual spacing is not checked.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error_handling::InvestigateError;

/// Hourly request counts keyed by bucket start (UTC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryVolumeSeries(BTreeMap<DateTime<Utc>, i64>);

impl QueryVolumeSeries {
    /// Builds the series from an anchor in epoch milliseconds and one count per hour.
    ///
    /// # Errors
    ///
    /// Returns `InvestigateError::MalformedSeries` if the anchor or any bucket falls
    /// outside the representable date range.
    pub fn from_anchor(anchor_millis: i64, counts: &[i64]) -> Result<Self, InvestigateError> {
        let start = DateTime::from_timestamp_millis(anchor_millis).ok_or_else(|| {
            InvestigateError::MalformedSeries(format!("anchor {anchor_millis} out of range"))
        })?;

        let mut buckets = BTreeMap::new();
        for (hour, count) in counts.iter().enumerate() {
            let at = TimeDelta::try_hours(hour as i64)
                .and_then(|offset| start.checked_add_signed(offset))
                .ok_or_else(|| {
                    InvestigateError::MalformedSeries(format!("bucket {hour} out of range"))
                })?;
            buckets.insert(at, *count);
        }
        Ok(Self(buckets))
    }

    /// Rebuilds the series from a decoded volume response.
    ///
    /// # Errors
    ///
    /// Returns `InvestigateError::MalformedSeries` when `dates` or `queries` is missing
    /// or not an array, when a value is not numeric, or when `queries` is non-empty but
    /// `dates` is empty.
    pub fn from_response(value: &Value) -> Result<Self, InvestigateError> {
        let dates = array_field(value, "dates")?;
        let queries = array_field(value, "queries")?
            .iter()
            .map(|q| {
                q.as_i64().ok_or_else(|| {
                    InvestigateError::MalformedSeries(format!("non-integer query count {q}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if queries.is_empty() {
            return Ok(Self::default());
        }

        let anchor = dates.first().ok_or_else(|| {
            InvestigateError::MalformedSeries("'dates' is empty but 'queries' is not".to_string())
        })?;
        let anchor_millis = anchor
            .as_i64()
            .or_else(|| anchor.as_f64().map(|f| f as i64))
            .ok_or_else(|| {
                InvestigateError::MalformedSeries(format!("non-numeric timestamp {anchor}"))
            })?;

        Self::from_anchor(anchor_millis, &queries)
    }

    /// Number of hourly buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series has no buckets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count for the bucket starting at `at`.
    pub fn get(&self, at: &DateTime<Utc>) -> Option<i64> {
        self.0.get(at).copied()
    }

    /// Buckets in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &i64)> {
        self.0.iter()
    }
}

fn array_field<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>, InvestigateError> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| InvestigateError::MalformedSeries(format!("missing '{key}' array")))
}
