//! Align and clean the raw daily columns into a [`ClimateSeries`].
//!
//! Policy: data availability over strict correctness. Values that cannot be read as a
//! number become `0.0`; values that read as NaN or infinity drop their whole row.

use crate::models::{ClimateSeries, DailyObservation};
use serde_json::Value;

/// Coerce one raw JSON value to a number.
///
/// Numbers pass through, numeric strings are parsed (surrounding whitespace ignored).
/// Booleans read as `1.0`/`0.0`. `null`, objects, arrays, empty and unparseable
/// strings yield `0.0`.
/// Strings spelling `NaN`/`inf` yield the corresponding non-finite value.
pub fn coerce_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn coerce_date(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Truncate to the shortest column, coerce, and drop rows with a non-finite component.
pub fn normalize(dates: &[Value], precipitation: &[Value], temperature: &[Value]) -> ClimateSeries {
    let n = dates.len().min(precipitation.len()).min(temperature.len());
    let mut dropped = 0usize;
    let rows: Vec<DailyObservation> = (0..n)
        .filter_map(|i| {
            let precipitation_mm = coerce_number(&precipitation[i]);
            let temperature_c = coerce_number(&temperature[i]);
            if precipitation_mm.is_finite() && temperature_c.is_finite() {
                Some(DailyObservation {
                    date: coerce_date(&dates[i]),
                    precipitation_mm,
                    temperature_c,
                })
            } else {
                dropped += 1;
                None
            }
        })
        .collect();

    if n < dates.len().max(precipitation.len()).max(temperature.len()) {
        log::debug!(
            "series lengths differ (dates={}, rain={}, temp={}); truncated to {}",
            dates.len(),
            precipitation.len(),
            temperature.len(),
            n
        );
    }
    if dropped > 0 {
        log::warn!("dropped {dropped} non-finite row(s) from daily series");
    }
    ClimateSeries { rows }
}

/// Coerce a single numeric column, skipping non-finite entries.
pub fn finite_values(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .map(coerce_number)
        .filter(|v| v.is_finite())
        .collect()
}
