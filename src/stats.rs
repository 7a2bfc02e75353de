use crate::models::{ClimateSeries, MonthlyAggregate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rainy-day counts over a daily precipitation series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RainSummary {
    pub rainy_days: usize,
    pub total_days: usize,
    pub rainy_pct: f64,
}

/// A day counts as rainy when it recorded more than 0 mm.
pub fn rain_summary(precipitation: &[f64]) -> RainSummary {
    let total_days = precipitation.len();
    let rainy_days = precipitation.iter().filter(|v| **v > 0.0).count();
    let rainy_pct = if total_days > 0 {
        rainy_days as f64 * 100.0 / total_days as f64
    } else {
        0.0
    };
    RainSummary {
        rainy_days,
        total_days,
        rainy_pct,
    }
}

/// Sum precipitation per `YYYY-MM`, in calendar order.
///
/// Dates shorter than seven characters are skipped; `DD/MM/YYYY` dates are
/// rearranged first.
pub fn monthly_totals(series: &ClimateSeries) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for row in &series.rows {
        let Some(key) = month_key(&row.date) else {
            continue;
        };
        *months.entry(key).or_default() += row.precipitation_mm;
    }
    months
        .into_iter()
        .map(|(month_label, precipitation_mm)| MonthlyAggregate {
            month_label,
            precipitation_mm,
        })
        .collect()
}

fn month_key(date: &str) -> Option<String> {
    let date = date.trim();
    let bytes = date.as_bytes();
    if bytes.len() >= 10 && bytes[2] == b'/' && bytes[5] == b'/' {
        return Some(format!("{}-{}", date.get(6..10)?, date.get(3..5)?));
    }
    if bytes.len() >= 7 && bytes[..4].iter().all(u8::is_ascii_digit) {
        return Some(format!("{}-{}", date.get(..4)?, date.get(5..7)?));
    }
    None
}
