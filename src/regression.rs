//! Ordinary least squares over the day index and a fixed-horizon precipitation projection.

use crate::error::RegressionError;
use crate::models::ClimateSeries;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Days projected past the last observation.
pub const PROJECTION_DAYS: usize = 30;

/// Date layouts accepted for the projection; output reuses the layout that matched.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when every y is identical (zero total variance).
    pub r_squared: Option<f64>,
}

impl RegressionResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedDay {
    pub date: String,
    pub predicted_mm: f64,
}

/// Fit precipitation against day index `0..N`.
pub fn fit(series: &ClimateSeries) -> Result<RegressionResult, RegressionError> {
    fit_values(&series.precipitation())
}

/// Fit `ys` against `x = 0..ys.len()`.
///
/// ### Errors
/// [`RegressionError::InsufficientData`] for fewer than two points, where the slope
/// denominator `N·Σx² − (Σx)²` vanishes.
pub fn fit_values(ys: &[f64]) -> Result<RegressionResult, RegressionError> {
    let len = ys.len();
    if len < 2 {
        return Err(RegressionError::InsufficientData(len));
    }
    let n = len as f64;

    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let denom = n * sxx - sx * sx;
    if denom == 0.0 {
        return Err(RegressionError::InsufficientData(len));
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;

    let first = ys[0];
    let r_squared = if ys.iter().all(|y| *y == first) {
        None
    } else {
        let mean = sy / n;
        let ss_total: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
        let ss_residual: f64 = ys
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();
        if ss_total > 0.0 {
            Some(1.0 - ss_residual / ss_total)
        } else {
            None
        }
    };

    Ok(RegressionResult {
        slope,
        intercept,
        r_squared,
    })
}

/// Fitted line evaluated on the historical index range `0..n`.
pub fn fitted_values(model: &RegressionResult, n: usize) -> Vec<f64> {
    (0..n).map(|i| model.predict(i as f64)).collect()
}

/// Parse a date in one of the accepted layouts, returning the layout that matched.
pub fn parse_day(s: &str) -> Option<(NaiveDateTime, &'static str)> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some((d.and_time(NaiveTime::MIN), *fmt));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some((dt, *fmt));
        }
    }
    None
}

/// Project `horizon` days past the end of `series`.
///
/// Day `i` (0-based) sits at index `N + i`, is dated `last + (i + 1)` days, and is
/// floored at zero since precipitation cannot be negative.
pub fn project(
    series: &ClimateSeries,
    model: &RegressionResult,
    horizon: usize,
) -> Result<Vec<ProjectedDay>, RegressionError> {
    let last = series
        .last_date()
        .ok_or(RegressionError::InsufficientData(0))?;
    let (last, fmt) = parse_day(last).ok_or(RegressionError::UnparseableDate)?;
    let n = series.len();

    (0..horizon)
        .map(|i| {
            let date = last
                .checked_add_days(Days::new(i as u64 + 1))
                .ok_or(RegressionError::UnparseableDate)?;
            Ok(ProjectedDay {
                date: date.format(fmt).to_string(),
                predicted_mm: model.predict((n + i) as f64).max(0.0),
            })
        })
        .collect()
}
