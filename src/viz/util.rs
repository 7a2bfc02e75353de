//! Utility functions for visualization: colors, axis ranges, tick formatting.

use crate::chart::{ChartConfig, DatasetKind, Rgba, SeriesData};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

#[inline]
pub fn rgba(c: Rgba) -> RGBAColor {
    RGBAColor(c.0, c.1, c.2, c.3)
}

/// Tick label: fewer decimals as magnitude grows.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    let prec = if a >= 100.0 {
        0
    } else if a >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", prec, v)
}

/// Contiguous runs of `Some` values as `(index, value)` segments.
pub fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut cur: Vec<(f64, f64)> = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(y) if y.is_finite() => cur.push((i as f64, *y)),
            _ => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// X range: category slots `-0.5..n-0.5` for indexed charts, padded extent for point charts.
pub fn x_range(config: &ChartConfig) -> (f64, f64) {
    let mut slots = config.labels.len();
    let mut xs: Vec<f64> = Vec::new();
    for ds in &config.datasets {
        match &ds.data {
            SeriesData::Indexed(v) => slots = slots.max(v.len()),
            SeriesData::Points(p) => xs.extend(p.iter().map(|(x, _)| *x).filter(|x| x.is_finite())),
        }
    }
    if !xs.is_empty() {
        return padded(xs.into_iter());
    }
    if slots == 0 {
        (0.0, 1.0)
    } else {
        (-0.5, slots as f64 - 0.5)
    }
}

/// Y range over every finite value; bars and areas always include zero.
pub fn y_range(config: &ChartConfig) -> (f64, f64) {
    let mut ys: Vec<f64> = Vec::new();
    for ds in &config.datasets {
        match &ds.data {
            SeriesData::Indexed(v) => ys.extend(v.iter().flatten().copied()),
            SeriesData::Points(p) => ys.extend(p.iter().map(|(_, y)| *y)),
        }
        if matches!(ds.kind, DatasetKind::Area | DatasetKind::Bar) {
            ys.push(0.0);
        }
    }
    padded(ys.into_iter().filter(|y| y.is_finite()))
}

fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (if lo == 0.0 { 0.0 } else { lo - pad }, hi + pad)
}

/// Compute a tight left label area width for the Y axis (in pixels),
/// based on the formatted tick labels that will appear.
///
/// Returns a width clamped to a sensible range to avoid extremes.
pub fn compute_left_label_area_px(ymin: f64, ymax: f64, ticks: usize, font_px: u32) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let s = format_tick(ymin + (ymax - ymin) * t);
        max_px = max_px.max(estimate_text_width_px(&s, font_px));
    }
    // tick marks + axis description
    max_px.saturating_add(30).clamp(48, 140)
}
