use crate::models::ClimateSeries;
use crate::regression::{ProjectedDay, RegressionResult, fitted_values};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One exported row: an observed day or a projected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub precipitation_mm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub fitted_mm: Option<f64>,
    pub projected_mm: Option<f64>,
}

/// Observed rows followed by projected rows, on one date axis.
pub fn export_rows(
    series: &ClimateSeries,
    model: Option<&RegressionResult>,
    projection: &[ProjectedDay],
) -> Vec<ExportRow> {
    let fitted = model
        .map(|m| fitted_values(m, series.len()))
        .unwrap_or_default();
    let observed = series.rows.iter().enumerate().map(|(i, r)| ExportRow {
        date: r.date.clone(),
        precipitation_mm: Some(r.precipitation_mm),
        temperature_c: Some(r.temperature_c),
        fitted_mm: fitted.get(i).copied(),
        projected_mm: None,
    });
    let projected = projection.iter().map(|p| ExportRow {
        date: p.date.clone(),
        precipitation_mm: None,
        temperature_c: None,
        fitted_mm: None,
        projected_mm: Some(p.predicted_mm),
    });
    observed.chain(projected).collect()
}

/// Save rows as CSV with header.
pub fn save_csv<P: AsRef<Path>>(rows: &[ExportRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.serialize(("date", "precipitation_mm", "temperature_c", "fitted_mm", "projected_mm"))?;
    for r in rows {
        wtr.serialize((
            &r.date,
            r.precipitation_mm,
            r.temperature_c,
            r.fitted_mm,
            r.projected_mm,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save rows as a pretty JSON array.
pub fn save_json<P: AsRef<Path>>(rows: &[ExportRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Pick the format from the extension: `.json` writes JSON, anything else CSV.
pub fn save<P: AsRef<Path>>(rows: &[ExportRow], path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => save_json(rows, path),
        _ => save_csv(rows, path),
    }
}
