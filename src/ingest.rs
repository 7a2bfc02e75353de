//! Resolve the loosely-keyed analysis payload into the canonical [`AnalysisReport`].
//!
//! The backend has shipped several spellings for the same logical field over time.
//! Each logical field has an ordered alias list; the first alias whose key exists and
//! is not `null` wins. Resolution happens once here so rendering code only ever sees
//! canonical names.

use crate::error::AnalysisError;
use crate::models::{AnalysisReport, ClimateSummary, DroughtCategory, MonthlyAggregate, RawSeries};
use crate::normalize::coerce_number;
use serde_json::{Map, Value};

pub const CATEGORY_ALIASES: &[&str] = &["categoria", "nivel_riesgo"];
pub const RAIN_ALIASES: &[&str] = &["lluvia_mm", "lluvia", "precipitacion"];
pub const TEMPERATURE_ALIASES: &[&str] = &["temperatura_c", "temp_c"];
pub const MONTHLY_ALIASES: &[&str] = &["promedio_mensual", "monthly_promedio"];
pub const MONTH_LABEL_ALIASES: &[&str] = &["mes", "month"];
pub const MONTH_RAIN_ALIASES: &[&str] = RAIN_ALIASES;

/// First alias present (and non-null) in `obj`, in precedence order.
pub fn first_present<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

/// Parse a decoded response body.
///
/// ### Errors
/// - [`AnalysisError::Application`] when `success` is not `true`, carrying the server message
/// - [`AnalysisError::Malformed`] when a successful body lacks the summary fields
pub fn parse_analysis(body: &Value) -> Result<AnalysisReport, AnalysisError> {
    let obj = body
        .as_object()
        .ok_or_else(|| AnalysisError::Malformed("expected a JSON object".into()))?;

    let success = obj.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = obj
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(String::from);
        return Err(AnalysisError::Application(message));
    }

    let indice_sequia = obj
        .get("indice_sequia")
        .and_then(Value::as_f64)
        .ok_or_else(|| AnalysisError::Malformed("missing numeric `indice_sequia`".into()))?;

    let codigo_categoria = first_present(obj, CATEGORY_ALIASES)
        .and_then(Value::as_str)
        .unwrap_or(DroughtCategory::D0.code())
        .to_string();
    let categoria = match codigo_categoria.parse::<DroughtCategory>() {
        Ok(c) => Some(c),
        Err(e) => {
            log::warn!("{e}; showing it as received");
            None
        }
    };

    let nombre_categoria = obj
        .get("nombre_categoria")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(String::from);

    let datos = parse_summary(obj.get("datos"))?;
    let series = obj.get("series").and_then(parse_series);
    let monthly = first_present(obj, MONTHLY_ALIASES)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_month).collect())
        .unwrap_or_default();

    Ok(AnalysisReport {
        indice_sequia,
        categoria,
        codigo_categoria,
        nombre_categoria,
        datos,
        series,
        monthly,
    })
}

fn parse_summary(v: Option<&Value>) -> Result<ClimateSummary, AnalysisError> {
    let obj = v
        .and_then(Value::as_object)
        .ok_or_else(|| AnalysisError::Malformed("missing `datos` object".into()))?;
    let field = |name: &str| -> Result<f64, AnalysisError> {
        obj.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| AnalysisError::Malformed(format!("missing numeric `datos.{name}`")))
    };
    Ok(ClimateSummary {
        precipitacion_promedio: field("precipitacion_promedio")?,
        temperatura_promedio: field("temperatura_promedio")?,
        evapotranspiracion_promedio: field("evapotranspiracion_promedio")?,
    })
}

fn array_of(v: Option<&Value>) -> Vec<Value> {
    v.and_then(Value::as_array).cloned().unwrap_or_default()
}

fn parse_series(v: &Value) -> Option<RawSeries> {
    let Some(obj) = v.as_object() else {
        log::warn!("ignoring non-object `series` field");
        return None;
    };
    Some(RawSeries {
        dates: array_of(obj.get("fechas")),
        precipitation: array_of(first_present(obj, RAIN_ALIASES)),
        temperature: array_of(first_present(obj, TEMPERATURE_ALIASES)),
        daily_risk: obj
            .get("riesgo_diario")
            .and_then(Value::as_array)
            .cloned(),
    })
}

fn parse_month(v: &Value) -> Option<MonthlyAggregate> {
    let obj = v.as_object()?;
    let month_label = first_present(obj, MONTH_LABEL_ALIASES)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let precipitation_mm = first_present(obj, MONTH_RAIN_ALIASES)
        .map(coerce_number)
        .unwrap_or(0.0);
    Some(MonthlyAggregate {
        month_label,
        precipitation_mm,
    })
}
