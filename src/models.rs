use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Drought severity classes as delivered by the analysis backend (USDM scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DroughtCategory {
    D0,
    D1,
    D2,
    D3,
    D4,
}

impl DroughtCategory {
    pub const ALL: [DroughtCategory; 5] = [
        DroughtCategory::D0,
        DroughtCategory::D1,
        DroughtCategory::D2,
        DroughtCategory::D3,
        DroughtCategory::D4,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DroughtCategory::D0 => "D0",
            DroughtCategory::D1 => "D1",
            DroughtCategory::D2 => "D2",
            DroughtCategory::D3 => "D3",
            DroughtCategory::D4 => "D4",
        }
    }

    /// Style class applied to the category slot, e.g. `nivel-d3`.
    pub fn css_class(&self) -> String {
        format!("nivel-{}", self.code().to_ascii_lowercase())
    }
}

impl fmt::Display for DroughtCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DroughtCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D0" => Ok(DroughtCategory::D0),
            "D1" => Ok(DroughtCategory::D1),
            "D2" => Ok(DroughtCategory::D2),
            "D3" => Ok(DroughtCategory::D3),
            "D4" => Ok(DroughtCategory::D4),
            other => Err(format!("unknown drought category: {other:?}")),
        }
    }
}

/// One calendar day after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: String,
    pub precipitation_mm: f64,
    pub temperature_c: f64,
}

/// Chronologically ordered, equal-length, NaN-free daily rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateSeries {
    pub rows: Vec<DailyObservation>,
}

impl ClimateSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.date.clone()).collect()
    }

    pub fn precipitation(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.precipitation_mm).collect()
    }

    pub fn temperature(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.temperature_c).collect()
    }

    pub fn last_date(&self) -> Option<&str> {
        self.rows.last().map(|r| r.date.as_str())
    }
}

/// One bucket of the monthly precipitation aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month_label: String,
    pub precipitation_mm: f64,
}

/// Averages over the analysis window (`datos` in the payload).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSummary {
    pub precipitacion_promedio: f64,
    pub temperatura_promedio: f64,
    pub evapotranspiracion_promedio: f64,
}

/// Daily columns exactly as received, before coercion and alignment.
///
/// Entries stay as raw JSON values so the normalizer decides how to coerce them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub dates: Vec<serde_json::Value>,
    pub precipitation: Vec<serde_json::Value>,
    pub temperature: Vec<serde_json::Value>,
    pub daily_risk: Option<Vec<serde_json::Value>>,
}

/// Canonical analysis payload after alias resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub indice_sequia: f64,
    /// `None` when the code is not one of `D0`..`D4`; see `codigo_categoria`.
    pub categoria: Option<DroughtCategory>,
    /// Category code exactly as received.
    pub codigo_categoria: String,
    pub nombre_categoria: Option<String>,
    pub datos: ClimateSummary,
    pub series: Option<RawSeries>,
    pub monthly: Vec<MonthlyAggregate>,
}
