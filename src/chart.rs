//! Declarative chart descriptions and the registry that owns live chart instances.
//!
//! A [`ChartConfig`] says *what* to draw; a [`ChartSurface`] turns it into pixels
//! (see [`crate::viz::SvgSurface`]). The [`ChartRegistry`] holds at most one live
//! instance per [`ChartKind`]; the only mutation is replace-and-dispose, so a surface
//! never holds two instances of the same kind.

use crate::i18n::Translator;
use crate::models::{ClimateSeries, MonthlyAggregate};
use crate::regression::{ProjectedDay, RegressionResult, fitted_values};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Monthly precipitation below this (mm/month) is considered dry.
pub const DROUGHT_THRESHOLD_MM: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChartKind {
    TimeSeries,
    Scatter,
    MonthlyBar,
    Regression,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::TimeSeries,
        ChartKind::Scatter,
        ChartKind::MonthlyBar,
        ChartKind::Regression,
    ];

    /// Catalog key of the chart title.
    pub fn title_key(&self) -> &'static str {
        match self {
            ChartKind::TimeSeries => "lineChartTitle",
            ChartKind::Scatter => "scatterChartTitle",
            ChartKind::MonthlyBar => "barChartTitle",
            ChartKind::Regression => "regressionChart",
        }
    }

    /// Mount point name, also used as the output file stem.
    pub fn mount_id(&self) -> &'static str {
        match self {
            ChartKind::TimeSeries => "chartLine",
            ChartKind::Scatter => "chartScatter",
            ChartKind::MonthlyBar => "chartBar",
            ChartKind::Regression => "chartRegression",
        }
    }
}

/// sRGB color plus opacity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub f64);

pub const PRIMARY: Rgba = Rgba(102, 126, 234, 1.0);
pub const SCATTER: Rgba = Rgba(118, 75, 162, 0.9);
pub const BAR_OK: Rgba = Rgba(102, 126, 234, 0.78);
pub const BAR_DRY: Rgba = Rgba(237, 125, 49, 0.85);
pub const THRESHOLD: Rgba = Rgba(220, 53, 69, 0.95);
pub const FITTED: Rgba = Rgba(40, 167, 69, 1.0);
pub const PROJECTION: Rgba = Rgba(255, 159, 64, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatasetKind {
    /// Line with the area down to zero filled.
    Area,
    Line,
    Scatter,
    Bar,
    /// Constant horizontal line over the whole category axis.
    ReferenceLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SeriesData {
    /// One optional value per category label; `None` leaves a gap.
    Indexed(Vec<Option<f64>>),
    /// Free `(x, y)` pairs.
    Points(Vec<(f64, f64)>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub kind: DatasetKind,
    pub data: SeriesData,
    pub color: Rgba,
    /// Per-bar override colors (bar datasets only); empty means `color` everywhere.
    pub bar_colors: Vec<Rgba>,
}

impl Dataset {
    fn indexed(label: String, kind: DatasetKind, values: Vec<Option<f64>>, color: Rgba) -> Self {
        Self {
            label,
            kind,
            data: SeriesData::Indexed(values),
            color,
            bar_colors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    /// Category axis labels for indexed datasets; empty for pure point charts.
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartConfig {
    /// Daily precipitation over time, filled.
    pub fn time_series(series: &ClimateSeries, tr: &Translator<'_>) -> Self {
        Self {
            kind: ChartKind::TimeSeries,
            title: tr.chart_title(ChartKind::TimeSeries).to_string(),
            x_title: tr.text("axisDate").to_string(),
            y_title: tr.text("axisPrecipitation").to_string(),
            labels: series.dates(),
            datasets: vec![Dataset::indexed(
                tr.text("seriesPrecipitation").to_string(),
                DatasetKind::Area,
                series.precipitation().into_iter().map(Some).collect(),
                PRIMARY,
            )],
        }
    }

    /// One point per day: precipitation (x) against temperature (y).
    pub fn scatter(series: &ClimateSeries, tr: &Translator<'_>) -> Self {
        Self {
            kind: ChartKind::Scatter,
            title: tr.chart_title(ChartKind::Scatter).to_string(),
            x_title: tr.text("axisPrecipitation").to_string(),
            y_title: tr.text("axisTemperature").to_string(),
            labels: Vec::new(),
            datasets: vec![Dataset {
                label: tr.text("seriesRainVsTemp").to_string(),
                kind: DatasetKind::Scatter,
                data: SeriesData::Points(
                    series
                        .rows
                        .iter()
                        .map(|r| (r.precipitation_mm, r.temperature_c))
                        .collect(),
                ),
                color: SCATTER,
                bar_colors: Vec::new(),
            }],
        }
    }

    /// Monthly bars with the drought threshold overlaid; dry months get their own color.
    pub fn monthly_bar(monthly: &[MonthlyAggregate], tr: &Translator<'_>) -> Self {
        let values: Vec<f64> = monthly.iter().map(|m| m.precipitation_mm).collect();
        let bar_colors = values
            .iter()
            .map(|v| if *v < DROUGHT_THRESHOLD_MM { BAR_DRY } else { BAR_OK })
            .collect();
        let bars = Dataset {
            label: tr.text("seriesMonthlyRain").to_string(),
            kind: DatasetKind::Bar,
            data: SeriesData::Indexed(values.iter().copied().map(Some).collect()),
            color: BAR_OK,
            bar_colors,
        };
        let threshold = Dataset::indexed(
            format!("{} {} mm/mes", tr.text("seriesThreshold"), DROUGHT_THRESHOLD_MM),
            DatasetKind::ReferenceLine,
            vec![Some(DROUGHT_THRESHOLD_MM); values.len()],
            THRESHOLD,
        );
        Self {
            kind: ChartKind::MonthlyBar,
            title: tr.chart_title(ChartKind::MonthlyBar).to_string(),
            x_title: tr.text("axisMonth").to_string(),
            y_title: tr.text("axisRain").to_string(),
            labels: monthly.iter().map(|m| m.month_label.clone()).collect(),
            datasets: vec![bars, threshold],
        }
    }

    /// Observed, fitted and projected precipitation sharing one date axis.
    ///
    /// Historical series are padded with `None` over the projection range and the
    /// projection is padded with `None` over the history, so all three line up.
    pub fn regression(
        series: &ClimateSeries,
        model: &RegressionResult,
        projection: &[ProjectedDay],
        tr: &Translator<'_>,
    ) -> Self {
        let n = series.len();
        let future = projection.len();
        let pad = |k: usize| std::iter::repeat_n(None, k);

        let mut labels = series.dates();
        labels.extend(projection.iter().map(|p| p.date.clone()));

        let observed = series
            .precipitation()
            .into_iter()
            .map(Some)
            .chain(pad(future))
            .collect();
        let fitted = fitted_values(model, n)
            .into_iter()
            .map(Some)
            .chain(pad(future))
            .collect();
        let projected = pad(n)
            .chain(projection.iter().map(|p| Some(p.predicted_mm)))
            .collect();

        let r2 = model
            .r_squared
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "n/a".to_string());

        Self {
            kind: ChartKind::Regression,
            title: tr.chart_title(ChartKind::Regression).to_string(),
            x_title: tr.text("axisDate").to_string(),
            y_title: tr.text("axisPrecipitation").to_string(),
            labels,
            datasets: vec![
                Dataset::indexed(
                    tr.text("seriesObserved").to_string(),
                    DatasetKind::Line,
                    observed,
                    PRIMARY,
                ),
                Dataset::indexed(
                    tr.text("seriesFitted").to_string(),
                    DatasetKind::Line,
                    fitted,
                    FITTED,
                ),
                Dataset::indexed(
                    format!("{} (R² = {r2})", tr.text("seriesProjection")),
                    DatasetKind::Line,
                    projected,
                    PROJECTION,
                ),
            ],
        }
    }
}

/// Opaque reference to an instance living on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartHandle(pub u64);

/// Something that can hold rendered charts.
pub trait ChartSurface {
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle>;
    /// Redraw an existing instance after its config changed in place.
    fn refresh(&mut self, handle: ChartHandle, config: &ChartConfig) -> Result<()>;
    /// Release everything held for `handle`. Unknown handles are ignored.
    fn destroy(&mut self, handle: ChartHandle);
}

/// Surface that only keeps the configs; used when no output directory is set.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next: u64,
    live: BTreeMap<ChartHandle, ChartConfig>,
    pub created: usize,
    pub refreshed: usize,
    pub destroyed: usize,
}

impl MemorySurface {
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn config(&self, handle: ChartHandle) -> Option<&ChartConfig> {
        self.live.get(&handle)
    }
}

impl ChartSurface for MemorySurface {
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle> {
        self.next += 1;
        let handle = ChartHandle(self.next);
        self.live.insert(handle, config.clone());
        self.created += 1;
        Ok(handle)
    }

    fn refresh(&mut self, handle: ChartHandle, config: &ChartConfig) -> Result<()> {
        let slot = self
            .live
            .get_mut(&handle)
            .with_context(|| format!("no live chart for {handle:?}"))?;
        *slot = config.clone();
        self.refreshed += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartInstance {
    pub handle: ChartHandle,
    pub config: ChartConfig,
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    live: BTreeMap<ChartKind, ChartInstance>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispose the live instance of `config.kind` (if any), then create the new one.
    ///
    /// When creation fails the slot stays empty; the old instance is already released.
    pub fn replace(
        &mut self,
        surface: &mut dyn ChartSurface,
        config: ChartConfig,
    ) -> Result<ChartHandle> {
        let kind = config.kind;
        self.dispose(surface, kind);
        let handle = surface
            .create(&config)
            .with_context(|| format!("create {kind:?} chart"))?;
        self.live.insert(kind, ChartInstance { handle, config });
        Ok(handle)
    }

    /// Release the instance of `kind`. Returns whether one was live.
    pub fn dispose(&mut self, surface: &mut dyn ChartSurface, kind: ChartKind) -> bool {
        match self.live.remove(&kind) {
            Some(old) => {
                surface.destroy(old.handle);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        for kind in ChartKind::ALL {
            self.dispose(surface, kind);
        }
    }

    /// Replace only the title of a live instance. Data is untouched.
    pub fn retitle(
        &mut self,
        surface: &mut dyn ChartSurface,
        kind: ChartKind,
        title: &str,
    ) -> Result<bool> {
        let Some(instance) = self.live.get_mut(&kind) else {
            return Ok(false);
        };
        if instance.config.title != title {
            instance.config.title = title.to_string();
            surface.refresh(instance.handle, &instance.config)?;
        }
        Ok(true)
    }

    pub fn get(&self, kind: ChartKind) -> Option<&ChartInstance> {
        self.live.get(&kind)
    }

    pub fn live_kinds(&self) -> impl Iterator<Item = ChartKind> + '_ {
        self.live.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
