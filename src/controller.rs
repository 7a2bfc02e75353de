//! Submission lifecycle: validate, mark loading, fetch, then display or report.
//!
//! ```text
//! Idle --begin--> Loading --complete--> Idle
//! ```
//!
//! [`AnalysisController::submit`] runs the whole cycle. `begin` and `complete` are
//! exposed separately so callers that overlap submissions can exercise the
//! [`SubmissionPolicy`].

use crate::api::AnalysisSource;
use crate::chart::{ChartConfig, ChartKind};
use crate::error::{AnalysisError, RegressionError};
use crate::i18n::{Catalog, Translator};
use crate::ingest::parse_analysis;
use crate::models::{AnalysisReport, ClimateSeries, DroughtCategory, MonthlyAggregate};
use crate::normalize::{finite_values, normalize};
use crate::regression::{self, PROJECTION_DAYS, ProjectedDay, RegressionResult};
use crate::stats::{RainSummary, monthly_totals, rain_summary};
use crate::view::{ElementId, Page};
use crate::viz::canvas::risk_curve_svg;
use serde_json::Value;

/// What happens when a submission starts while another is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPolicy {
    /// Refuse the new submission with [`AnalysisError::Busy`].
    #[default]
    RejectWhileLoading,
    /// Accept it; only the response to the latest submission is displayed.
    DiscardStale,
}

impl std::str::FromStr for SubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(SubmissionPolicy::RejectWhileLoading),
            "discard-stale" | "latest" => Ok(SubmissionPolicy::DiscardStale),
            other => Err(format!("unknown submission policy: {other:?}")),
        }
    }
}

/// An accepted submission awaiting its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    municipio: String,
}

impl Ticket {
    pub fn municipio(&self) -> &str {
        &self.municipio
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything computed while displaying one successful response.
#[derive(Debug, Clone)]
pub struct AnalysisView {
    pub municipio: String,
    pub report: AnalysisReport,
    pub series: ClimateSeries,
    pub rain: RainSummary,
    pub regression: Result<RegressionResult, RegressionError>,
    pub projection: Vec<ProjectedDay>,
    pub monthly: Vec<MonthlyAggregate>,
    /// Kinds rendered by this display, in render order.
    pub charts: Vec<ChartKind>,
    /// Kinds whose rendering failed; the rest of the display went ahead.
    pub chart_failures: Vec<ChartKind>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Displayed(Box<AnalysisView>),
    Failed(AnalysisError),
    /// A newer submission superseded this one.
    Discarded,
}

pub struct AnalysisController<'c, S: AnalysisSource> {
    source: S,
    catalog: &'c Catalog,
    policy: SubmissionPolicy,
    generation: u64,
    derive_monthly: bool,
    risk_size: (u32, u32),
}

impl<'c, S: AnalysisSource> AnalysisController<'c, S> {
    pub fn new(source: S, catalog: &'c Catalog) -> Self {
        Self {
            source,
            catalog,
            policy: SubmissionPolicy::default(),
            generation: 0,
            derive_monthly: false,
            risk_size: (600, 160),
        }
    }

    pub fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sum the daily series per month when the response carries no monthly list.
    pub fn with_derived_monthly(mut self, on: bool) -> Self {
        self.derive_monthly = on;
        self
    }

    pub fn with_risk_size(mut self, width: u32, height: u32) -> Self {
        self.risk_size = (width, height);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate and move to loading. No request is issued here.
    pub fn begin(&mut self, page: &mut Page, municipio: &str) -> Result<Ticket, AnalysisError> {
        let tr = self.catalog.translator(page.locale);
        let municipio = municipio.trim();
        if municipio.is_empty() {
            page.view.show_error(tr.text("errorNoMunicipality"));
            return Err(AnalysisError::Validation);
        }
        if page.view.is_loading() && self.policy == SubmissionPolicy::RejectWhileLoading {
            log::warn!("rejecting {municipio:?}: an analysis is already in progress");
            return Err(AnalysisError::Busy);
        }

        page.view.clear_outcome();
        page.view.set_loading(true);
        self.generation += 1;
        log::info!("analysis #{} requested for {municipio}", self.generation);
        Ok(Ticket {
            generation: self.generation,
            municipio: municipio.to_string(),
        })
    }

    pub fn fetch(&self, ticket: &Ticket) -> Result<Value, AnalysisError> {
        self.source.fetch_analysis(&ticket.municipio)
    }

    /// Apply a response. Stale tickets leave the page untouched.
    pub fn complete(
        &mut self,
        page: &mut Page,
        ticket: Ticket,
        response: Result<Value, AnalysisError>,
    ) -> Outcome {
        if ticket.generation != self.generation {
            log::info!(
                "discarding stale response #{} for {}",
                ticket.generation,
                ticket.municipio
            );
            return Outcome::Discarded;
        }
        page.view.set_loading(false);

        match response.and_then(|body| parse_analysis(&body)) {
            Ok(report) => Outcome::Displayed(Box::new(self.display(page, ticket.municipio, report))),
            Err(err) => {
                let tr = self.catalog.translator(page.locale);
                page.view.show_error(error_message(&tr, &err));
                Outcome::Failed(err)
            }
        }
    }

    /// Validate, fetch and display in one blocking call.
    pub fn submit(&mut self, page: &mut Page, municipio: &str) -> Outcome {
        let ticket = match self.begin(page, municipio) {
            Ok(t) => t,
            Err(e) => return Outcome::Failed(e),
        };
        let response = self.fetch(&ticket);
        self.complete(page, ticket, response)
    }

    fn display(&self, page: &mut Page, municipio: String, report: AnalysisReport) -> AnalysisView {
        let tr = self.catalog.translator(page.locale);
        let category = report.categoria;
        let view = &mut page.view;

        view.set_text(ElementId::MunicipioName, municipio.as_str());
        view.set_text(ElementId::IndiceValue, format!("{}%", report.indice_sequia));

        let nivel = view.element_mut(ElementId::NivelValue);
        match category {
            Some(c) => {
                nivel.text = self.category_text(&tr, c, report.nombre_categoria.as_deref());
                nivel.class = format!("result-value {}", c.css_class());
            }
            // Unrecognized code: show what the server sent, without styling or advice.
            None => {
                let code = report.codigo_categoria.as_str();
                nivel.text = format!("{code} - {}", report.nombre_categoria.as_deref().unwrap_or(code));
                nivel.class = "result-value".to_string();
            }
        }
        nivel.category = category;

        if let Some(advisory) = category.and_then(|c| self.catalog.advisory(page.locale, c)) {
            view.set_text(ElementId::RecAgricultores, advisory.farmers.as_str());
            view.set_text(ElementId::RecGanaderos, advisory.ranchers.as_str());
        } else if category.is_none() {
            view.set_text(ElementId::RecAgricultores, "");
            view.set_text(ElementId::RecGanaderos, "");
        }
        view.element_mut(ElementId::RecAgricultores).category = category;

        let datos = report.datos;
        view.set_text(ElementId::PrecipValue, format!("{:.2} mm", datos.precipitacion_promedio));
        view.set_text(ElementId::TempValue, format!("{:.2} °C", datos.temperatura_promedio));
        view.set_text(ElementId::EvapValue, format!("{:.2} mm", datos.evapotranspiracion_promedio));

        let series = report
            .series
            .as_ref()
            .map(|raw| normalize(&raw.dates, &raw.precipitation, &raw.temperature))
            .unwrap_or_default();
        let rain = rain_summary(&series.precipitation());
        log::info!(
            "{municipio}: {} of {} days with rain ({:.1}%)",
            rain.rainy_days,
            rain.total_days,
            rain.rainy_pct
        );
        view.element_mut(ElementId::Result).visible = true;

        let mut charts = Vec::new();
        let mut chart_failures = Vec::new();
        let mut render = |page: &mut Page, config: ChartConfig| {
            let kind = config.kind;
            match page.charts.replace(page.surface.as_mut(), config) {
                Ok(_) => charts.push(kind),
                Err(e) => {
                    log::error!("{kind:?} chart failed: {e:#}");
                    chart_failures.push(kind);
                }
            }
        };

        let mut projection = Vec::new();
        let regression = regression::fit(&series);
        if !series.is_empty() {
            render(page, ChartConfig::time_series(&series, &tr));
            render(page, ChartConfig::scatter(&series, &tr));
        }
        match &regression {
            Ok(model) => match regression::project(&series, model, PROJECTION_DAYS) {
                Ok(days) => {
                    render(page, ChartConfig::regression(&series, model, &days, &tr));
                    projection = days;
                }
                Err(e) => log::warn!("{municipio}: no projection: {e}"),
            },
            Err(e) => log::warn!("{municipio}: no regression: {e}"),
        }

        let monthly = if !report.monthly.is_empty() {
            report.monthly.clone()
        } else if self.derive_monthly {
            monthly_totals(&series)
        } else {
            Vec::new()
        };
        if !monthly.is_empty() {
            render(page, ChartConfig::monthly_bar(&monthly, &tr));
        }

        for kind in ChartKind::ALL {
            if !charts.contains(&kind) {
                page.charts.dispose(page.surface.as_mut(), kind);
            }
        }

        page.view.element_mut(ElementId::RiskCanvas).content = self.risk_curve(&report);

        AnalysisView {
            municipio,
            report,
            series,
            rain,
            regression,
            projection,
            monthly,
            charts,
            chart_failures,
        }
    }

    fn category_text(&self, tr: &Translator<'_>, category: DroughtCategory, server: Option<&str>) -> String {
        if self.catalog.category_name(tr.locale, category).is_some() {
            return tr.category_label(category);
        }
        match server.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => format!("{} - {name}", category.code()),
            None => category.code().to_string(),
        }
    }

    fn risk_curve(&self, report: &AnalysisReport) -> Option<String> {
        let values = finite_values(report.series.as_ref()?.daily_risk.as_deref()?);
        if values.is_empty() {
            return None;
        }
        let (w, h) = self.risk_size;
        match risk_curve_svg(&values, w, h) {
            Ok(svg) => Some(svg),
            Err(e) => {
                log::error!("risk curve failed: {e:#}");
                None
            }
        }
    }
}

/// User-facing text for a failed submission.
pub fn error_message(tr: &Translator<'_>, err: &AnalysisError) -> String {
    match err {
        AnalysisError::Validation => tr.text("errorNoMunicipality").to_string(),
        AnalysisError::Busy => tr.text("errorBusy").to_string(),
        AnalysisError::Application(Some(msg)) => msg.clone(),
        AnalysisError::Application(None) => tr.text("errorUnknown").to_string(),
        e => format!("{}: {e}", tr.text("errorConnection")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    struct Canned {
        body: Result<Value, AnalysisError>,
        calls: Cell<usize>,
    }

    impl AnalysisSource for Canned {
        fn fetch_analysis(&self, _municipio: &str) -> Result<Value, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            self.body.clone()
        }
    }

    fn canned(body: Result<Value, AnalysisError>) -> Canned {
        Canned {
            body,
            calls: Cell::new(0),
        }
    }

    #[test]
    fn blank_municipality_never_reaches_the_source() {
        let mut page = Page::in_memory();
        let mut ctl = AnalysisController::new(canned(Ok(json!({}))), Catalog::builtin());
        let out = ctl.submit(&mut page, "   ");
        assert!(matches!(out, Outcome::Failed(AnalysisError::Validation)));
        assert_eq!(ctl.source().calls.get(), 0);
        assert_eq!(page.view.error_message(), Some("Por favor selecciona un municipio"));
        assert!(!page.view.is_loading());
    }

    #[test]
    fn application_error_without_message_uses_fallback() {
        let mut page = Page::in_memory();
        let source = canned(Ok(json!({"success": false})));
        let mut ctl = AnalysisController::new(source, Catalog::builtin());
        ctl.submit(&mut page, "Aldama");
        assert_eq!(page.view.error_message(), Some("Error desconocido"));
        assert!(!page.view.is_loading());
    }

    #[test]
    fn connectivity_errors_share_one_prefix() {
        let tr = Catalog::builtin().translator(crate::i18n::Locale::Es);
        let msg = error_message(
            &tr,
            &AnalysisError::Http {
                status: 500,
                reason: "Internal Server Error".into(),
            },
        );
        assert_eq!(msg, "Error al conectar con el servidor: Error 500: Internal Server Error");
    }

    #[test]
    fn server_category_name_fills_gaps_in_catalog() {
        let catalog = Catalog::new(crate::i18n::Locale::Es);
        let ctl = AnalysisController::new(canned(Ok(json!({}))), &catalog);
        let tr = catalog.translator(crate::i18n::Locale::Es);
        assert_eq!(
            ctl.category_text(&tr, DroughtCategory::D2, Some("Sequía Severa")),
            "D2 - Sequía Severa"
        );
        assert_eq!(ctl.category_text(&tr, DroughtCategory::D2, None), "D2");
    }
}
