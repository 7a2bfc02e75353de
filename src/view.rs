//! In-process model of the page the analysis is rendered into.
//!
//! Element identifiers are the stable contract with the presentation layer. The
//! [`Page`] bundles the view with the chart registry and the surface the charts live
//! on, so rendering code and the language switcher receive it explicitly.

use crate::chart::{ChartKind, ChartRegistry, ChartSurface, MemorySurface};
use crate::i18n::{LABEL_KEYS, Locale};
use crate::models::DroughtCategory;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    AnalyzeForm,
    MunicipioSelect,
    LanguageSelect,
    Loading,
    Error,
    Result,
    MunicipioName,
    IndiceValue,
    NivelValue,
    PrecipValue,
    TempValue,
    EvapValue,
    RecAgricultores,
    RecGanaderos,
    ChartLine,
    ChartScatter,
    ChartBar,
    ChartRegression,
    RiskCanvas,
}

impl ElementId {
    pub const ALL: [ElementId; 19] = [
        ElementId::AnalyzeForm,
        ElementId::MunicipioSelect,
        ElementId::LanguageSelect,
        ElementId::Loading,
        ElementId::Error,
        ElementId::Result,
        ElementId::MunicipioName,
        ElementId::IndiceValue,
        ElementId::NivelValue,
        ElementId::PrecipValue,
        ElementId::TempValue,
        ElementId::EvapValue,
        ElementId::RecAgricultores,
        ElementId::RecGanaderos,
        ElementId::ChartLine,
        ElementId::ChartScatter,
        ElementId::ChartBar,
        ElementId::ChartRegression,
        ElementId::RiskCanvas,
    ];

    pub fn dom_id(&self) -> &'static str {
        match self {
            ElementId::AnalyzeForm => "analyzeForm",
            ElementId::MunicipioSelect => "municipio",
            ElementId::LanguageSelect => "languageSelect",
            ElementId::Loading => "loading",
            ElementId::Error => "error",
            ElementId::Result => "result",
            ElementId::MunicipioName => "municipioName",
            ElementId::IndiceValue => "indiceValue",
            ElementId::NivelValue => "nivelValue",
            ElementId::PrecipValue => "precipValue",
            ElementId::TempValue => "tempValue",
            ElementId::EvapValue => "evapValue",
            ElementId::RecAgricultores => "recAgricultores",
            ElementId::RecGanaderos => "recGanaderos",
            ElementId::ChartLine => ChartKind::TimeSeries.mount_id(),
            ElementId::ChartScatter => ChartKind::Scatter.mount_id(),
            ElementId::ChartBar => ChartKind::MonthlyBar.mount_id(),
            ElementId::ChartRegression => ChartKind::Regression.mount_id(),
            ElementId::RiskCanvas => "riskCanvas",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub text: String,
    pub class: String,
    pub visible: bool,
    /// Category this element was rendered from; read back when relabeling.
    pub category: Option<DroughtCategory>,
    /// Raw markup for canvas-like mounts (SVG).
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    elements: BTreeMap<ElementId, Element>,
    labels: BTreeMap<&'static str, String>,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    pub fn new() -> Self {
        let mut elements: BTreeMap<ElementId, Element> =
            ElementId::ALL.iter().map(|id| (*id, Element::default())).collect();
        for id in [ElementId::AnalyzeForm, ElementId::MunicipioSelect, ElementId::LanguageSelect] {
            if let Some(e) = elements.get_mut(&id) {
                e.visible = true;
            }
        }
        Self {
            elements,
            labels: LABEL_KEYS.iter().map(|k| (*k, String::new())).collect(),
        }
    }

    pub fn element(&self, id: ElementId) -> &Element {
        // every id is inserted in `new`
        &self.elements[&id]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        self.elements.entry(id).or_default()
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        self.element_mut(id).text = text.into();
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Translation-tagged static labels, keyed by catalog key.
    pub fn labels_mut(&mut self) -> impl Iterator<Item = (&&'static str, &mut String)> {
        self.labels.iter_mut()
    }

    pub fn is_loading(&self) -> bool {
        self.element(ElementId::Loading).visible
    }

    pub fn set_loading(&mut self, on: bool) {
        self.element_mut(ElementId::Loading).visible = on;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        let e = self.element_mut(ElementId::Error);
        e.text = message.into();
        e.visible = true;
        log::error!("{}", e.text);
    }

    pub fn error_message(&self) -> Option<&str> {
        let e = self.element(ElementId::Error);
        e.visible.then_some(e.text.as_str())
    }

    /// Hide the error and result panels before a new submission.
    pub fn clear_outcome(&mut self) {
        self.element_mut(ElementId::Error).visible = false;
        self.element_mut(ElementId::Result).visible = false;
    }

    /// Plain-text rendering of the visible panels, for terminals.
    pub fn report(&self) -> String {
        let mut out = String::new();
        if let Some(msg) = self.error_message() {
            let _ = writeln!(out, "{msg}");
            return out;
        }
        if !self.element(ElementId::Result).visible {
            return out;
        }
        let label = |k: &str| self.label(k).unwrap_or(k).trim_end_matches(':').to_string();
        let text = |id: ElementId| self.element(id).text.as_str();

        let _ = writeln!(out, "{} {}", label("analysisFor"), text(ElementId::MunicipioName));
        let _ = writeln!(out, "  {}: {}", label("droughtIndex"), text(ElementId::IndiceValue));
        let _ = writeln!(out, "  {}: {}", label("category"), text(ElementId::NivelValue));
        let _ = writeln!(out, "{}", label("climateData"));
        let _ = writeln!(out, "  {}: {}", label("precipitation"), text(ElementId::PrecipValue));
        let _ = writeln!(out, "  {}: {}", label("temperature"), text(ElementId::TempValue));
        let _ = writeln!(out, "  {}: {}", label("evapotranspiration"), text(ElementId::EvapValue));
        if self.element(ElementId::RecAgricultores).category.is_some() {
            let _ = writeln!(out, "{}", label("recommendationsTitle"));
            let _ = writeln!(out, "  {}: {}", label("forFarmers"), text(ElementId::RecAgricultores));
            let _ = writeln!(out, "  {}: {}", label("forRanchers"), text(ElementId::RecGanaderos));
        }
        out
    }
}

/// Everything a render pass or a language switch mutates.
pub struct Page {
    pub view: View,
    pub charts: ChartRegistry,
    pub surface: Box<dyn ChartSurface>,
    pub locale: Locale,
}

impl Page {
    pub fn new(surface: Box<dyn ChartSurface>) -> Self {
        Self {
            view: View::new(),
            charts: ChartRegistry::new(),
            surface,
            locale: Locale::DEFAULT,
        }
    }

    /// Page whose charts only live in memory.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySurface::default()))
    }
}
