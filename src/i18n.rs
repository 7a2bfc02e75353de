//! Translation catalog (Spanish, Tarahumara, Rarámuri) and the language switcher.
//!
//! Every lookup is two-level: the selected locale first, then the default locale.
//! The switcher re-applies text to an already rendered [`Page`] without touching data:
//! categories are read back from the elements that cached them, and charts only get
//! their titles replaced.

use crate::chart::ChartKind;
use crate::models::DroughtCategory;
use crate::store::{LOCALE_KEY, PreferenceStore};
use crate::view::{ElementId, Page};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    Tara,
    Rara,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::Es;
    pub const ALL: [Locale; 3] = [Locale::Es, Locale::Tara, Locale::Rara];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::Tara => "tara",
            Locale::Rara => "rara",
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "tara" => Ok(Locale::Tara),
            "rara" => Ok(Locale::Rara),
            other => Err(format!("unsupported language: {other:?} (expected es, tara, rara)")),
        }
    }
}

/// Farmer- and rancher-facing advice for one drought category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub farmers: String,
    pub ranchers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleTable {
    pub strings: BTreeMap<String, String>,
    pub categories: BTreeMap<DroughtCategory, String>,
    pub advisories: BTreeMap<DroughtCategory, Advisory>,
}

/// Keys of the static labels tagged for translation in the view.
pub const LABEL_KEYS: &[&str] = &[
    "title",
    "subtitle",
    "selectMunicipality",
    "chooseMunicipality",
    "analyzeButton",
    "loadingMessage",
    "analysisFor",
    "droughtIndex",
    "category",
    "climateData",
    "precipitation",
    "temperature",
    "evapotranspiration",
    "recommendationsTitle",
    "forFarmers",
    "forRanchers",
    "charts",
    "lineChartTitle",
    "scatterChartTitle",
    "barChartTitle",
    "regressionChart",
    "riskEvolutionTitle",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tables: BTreeMap<Locale, LocaleTable>,
    default: Locale,
}

impl Catalog {
    pub fn new(default: Locale) -> Self {
        Self {
            tables: BTreeMap::new(),
            default,
        }
    }

    pub fn with_table(mut self, locale: Locale, table: LocaleTable) -> Self {
        self.tables.insert(locale, table);
        self
    }

    pub fn default_locale(&self) -> Locale {
        self.default
    }

    /// The built-in three-language catalog.
    pub fn builtin() -> &'static Catalog {
        static BUILTIN: OnceLock<Catalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Catalog::new(Locale::Es)
                .with_table(Locale::Es, table(ES_STRINGS, ES_CATEGORIES, ES_ADVISORIES))
                .with_table(Locale::Tara, table(TARA_STRINGS, TARA_CATEGORIES, TARA_ADVISORIES))
                .with_table(Locale::Rara, table(RARA_STRINGS, RARA_CATEGORIES, RARA_ADVISORIES))
        })
    }

    fn lookup<'a, T: ?Sized>(
        &'a self,
        locale: Locale,
        pick: impl Fn(&'a LocaleTable) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.tables
            .get(&locale)
            .and_then(&pick)
            .or_else(|| self.tables.get(&self.default).and_then(&pick))
    }

    pub fn text(&self, locale: Locale, key: &str) -> Option<&str> {
        self.lookup(locale, |t| t.strings.get(key).map(String::as_str))
    }

    pub fn category_name(&self, locale: Locale, category: DroughtCategory) -> Option<&str> {
        self.lookup(locale, |t| t.categories.get(&category).map(String::as_str))
    }

    pub fn advisory(&self, locale: Locale, category: DroughtCategory) -> Option<&Advisory> {
        self.lookup(locale, |t| t.advisories.get(&category))
    }

    pub fn chart_title(&self, locale: Locale, kind: ChartKind) -> Option<&str> {
        self.text(locale, kind.title_key())
    }

    pub fn translator(&self, locale: Locale) -> Translator<'_> {
        Translator {
            catalog: self,
            locale,
        }
    }
}

/// A catalog bound to one locale. Missing keys render as the key itself.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    pub catalog: &'a Catalog,
    pub locale: Locale,
}

impl<'a> Translator<'a> {
    pub fn text(&self, key: &'a str) -> &'a str {
        self.catalog.text(self.locale, key).unwrap_or(key)
    }

    pub fn chart_title(&self, kind: ChartKind) -> &'a str {
        self.text(kind.title_key())
    }

    /// `"D3 - Sequía Extrema"`, or just the code when no locale names it.
    pub fn category_label(&self, category: DroughtCategory) -> String {
        match self.catalog.category_name(self.locale, category) {
            Some(name) => format!("{} - {}", category.code(), name),
            None => category.code().to_string(),
        }
    }
}

/// Applies a locale to everything already on the page.
pub struct LanguageSwitcher<'c> {
    catalog: &'c Catalog,
}

impl<'c> LanguageSwitcher<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Apply the stored preference, or the catalog default when absent or unknown.
    pub fn initialize(&self, page: &mut Page, store: &mut dyn PreferenceStore) -> Locale {
        let locale = store
            .get(LOCALE_KEY)
            .and_then(|code| match code.parse::<Locale>() {
                Ok(l) => Some(l),
                Err(e) => {
                    log::warn!("ignoring stored preference: {e}");
                    None
                }
            })
            .unwrap_or(self.catalog.default_locale());
        self.switch(page, store, locale);
        locale
    }

    pub fn switch(&self, page: &mut Page, store: &mut dyn PreferenceStore, locale: Locale) {
        let tr = self.catalog.translator(locale);

        for (key, text) in page.view.labels_mut() {
            if let Some(t) = self.catalog.text(locale, key) {
                *text = t.to_string();
            }
        }

        if let Err(e) = store.set(LOCALE_KEY, locale.code()) {
            log::warn!("could not persist language preference: {e}");
        }

        let nivel = page.view.element_mut(ElementId::NivelValue);
        if let Some(category) = nivel.category
            && self.catalog.category_name(locale, category).is_some()
        {
            nivel.text = tr.category_label(category);
        }

        let cached = page.view.element(ElementId::RecAgricultores).category;
        if let Some(advisory) = cached.and_then(|c| self.catalog.advisory(locale, c)) {
            page.view.element_mut(ElementId::RecAgricultores).text = advisory.farmers.clone();
            page.view.element_mut(ElementId::RecGanaderos).text = advisory.ranchers.clone();
        }

        let live: Vec<ChartKind> = page.charts.live_kinds().collect();
        for kind in live {
            let title = tr.chart_title(kind);
            if let Err(e) = page.charts.retitle(page.surface.as_mut(), kind, title) {
                log::error!("could not retitle {kind:?} chart: {e:#}");
            }
        }

        page.locale = locale;
        log::info!("language switched to {locale}");
    }
}

fn table(
    strings: &[(&str, &str)],
    categories: &[&str; 5],
    advisories: &[(&str, &str); 5],
) -> LocaleTable {
    LocaleTable {
        strings: strings
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        categories: DroughtCategory::ALL
            .iter()
            .zip(categories)
            .map(|(c, name)| (*c, name.to_string()))
            .collect(),
        advisories: DroughtCategory::ALL
            .iter()
            .zip(advisories)
            .map(|(c, (farmers, ranchers))| {
                (
                    *c,
                    Advisory {
                        farmers: farmers.to_string(),
                        ranchers: ranchers.to_string(),
                    },
                )
            })
            .collect(),
    }
}

// Messages, axis titles and series labels only exist in Spanish; the other
// locales reach them through the default-locale fallback.
const ES_STRINGS: &[(&str, &str)] = &[
    ("title", "Tierra que habla"),
    ("subtitle", "Sistema de análisis meteorológico en Chihuahua"),
    ("selectMunicipality", "Selecciona un municipio:"),
    ("chooseMunicipality", "-- Elige un municipio --"),
    ("analyzeButton", "Analizar Sequía"),
    ("loadingMessage", "Consultando datos meteorológicos..."),
    ("analysisFor", "Análisis para"),
    ("droughtIndex", "Índice de Sequía:"),
    ("category", "Categoría:"),
    ("climateData", "Datos Climáticos (Promedio últimos 90 días)"),
    ("precipitation", "Precipitación"),
    ("temperature", "Temperatura"),
    ("evapotranspiration", "Evapotranspiración"),
    ("recommendationsTitle", "Recomendaciones"),
    ("forFarmers", "Para Agricultores"),
    ("forRanchers", "Para Ganaderos"),
    ("charts", "Gráficas"),
    ("lineChartTitle", "Precipitación Diaria (Últimos 90 Días)"),
    ("scatterChartTitle", "Relación Precipitación vs Temperatura"),
    ("barChartTitle", "Precipitación Mensual Acumulada"),
    ("regressionChart", "Regresión Lineal y Predicción"),
    ("riskEvolutionTitle", "Evolución del Índice de Sequía"),
    ("errorNoMunicipality", "Por favor selecciona un municipio"),
    ("errorUnknown", "Error desconocido"),
    ("errorConnection", "Error al conectar con el servidor"),
    ("errorBusy", "Ya hay un análisis en curso"),
    ("insufficientData", "Datos insuficientes para la regresión"),
    ("axisDate", "Fecha"),
    ("axisPrecipitation", "Precipitación (mm)"),
    ("axisTemperature", "Temperatura (°C)"),
    ("axisMonth", "Mes"),
    ("axisRain", "Lluvia (mm)"),
    ("seriesPrecipitation", "Precipitación (mm)"),
    ("seriesRainVsTemp", "Lluvia vs Temperatura"),
    ("seriesMonthlyRain", "Lluvia mensual (mm)"),
    ("seriesThreshold", "Umbral"),
    ("seriesObserved", "Precipitación observada"),
    ("seriesFitted", "Regresión lineal"),
    ("seriesProjection", "Proyección 30 días"),
];

const ES_CATEGORIES: &[&str; 5] = &[
    "Anormalmente Seco",
    "Sequía Moderada",
    "Sequía Severa",
    "Sequía Extrema",
    "Sequía Excepcional",
];

const ES_ADVISORIES: &[(&str, &str); 5] = &[
    (
        "Monitoree la humedad del suelo. Use un medidor de humedad de bajo costo o la prueba del puño (hacer una bola con tierra) para evaluar la necesidad de riego de auxilio inicial.",
        "Asegure el almacenamiento de agua. Revise la impermeabilidad de los bordos y presones. Active el protocolo de limpieza y mantenimiento de tinacos y aljibes.",
    ),
    (
        "Considere la siembra en curvas de nivel. En áreas de temporal, esto ayuda a maximizar la infiltración del agua de lluvia escasa y reduce la erosión.",
        "Implemente la rotación de potreros intensiva. Esto permite que el pastizal existente se recupere entre usos, maximizando el forraje disponible antes de la sequía severa.",
    ),
    (
        "Coseche agua de lluvia de techos. Instale canaletas y tanques (cisternas) para almacenar el agua de cualquier lluvia esporádica para uso doméstico o riego de huertos de subsistencia.",
        "Trate la paja y rastrojos. Use urea o melaza para mejorar el valor nutricional de los residuos de cosecha (rastrojos de maíz o trigo), utilizándolos como suplemento del forraje caro.",
    ),
    (
        "Prepare la tierra para el próximo ciclo. Realice prácticas de conservación de suelos (como subsoleo) para romper capas duras y mejorar la capacidad de captación de agua una vez que regresen las lluvias.",
        "Establezca acuerdos de pastoreo temporal (renta). Busque convenios con productores en regiones menos afectadas (valles centrales o zonas con riego) para mover el ganado y reducir costos de forraje y transporte de agua.",
    ),
    (
        "Documente pérdidas. Tome fotografías y mantenga un registro de los daños en sus cultivos para facilitar futuras solicitudes de apoyo ante programas como el Seguro Catastrófico o el FONDEN.",
        "Priorice el ganado de reemplazo. Separe y mantenga con vida únicamente a las vaquillas y sementales genéticamente superiores que aseguren la reactivación del hato cuando termine la emergencia.",
    ),
];

const TARA_STRINGS: &[(&str, &str)] = &[
    ("title", "Onorúa Nokála"),
    ("subtitle", "Chihuahua rejói kusírami bewá"),
    ("selectMunicipality", "Mapú rejói sirámi:"),
    ("chooseMunicipality", "-- Mapú sirámi gasíwa --"),
    ("analyzeButton", "Bewá Kusí Ra'íchari"),
    ("loadingMessage", "Kusírami bewá napáka..."),
    ("analysisFor", "Bewáchi rejói"),
    ("droughtIndex", "Kusí nimá:"),
    ("category", "Ma'sá:"),
    ("climateData", "Kusírami Bewá (90 osí rejói)"),
    ("precipitation", "Yubá"),
    ("temperature", "Waséame"),
    ("evapotranspiration", "Yubá Ré'mi"),
    ("recommendationsTitle", "Kusí Mapu Níwara"),
    ("forFarmers", "Teóchi Niwá"),
    ("forRanchers", "Chíbachi Niwá"),
    ("charts", "Machí Bewá"),
    ("lineChartTitle", "Yubá Osí Osí (90 Osí Rejói)"),
    ("scatterChartTitle", "Yubá gu Waséame Machí"),
    ("barChartTitle", "Yubá Machí Malá"),
    ("regressionChart", "Yubá Bewá Kusírami"),
    ("riskEvolutionTitle", "Kusí Nimá Rejói Bewá"),
];

const TARA_CATEGORIES: &[&str; 5] = &[
    "Kusí Sipó Osíchi",
    "Kusí Machí",
    "Kusí Marí",
    "Kusí Majá",
    "Kusí Ko'á Majá",
];

const TARA_ADVISORIES: &[(&str, &str); 5] = &[
    (
        "Osákami yubá bewá. Teonári machí kusí namá yubá gasí osíchi. Machí kusírami bewá yubá rejói namá.",
        "Yubá chipá gasíwa. Bordos machí yubá gasí osá. Tinacos machí kusí bewá gasíwa rejói.",
    ),
    (
        "Teó machí kusírami bewá. Kusírami namá yubá sipó gasí machí osá. Yubá rejói bewá gasíwa.",
        "Chíba kusírami machí. Chipá kusí osá machí namá bewá. Kusírami gasí osá rejói.",
    ),
    (
        "Yubá chipá sipó gasí. Namá kusí yubá bewá chipá osá. Teónari gasíwa yubá namá.",
        "Chipá kusí bewá machí. Teó kusírami namá bewá gasí. Chíba kusí machí rejói osá.",
    ),
    (
        "Kusírami teó namá gasí. Yubá kusí osá bewá machí. Kusírami gasí rejói namá yubá.",
        "Chíba kusírami gasí bewá. Kusí namá chipá machí osá. Yubá bewá gasí rejói machí.",
    ),
    (
        "Teó kusí bewá namá. Kusírami machí namá gasí osá. Bewá rejói kusí chipá namá.",
        "Chíba kusí machí namá. Kusírami bewá gasí rejói. Chíba chipá machí kusí gasíwa.",
    ),
];

const RARA_STRINGS: &[(&str, &str)] = &[
    ("title", "Onorúa Chokeamé"),
    ("subtitle", "Chihuahua rejói oné kusírami"),
    ("selectMunicipality", "Mapú rejói esíwa:"),
    ("chooseMunicipality", "-- Mapú esíwa sikára --"),
    ("analyzeButton", "Oné Ra'íchari Bewá"),
    ("loadingMessage", "Kusírami napáka anérame..."),
    ("analysisFor", "Bewáchi"),
    ("droughtIndex", "Oné nimá:"),
    ("category", "Rejói:"),
    ("climateData", "Kusírami (90 osíbara)"),
    ("precipitation", "Yubá Ewá"),
    ("temperature", "Waséame Rejói"),
    ("evapotranspiration", "Yubá Ré'asá"),
    ("recommendationsTitle", "Mapu Kusí Níwara"),
    ("forFarmers", "Teóchi Bewá"),
    ("forRanchers", "Chíba Mapu"),
    ("charts", "Machí Rejói"),
    ("lineChartTitle", "Yubá Osí Osí (90 Osí Oné)"),
    ("scatterChartTitle", "Yubá gu Waséame Oné"),
    ("barChartTitle", "Yubá Machí Malá"),
    ("regressionChart", "Yubá Bewá Oné"),
    ("riskEvolutionTitle", "Oné Nimá Rejói Bewá"),
];

const RARA_CATEGORIES: &[&str; 5] = &[
    "Oné Sipó",
    "Oné Machíwa",
    "Oné Maríwa",
    "Oné Ko'á",
    "Oné Ko'á Majá",
];

const RARA_ADVISORIES: &[(&str, &str); 5] = &[
    (
        "Yubá bewá osákami. Teónari machí oné namá yubá gasí. Machí kusírami yubá rejói bewá.",
        "Yubá chipá namá gasí. Bordos oné yubá machí gasí. Tinacos kusí bewá machí rejói.",
    ),
    (
        "Teó oné kusírami bewá. Yubá sipó machí namá gasí osá. Kusírami bewá gasí rejói.",
        "Chíba oné machí kusírami. Chipá bewá machí namá gasí. Oné kusírami rejói gasí.",
    ),
    (
        "Yubá chipá bewá gasí. Namá oné yubá chipá osá. Teónari gasíwa yubá bewá.",
        "Chipá oné bewá machí. Teó kusírami bewá gasí namá. Chíba oné rejói machí.",
    ),
    (
        "Oné teó namá kusírami. Yubá bewá machí gasí osá. Kusírami rejói yubá namá.",
        "Chíba oné kusírami bewá. Namá chipá machí gasí. Yubá bewá rejói machí gasí.",
    ),
    (
        "Teó oné bewá kusírami. Machí namá gasí osá bewá. Rejói kusí chipá namá.",
        "Chíba oné machí kusírami. Bewá gasí rejói namá. Chíba chipá oné gasíwa.",
    ),
];
