//! sequia
//!
//! Drought-risk analysis for the municipalities of Chihuahua: fetch an analysis from
//! the backend, normalize its daily climate series, fit a precipitation trend with a
//! 30-day projection, and render the result (summary panel plus charts) in one of
//! three languages. Pairs with the `sequia` CLI.
//!
//! ### Features
//! - Tolerant ingestion of the analysis payload (field aliases, string-typed numbers)
//! - Least-squares trend and fixed-horizon projection
//! - SVG charts through Plotters, one live instance per chart kind
//! - Spanish, Tarahumara and Rarámuri labels with fallback to Spanish
//! - CSV/JSON export of the series and projection
//!
//! ### Example
//! ```no_run
//! use sequia::{AnalysisController, Catalog, Client, Outcome, Page};
//!
//! let mut page = Page::in_memory();
//! let mut controller = AnalysisController::new(Client::default(), Catalog::builtin());
//! if let Outcome::Displayed(view) = controller.submit(&mut page, "Guachochi") {
//!     println!("{}", page.view.report());
//!     println!("{} charts", view.charts.len());
//! }
//! ```

pub mod api;
pub mod chart;
pub mod controller;
pub mod error;
pub mod i18n;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod regression;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod store;
pub mod view;
pub mod viz;

pub use api::{AnalysisSource, Client};
pub use chart::{ChartConfig, ChartKind, ChartRegistry, ChartSurface};
pub use controller::{AnalysisController, AnalysisView, Outcome, SubmissionPolicy};
pub use error::{AnalysisError, RegressionError, StoreError};
pub use i18n::{Catalog, LanguageSwitcher, Locale};
pub use models::{AnalysisReport, ClimateSeries, DroughtCategory};
pub use settings::Settings;
pub use store::{FileStore, MemoryStore, PreferenceStore};
pub use view::{ElementId, Page, View};
