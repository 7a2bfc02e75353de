use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::controller::SubmissionPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime knobs shared by the CLI and library callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub timeout: Duration,
    pub policy: SubmissionPolicy,
    pub chart_width: u32,
    pub chart_height: u32,
    /// Directory for chart SVGs; `None` keeps charts in memory.
    pub chart_dir: Option<PathBuf>,
    /// Sum the daily series per month when the payload has no monthly list.
    pub derive_monthly: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            policy: SubmissionPolicy::default(),
            chart_width: 900,
            chart_height: 480,
            chart_dir: None,
            derive_monthly: false,
        }
    }
}
