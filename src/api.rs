//! Synchronous client for the drought analysis service.
//!
//! Two endpoints are used:
//! - `GET {base}/analizar?municipio=<name>`: the analysis document parsed by [`crate::ingest`]
//! - `GET {base}/municipios`: `{"municipios": [...]}`, the names the form offers
//!
//! One request per submission. Nothing is retried: a failed request surfaces as an
//! [`AnalysisError`] and the user resubmits.
//!
//! ```no_run
//! # use sequia::api::{AnalysisSource, Client};
//! let client = Client::default();
//! let body = client.fetch_analysis("Guachochi")?;
//! let report = sequia::ingest::parse_analysis(&body)?;
//! # Ok::<(), sequia::AnalysisError>(())
//! ```

use crate::error::AnalysisError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can answer an analysis request with a JSON body.
///
/// The controller only talks to this trait, so tests can substitute canned responses.
pub trait AnalysisSource {
    fn fetch_analysis(&self, municipio: &str) -> Result<Value, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT).unwrap_or_else(|e| {
            log::warn!("falling back to a default HTTP client: {e}");
            Self {
                base_url: DEFAULT_BASE_URL.into(),
                http: HttpClient::new(),
            }
        })
    }
}

// Municipality names may carry spaces and accents; keep only these unescaped.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(segment: &str) -> String {
    percent_encoding::utf8_percent_encode(segment.trim(), SAFE).to_string()
}

impl Client {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .redirect(Policy::limited(5))
            .user_agent(concat!("sequia_rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn analysis_url(&self, municipio: &str) -> String {
        format!("{}/analizar?municipio={}", self.base_url, enc(municipio))
    }

    fn get_json(&self, url: &str) -> Result<Value, AnalysisError> {
        log::debug!("GET {url}");
        let resp = self.http.get(url).send()?;
        let resp = check_status(resp)?;
        resp.json::<Value>()
            .map_err(|e| AnalysisError::Malformed(e.to_string()))
    }

    /// Municipality names offered by the service, in server order.
    pub fn municipalities(&self) -> Result<Vec<String>, AnalysisError> {
        let url = format!("{}/municipios", self.base_url);
        let v = self.get_json(&url)?;
        let list = v
            .get("municipios")
            .and_then(Value::as_array)
            .ok_or_else(|| AnalysisError::Malformed("missing 'municipios' array".into()))?;
        Ok(list
            .iter()
            .filter_map(|m| match m {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("nombre").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect())
    }
}

fn check_status(resp: Response) -> Result<Response, AnalysisError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(AnalysisError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    })
}

impl AnalysisSource for Client {
    fn fetch_analysis(&self, municipio: &str) -> Result<Value, AnalysisError> {
        self.get_json(&self.analysis_url(municipio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn municipality_is_percent_encoded() {
        let c = Client::new("http://localhost:5000/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            c.analysis_url("Batopilas de Manuel Gómez Morín"),
            "http://localhost:5000/api/analizar?municipio=Batopilas%20de%20Manuel%20G%C3%B3mez%20Mor%C3%ADn"
        );
        assert_eq!(c.analysis_url(" Ciudad-Juárez "), "http://localhost:5000/api/analizar?municipio=Ciudad-Ju%C3%A1rez");
    }

    #[test]
    fn default_points_at_local_service() {
        assert_eq!(Client::default().base_url, DEFAULT_BASE_URL);
    }
}
