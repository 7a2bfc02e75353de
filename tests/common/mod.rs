#![allow(dead_code)]

use anyhow::bail;
use sequia::api::AnalysisSource;
use sequia::chart::{ChartConfig, ChartHandle, ChartKind, ChartSurface, MemorySurface};
use sequia::AnalysisError;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Three days of data, every optional block present, aliases mixed on purpose.
pub fn full_body() -> Value {
    json!({
        "success": true,
        "indice_sequia": 62.5,
        "nivel_riesgo": "D3",
        "nombre_categoria": "Sequía Extrema",
        "datos": {
            "precipitacion_promedio": 1.234,
            "temperatura_promedio": 21.5,
            "evapotranspiracion_promedio": 4.0
        },
        "series": {
            "fechas": ["2024-01-01", "2024-01-02", "2024-01-03"],
            "lluvia": [0, "2.5", 1.0],
            "temp_c": [20, 21, 22],
            "riesgo_diario": [10, 40, 90]
        },
        "monthly_promedio": [{"month": "2024-01", "precipitacion": 3.5}]
    })
}

/// Summary only: no series, no monthly list.
pub fn bare_body() -> Value {
    json!({
        "success": true,
        "indice_sequia": 12,
        "categoria": "D0",
        "datos": {
            "precipitacion_promedio": 3.0,
            "temperatura_promedio": 18.0,
            "evapotranspiracion_promedio": 2.5
        }
    })
}

/// Answers from a queue, counting calls.
#[derive(Default)]
pub struct Scripted {
    responses: RefCell<VecDeque<Result<Value, AnalysisError>>>,
    pub calls: Cell<usize>,
    pub last_municipio: RefCell<Option<String>>,
}

impl Scripted {
    pub fn new(responses: impl IntoIterator<Item = Result<Value, AnalysisError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }
}

impl AnalysisSource for Scripted {
    fn fetch_analysis(&self, municipio: &str) -> Result<Value, AnalysisError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_municipio.borrow_mut() = Some(municipio.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::Transport("no scripted response".into())))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub created: usize,
    pub refreshed: usize,
    pub destroyed: usize,
}

/// In-memory surface whose counters stay readable after it is boxed into a page.
pub struct Recording {
    inner: MemorySurface,
    counts: Rc<RefCell<Counts>>,
    configs: Rc<RefCell<Vec<ChartConfig>>>,
    fail_on: Option<ChartKind>,
}

impl Recording {
    pub fn counted() -> (Self, Rc<RefCell<Counts>>) {
        Self::failing(None)
    }

    pub fn failing(kind: Option<ChartKind>) -> (Self, Rc<RefCell<Counts>>) {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let surface = Self {
            inner: MemorySurface::default(),
            counts: Rc::clone(&counts),
            configs: Rc::new(RefCell::new(Vec::new())),
            fail_on: kind,
        };
        (surface, counts)
    }

    /// Every config passed to `refresh`, in call order.
    pub fn refreshed_configs(&self) -> Rc<RefCell<Vec<ChartConfig>>> {
        Rc::clone(&self.configs)
    }
}

impl ChartSurface for Recording {
    fn create(&mut self, config: &ChartConfig) -> anyhow::Result<ChartHandle> {
        if self.fail_on == Some(config.kind) {
            bail!("{:?} canvas unavailable", config.kind);
        }
        self.counts.borrow_mut().created += 1;
        self.inner.create(config)
    }

    fn refresh(&mut self, handle: ChartHandle, config: &ChartConfig) -> anyhow::Result<()> {
        self.counts.borrow_mut().refreshed += 1;
        self.configs.borrow_mut().push(config.clone());
        self.inner.refresh(handle, config)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.counts.borrow_mut().destroyed += 1;
        self.inner.destroy(handle);
    }
}
