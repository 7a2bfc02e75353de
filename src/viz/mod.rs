//! Visualization: render [`ChartConfig`]s to **SVG** with Plotters.
//!
//! - [`SvgSurface`] implements [`ChartSurface`] by writing one file per chart kind
//! - Text (captions, axes, legend) needs a registered TTF font, see [`register_font_file`];
//!   without one, charts are drawn with data layers only
//! - The seasonal risk curve lives in [`canvas`]

pub mod canvas;
pub mod text;
pub mod util;

use crate::chart::{ChartConfig, ChartHandle, ChartSurface, DatasetKind, SeriesData};
use anyhow::{Context, Result, anyhow};

use plotters::backend::DrawingBackend;
use plotters::chart::SeriesAnno;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{AreaSeries, LineSeries};
use plotters::style::{FontFamily, FontStyle};

use plotters_svg::SVGBackend;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use util::{compute_left_label_area_px, format_tick, rgba, segments, x_range, y_range};

const MARGIN: u32 = 16;
const TITLE_PX: u32 = 20;
const Y_TICKS: usize = 8;

static FONTS_READY: AtomicBool = AtomicBool::new(false);

/// Register a TTF/OTF file as the "sans-serif" family used by every chart.
///
/// `ab_glyph` doesn't discover OS fonts, so without this call charts carry no text.
pub fn register_font_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("read font {}", path.display()))?;
    // Plotters keeps the font for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font("sans-serif", FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("invalid font {}", path.display()))?;
    FONTS_READY.store(true, Ordering::Release);
    log::info!("registered chart font {}", path.display());
    Ok(())
}

pub fn fonts_ready() -> bool {
    FONTS_READY.load(Ordering::Acquire)
}

/// Render a chart into an in-memory SVG document.
pub fn render_svg_string(config: &ChartConfig, width: u32, height: u32) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        draw_chart(root, config)?;
    }
    Ok(buf)
}

/// Render a chart into an SVG file at `out_path`.
pub fn render_svg_file<P: AsRef<Path>>(
    config: &ChartConfig,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let out_path = out_path.as_ref();
    let root = SVGBackend::new(out_path, (width, height)).into_drawing_area();
    draw_chart(root, config).with_context(|| format!("render {}", out_path.display()))
}

/// Writes `<dir>/<mount id>.svg` per live chart; destroying a chart removes its file.
#[derive(Debug)]
pub struct SvgSurface {
    dir: PathBuf,
    width: u32,
    height: u32,
    next: u64,
    live: BTreeMap<ChartHandle, PathBuf>,
}

impl SvgSurface {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            dir,
            width,
            height,
            next: 0,
            live: BTreeMap::new(),
        })
    }

    pub fn path_of(&self, handle: ChartHandle) -> Option<&Path> {
        self.live.get(&handle).map(PathBuf::as_path)
    }
}

impl ChartSurface for SvgSurface {
    fn create(&mut self, config: &ChartConfig) -> Result<ChartHandle> {
        let path = self.dir.join(format!("{}.svg", config.kind.mount_id()));
        render_svg_file(config, &path, self.width, self.height)?;
        self.next += 1;
        let handle = ChartHandle(self.next);
        log::debug!("chart {:?} -> {}", config.kind, path.display());
        self.live.insert(handle, path);
        Ok(handle)
    }

    fn refresh(&mut self, handle: ChartHandle, config: &ChartConfig) -> Result<()> {
        let path = self
            .live
            .get(&handle)
            .with_context(|| format!("no live chart for {handle:?}"))?;
        render_svg_file(config, path, self.width, self.height)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if let Some(path) = self.live.remove(&handle)
            && let Err(e) = fs::remove_file(&path)
        {
            log::debug!("remove {}: {e}", path.display());
        }
    }
}

fn label_series<DB: DrawingBackend>(anno: &mut SeriesAnno<'_, DB>, label: &str, color: RGBAColor) {
    anno.label(label.to_string())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
}

fn draw_chart<DB>(root: DrawingArea<DB, Shift>, config: &ChartConfig) -> Result<()>
where
    DB: DrawingBackend,
{
    let with_text = fonts_ready();
    let (x_min, x_max) = x_range(config);
    let (y_min, y_max) = y_range(config);

    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(MARGIN);
    if with_text {
        let (w, _) = root.dim_in_pixel();
        let title = text::truncate_to_width(&config.title, TITLE_PX, w.saturating_sub(2 * MARGIN));
        builder
            .caption(title, (FontFamily::SansSerif, TITLE_PX))
            .set_label_area_size(
                LabelAreaPosition::Left,
                compute_left_label_area_px(y_min, y_max, Y_TICKS, 12),
            )
            .set_label_area_size(LabelAreaPosition::Bottom, 48);
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| anyhow!("{:?}", e))?;

    if with_text {
        let labels = &config.labels;
        let x_label_fmt = |x: &f64| {
            if labels.is_empty() {
                return format_tick(*x);
            }
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        };
        let y_label_fmt = |v: &f64| format_tick(*v);
        chart
            .configure_mesh()
            .x_desc(config.x_title.as_str())
            .y_desc(config.y_title.as_str())
            .x_labels(labels.len().clamp(2, 8))
            .y_labels(Y_TICKS)
            .x_label_formatter(&x_label_fmt)
            .y_label_formatter(&y_label_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    for ds in &config.datasets {
        let color = rgba(ds.color);
        match (ds.kind, &ds.data) {
            (DatasetKind::Area, SeriesData::Indexed(values)) => {
                for (i, seg) in segments(values).into_iter().enumerate() {
                    let anno = chart
                        .draw_series(
                            AreaSeries::new(seg, 0.0, color.mix(0.18).filled())
                                .border_style(color.stroke_width(2)),
                        )
                        .map_err(|e| anyhow!("{:?}", e))?;
                    if with_text && i == 0 {
                        label_series(anno, &ds.label, color);
                    }
                }
            }
            (DatasetKind::Line, SeriesData::Indexed(values)) => {
                for (i, seg) in segments(values).into_iter().enumerate() {
                    let anno = chart
                        .draw_series(LineSeries::new(seg, color.stroke_width(2)))
                        .map_err(|e| anyhow!("{:?}", e))?;
                    if with_text && i == 0 {
                        label_series(anno, &ds.label, color);
                    }
                }
            }
            (DatasetKind::ReferenceLine, SeriesData::Indexed(values)) => {
                if let Some(level) = values.iter().flatten().next() {
                    let anno = chart
                        .draw_series(LineSeries::new(
                            vec![(x_min, *level), (x_max, *level)],
                            color.stroke_width(2),
                        ))
                        .map_err(|e| anyhow!("{:?}", e))?;
                    if with_text {
                        label_series(anno, &ds.label, color);
                    }
                }
            }
            (DatasetKind::Bar, SeriesData::Indexed(values)) => {
                let bars = values.iter().enumerate().filter_map(|(i, v)| {
                    let v = v.filter(|v| v.is_finite())?;
                    let fill = ds.bar_colors.get(i).copied().map(rgba).unwrap_or(color);
                    let x = i as f64;
                    Some(Rectangle::new(
                        [(x - 0.4, 0.0f64.min(v)), (x + 0.4, 0.0f64.max(v))],
                        fill.filled(),
                    ))
                });
                let anno = chart
                    .draw_series(bars)
                    .map_err(|e| anyhow!("{:?}", e))?;
                if with_text {
                    label_series(anno, &ds.label, color);
                }
            }
            (_, data) => {
                let points: Vec<(f64, f64)> = match data {
                    SeriesData::Points(p) => p.clone(),
                    SeriesData::Indexed(v) => segments(v).into_iter().flatten().collect(),
                };
                let anno = chart
                    .draw_series(
                        points
                            .into_iter()
                            .filter(|(x, y)| x.is_finite() && y.is_finite())
                            .map(|(x, y)| Circle::new((x, y), 3, color.filled())),
                    )
                    .map_err(|e| anyhow!("{:?}", e))?;
                if with_text {
                    label_series(anno, &ds.label, color);
                }
            }
        }
    }

    if with_text {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 12))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
