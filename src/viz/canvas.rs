//! Seasonal drought-risk curve drawn straight onto a drawing area (no axes, no chart
//! builder), sized for a small dashboard slot.

use anyhow::{Result, anyhow, bail};
use plotters::prelude::*;
use plotters_svg::SVGBackend;

const PAD: i32 = 8;
const RISK: RGBColor = RGBColor(220, 53, 69);
const GUIDE: RGBColor = RGBColor(200, 200, 200);

/// Map percentages (clamped to `0..=100`) to pixel coordinates inside the padding.
pub fn curve_points(values: &[f64], width: u32, height: u32) -> Vec<(i32, i32)> {
    let (w, h) = (width as i32, height as i32);
    let inner_w = (w - 2 * PAD).max(1) as f64;
    let inner_h = (h - 2 * PAD).max(1) as f64;
    let n = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if n > 1 {
                PAD as f64 + inner_w * i as f64 / (n - 1) as f64
            } else {
                w as f64 / 2.0
            };
            let y = (h - PAD) as f64 - inner_h * v.clamp(0.0, 100.0) / 100.0;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

/// Render the curve as an SVG document.
pub fn risk_curve_svg(values: &[f64], width: u32, height: u32) -> Result<String> {
    if values.is_empty() {
        bail!("no risk values to draw");
    }
    let pts = curve_points(values, width, height);
    let bottom = height as i32 - PAD;
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

        let mid = PAD + (height as i32 - 2 * PAD) / 2;
        root.draw(&PathElement::new(
            vec![(PAD, mid), (width as i32 - PAD, mid)],
            GUIDE.stroke_width(1),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;

        let mut area = pts.clone();
        if let (Some(first), Some(last)) = (pts.first(), pts.last()) {
            area.push((last.0, bottom));
            area.push((first.0, bottom));
        }
        root.draw(&Polygon::new(area, RISK.mix(0.18).filled()))
            .map_err(|e| anyhow!("{:?}", e))?;
        root.draw(&PathElement::new(pts, RISK.stroke_width(2)))
            .map_err(|e| anyhow!("{:?}", e))?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_span_the_padded_box() {
        let pts = curve_points(&[0.0, 50.0, 100.0, 150.0], 216, 116);
        assert_eq!(pts[0], (8, 108));
        assert_eq!(pts[1], (75, 58));
        assert_eq!(pts[2], (141, 8));
        // clamped
        assert_eq!(pts[3], (208, 8));
    }

    #[test]
    fn renders_svg_markup() {
        let svg = risk_curve_svg(&[10.0, 35.0, 80.0], 200, 100).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polyline"));
        assert!(risk_curve_svg(&[], 200, 100).is_err());
    }
}
