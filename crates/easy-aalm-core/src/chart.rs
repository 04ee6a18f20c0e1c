//! Blood-lead chart rendered to SVG.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{AalmError, Result};
use crate::table::SeriesPoint;

/// Material red 700, the series colour.
const SERIES_COLOR: RGBColor = RGBColor(0xD3, 0x2F, 0x2F);
const REFERENCE_COLOR: RGBColor = RGBColor(0xFF, 0x98, 0x00);
const GRID_COLOR: RGBColor = RGBColor(0xE0, 0xE0, 0xE0);

/// Dash pattern for the reference line, as fractions of the x span.
const DASH_FRACTION: f64 = 0.02;
const GAP_FRACTION: f64 = 0.012;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Horizontal reference line (μg/dL).
    pub reference_level: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 500,
            title: "Blood Lead Level Over Time".to_string(),
            reference_level: crate::report::CDC_REFERENCE_UG_DL,
        }
    }
}

pub fn reference_label(level: f64) -> String {
    format!("CDC Reference ({level} μg/dL)")
}

fn chart_err<E: std::fmt::Display>(err: E) -> AalmError {
    AalmError::Chart(err.to_string())
}

/// Segments `(start, end)` covering `x_min..x_max` in dashes.
fn dash_segments(x_min: f64, x_max: f64) -> Vec<(f64, f64)> {
    let span = x_max - x_min;
    if span <= 0.0 {
        return vec![(x_min, x_max)];
    }
    let dash = span * DASH_FRACTION;
    let step = dash + span * GAP_FRACTION;

    let mut segments = Vec::new();
    let mut x = x_min;
    while x < x_max {
        segments.push((x, (x + dash).min(x_max)));
        x += step;
    }
    segments
}

/// Render the series as an SVG document.
pub fn render_svg(series: &[SeriesPoint], config: &ChartConfig) -> Result<String> {
    if series.is_empty() {
        return Err(AalmError::Chart("no data points to plot".to_string()));
    }

    let x_min = series.iter().map(|p| p.age_years).fold(f64::INFINITY, f64::min);
    let mut x_max = series.iter().map(|p| p.age_years).fold(f64::NEG_INFINITY, f64::max);
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let y_max = series
        .iter()
        .map(|p| p.bll)
        .fold(config.reference_level, f64::max)
        * 1.1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&config.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .light_line_style(GRID_COLOR)
            .x_desc("Age (years)")
            .y_desc("Blood Lead Level (μg/dL)")
            .x_label_formatter(&|x| format!("{x:.0}"))
            .y_label_formatter(&|y| format!("{y:.1}"))
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(
                series.iter().map(|p| (p.age_years, p.bll)),
                SERIES_COLOR.stroke_width(2),
            ))
            .map_err(chart_err)?
            .label("Blood Lead Level")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], SERIES_COLOR.stroke_width(2))
            });

        let level = config.reference_level;
        chart
            .draw_series(dash_segments(x_min, x_max).into_iter().map(|(a, b)| {
                PathElement::new(vec![(a, level), (b, level)], REFERENCE_COLOR.stroke_width(2))
            }))
            .map_err(chart_err)?
            .label(reference_label(level))
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 8, y)], REFERENCE_COLOR.stroke_width(2))
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    Ok(svg)
}

/// Render and write the chart to `path`.
pub fn write_svg(series: &[SeriesPoint], config: &ChartConfig, path: &Path) -> Result<()> {
    let svg = render_svg(series, config)?;
    std::fs::write(path, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<SeriesPoint> {
        (0..n)
            .map(|d| SeriesPoint {
                age_years: d as f64 / 365.0,
                bll: d as f64 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_is_error() {
        assert!(matches!(
            render_svg(&[], &ChartConfig::default()),
            Err(AalmError::Chart(_))
        ));
    }

    #[test]
    fn test_svg_contains_reference_label() {
        let svg = render_svg(&ramp(30), &ChartConfig::default()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("CDC Reference (3.5 μg/dL)"));
        assert!(svg.contains("Blood Lead Level"));
    }

    #[test]
    fn test_axis_label_and_reference_colour() {
        let svg = render_svg(&ramp(30), &ChartConfig::default()).unwrap();
        assert!(svg.contains("Blood Lead Level (μg/dL)"));
        assert!(svg.contains("#FF9800"));
        assert!(!svg.contains("#FFA500"));
    }

    #[test]
    fn test_single_point_renders() {
        assert!(render_svg(&ramp(1), &ChartConfig::default()).is_ok());
    }

    #[test]
    fn test_dash_segments_stay_in_range() {
        let segments = dash_segments(0.0, 10.0);
        assert!(segments.len() > 10);
        assert_eq!(segments[0].0, 0.0);
        assert!(segments.iter().all(|(a, b)| a < b && *b <= 10.0));
    }

    #[test]
    fn test_write_svg_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        write_svg(&ramp(5), &ChartConfig::default(), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("</svg>"));
    }
}
