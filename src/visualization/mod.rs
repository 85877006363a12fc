//! Plot rendering for battery-test analyses.
//!
//! This module renders the derived scatter and line plots as PNG files
//! using the plotters library. Charts are kept font-free (no titles or axis
//! labels) so rendering works on hosts without a usable font configuration.

use std::path::Path;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::analysis::resample::DailyMode;
use crate::config::PlotConfig;

/// Errors that can occur during plot rendering.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("No data points to plot")]
    EmptySeries,
}

/// Result type for plot operations.
pub type Result<T> = std::result::Result<T, PlotError>;

/// Scatter point color (cornflower blue).
const SCATTER_COLOR: RGBColor = RGBColor(100, 149, 237);

/// Primary line color (blue).
const LINE_COLOR: RGBColor = RGBColor(55, 126, 184);

/// Secondary line color for dual-series charts (orange).
const SECONDARY_LINE_COLOR: RGBColor = RGBColor(255, 127, 0);

/// Pair up two columns, keeping only rows where both values are present.
pub fn paired(xs: &[Option<f64>], ys: &[Option<f64>]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

/// Compute the bounds (min/max) for x and y, widening degenerate spans.
fn compute_bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for (x, y) in points {
        if *x < x_min { x_min = *x; }
        if *x > x_max { x_max = *x; }
        if *y < y_min { y_min = *y; }
        if *y > y_max { y_max = *y; }
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

fn build_chart<'a, 'b>(
    root: &'a DrawingArea<BitMapBackend<'b>, plotters::coord::Shift>,
    bounds: (f64, f64, f64, f64),
) -> Result<
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
> {
    let (x_min, x_max, y_min, y_max) = bounds;
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    root.fill(&WHITE)
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    Ok(chart)
}

/// Render a scatter plot of `(x, y)` pairs and save as PNG.
pub fn plot_scatter(output_path: &Path, points: &[(f64, f64)], config: &PlotConfig) -> Result<()> {
    if points.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let root =
        BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    let mut chart = build_chart(&root, compute_bounds(points))?;

    chart
        .draw_series(points.iter().map(|(x, y)| {
            Circle::new((*x, *y), config.point_size as i32, SCATTER_COLOR.filled())
        }))
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Render a line plot of `(x, y)` pairs, drawn in x order, and save as PNG.
pub fn plot_line(output_path: &Path, points: &[(f64, f64)], config: &PlotConfig) -> Result<()> {
    plot_lines(output_path, &[points], config)
}

/// Render one or more line series on a shared chart and save as PNG.
///
/// The first series uses the primary color, every following series the
/// secondary color. Bounds cover all series together.
pub fn plot_lines(
    output_path: &Path,
    series: &[&[(f64, f64)]],
    config: &PlotConfig,
) -> Result<()> {
    let all_points: Vec<(f64, f64)> = series.iter().flat_map(|s| s.iter().copied()).collect();
    if all_points.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let root =
        BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    let mut chart = build_chart(&root, compute_bounds(&all_points))?;

    for (idx, points) in series.iter().enumerate() {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let color = if idx == 0 { LINE_COLOR } else { SECONDARY_LINE_COLOR };
        chart
            .draw_series(LineSeries::new(sorted, color.stroke_width(2)))
            .map_err(|e| PlotError::PlottingError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Render the daily mode series as a line plot over day offsets.
///
/// Gaps (days with no observations) break the line into segments, matching
/// how the series is reported in the CSV artifact.
pub fn plot_daily_modes(
    output_path: &Path,
    series: &[DailyMode],
    config: &PlotConfig,
) -> Result<()> {
    let first_day = match series.first() {
        Some(entry) => entry.day,
        None => return Err(PlotError::EmptySeries),
    };

    let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for entry in series {
        match entry.mode {
            Some(mode) => {
                let x = (entry.day - first_day).num_days() as f64;
                current.push((x, mode));
            }
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    let all_points: Vec<(f64, f64)> = segments.iter().flatten().copied().collect();
    if all_points.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let root =
        BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    let mut chart = build_chart(&root, compute_bounds(&all_points))?;

    for segment in &segments {
        chart
            .draw_series(LineSeries::new(segment.clone(), LINE_COLOR.stroke_width(2)))
            .map_err(|e| PlotError::PlottingError(e.to_string()))?;
        // Single-day segments would otherwise be invisible
        chart
            .draw_series(
                segment
                    .iter()
                    .map(|(x, y)| {
                        Circle::new((*x, *y), config.point_size as i32, LINE_COLOR.filled())
                    }),
            )
            .map_err(|e| PlotError::PlottingError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::PlottingError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_paired_drops_incomplete_rows() {
        let xs = [Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = [Some(10.0), Some(20.0), None, Some(40.0)];
        assert_eq!(paired(&xs, &ys), vec![(1.0, 10.0), (4.0, 40.0)]);
    }

    #[test]
    fn test_compute_bounds_widens_degenerate_span() {
        let (x_min, x_max, y_min, y_max) = compute_bounds(&[(2.0, 5.0), (2.0, 5.0)]);
        assert!(x_max - x_min >= 2.0);
        assert!(y_max - y_min >= 2.0);
    }

    #[test]
    fn test_plot_scatter_writes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scatter.png");
        let points = vec![(1.0, 2.0), (2.0, 3.0), (3.0, 1.0)];

        plot_scatter(&path, &points, &PlotConfig::default()).unwrap();
        assert!(path.exists());
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_plot_scatter_empty_series() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scatter.png");

        let result = plot_scatter(&path, &[], &PlotConfig::default());
        assert!(matches!(result, Err(PlotError::EmptySeries)));
        assert!(!path.exists());
    }

    #[test]
    fn test_plot_lines_two_series() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.png");
        let a = vec![(0.0, 4.1), (1.0, 4.2)];
        let b = vec![(0.0, 25.0), (1.0, 26.0)];

        plot_lines(&path, &[&a, &b], &PlotConfig::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_plot_daily_modes_with_gap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modes.png");
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let series = vec![
            DailyMode { day: day(1), mode: Some(-1.0) },
            DailyMode { day: day(2), mode: None },
            DailyMode { day: day(3), mode: Some(1.0) },
        ];

        plot_daily_modes(&path, &series, &PlotConfig::default()).unwrap();
        assert!(path.exists());
    }
}
