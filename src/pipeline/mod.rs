//! Batch orchestration: file discovery, per-file processing, stage wiring.
//!
//! Files are processed strictly one at a time; a file that fails to load is
//! logged and skipped, and a sub-analysis whose required columns are absent
//! is skipped without affecting the rest of the file. No state survives
//! from one file to the next.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::analysis::{
    cycle_table, daily_mode_series, mode_stats_table, outlier_rows, partition_by_mode,
    summary_table, Mode,
};
use crate::analysis::resample::daily_series_table;
use crate::config::PipelineConfig;
use crate::core::frame::{coerce, coerce_all_numeric, Frame, SemanticType};
use crate::core::loader::load_dataset;
use crate::core::writers::{artifact_path, write_frame_csv, write_table_csv};
use crate::visualization::{paired, plot_daily_modes, plot_line, plot_lines, plot_scatter};

/// Coercion plan for the per-mode analysis stage. `mission_type` carries no
/// statistics but is kept numeric for parity with the raw logs.
const MODES_PLAN: [(&str, SemanticType); 9] = [
    ("start_time", SemanticType::Timestamp),
    ("time", SemanticType::Numeric),
    ("voltage_charger", SemanticType::Numeric),
    ("temperature_battery", SemanticType::Numeric),
    ("voltage_load", SemanticType::Numeric),
    ("current_load", SemanticType::Numeric),
    ("temperature_mosfet", SemanticType::Numeric),
    ("temperature_resistor", SemanticType::Numeric),
    ("mode", SemanticType::Numeric),
];

/// Coercion plan for the time-series stage.
const TIME_SERIES_PLAN: [(&str, SemanticType); 2] = [
    ("start_time", SemanticType::Timestamp),
    ("mode", SemanticType::Numeric),
];

/// Which analysis stages run for each file.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageSet {
    pub summary: bool,
    pub modes: bool,
    pub time_series: bool,
}

impl StageSet {
    /// All stages in one pass per file.
    pub fn all() -> Self {
        Self {
            summary: true,
            modes: true,
            time_series: true,
        }
    }

    /// Whole-dataset summary only.
    pub fn summary_only() -> Self {
        Self {
            summary: true,
            ..Default::default()
        }
    }

    /// Per-mode analysis only.
    pub fn modes_only() -> Self {
        Self {
            modes: true,
            ..Default::default()
        }
    }

    /// Daily time-series analysis only.
    pub fn time_series_only() -> Self {
        Self {
            time_series: true,
            ..Default::default()
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReport {
    /// Files fully processed.
    pub processed: usize,
    /// Files skipped because they failed to load.
    pub skipped: usize,
    /// Artifact files written.
    pub artifacts: usize,
}

/// Find all `.csv` files directly inside a directory, sorted by path.
///
/// The list is collected before any processing starts, so artifacts written
/// during the run never feed back into the same run.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory '{}'", dir.display()))?;

    let mut csv_files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();

    csv_files.sort();
    Ok(csv_files)
}

/// Process every discovered CSV file with the selected stages.
///
/// Load failures skip the file and the batch continues; only an unreadable
/// target directory is a hard error.
pub fn run_batch(dir: &Path, config: &PipelineConfig, stages: StageSet) -> Result<BatchReport> {
    let files = discover_csv_files(dir)?;
    let mut report = BatchReport::default();

    if files.is_empty() {
        info!("No CSV files found in '{}'", dir.display());
        return Ok(report);
    }

    for file in &files {
        info!("Processing file: {}", file.display());
        match process_file(file, config, stages) {
            Ok(artifacts) => {
                report.processed += 1;
                report.artifacts += artifacts;
                info!("Finished processing {}", file.display());
            }
            Err(e) => {
                warn!("Error reading {}: {:#}", file.display(), e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Process one file: run each selected stage, return the artifact count.
///
/// Each stage re-reads the file with its own delimiter, mirroring the
/// independent capture scripts the stages descend from.
pub fn process_file(path: &Path, config: &PipelineConfig, stages: StageSet) -> Result<usize> {
    let mut artifacts = 0;

    if stages.summary {
        artifacts += run_summary_stage(path, config)?;
    }
    if stages.modes {
        artifacts += run_modes_stage(path, config)?;
    }
    if stages.time_series {
        artifacts += run_time_series_stage(path, config)?;
    }

    Ok(artifacts)
}

/// Whole-dataset summary, voltage-vs-temperature scatter, voltage outliers.
fn run_summary_stage(path: &Path, config: &PipelineConfig) -> Result<usize> {
    let dataset = load_dataset(path, config.load.summary_delimiter)?;
    let frame = coerce_all_numeric(&dataset);
    let mut artifacts = 0;

    let summary = summary_table(&frame);
    let summary_path = artifact_path(path, "summary.csv");
    write_table_csv(&summary_path, &summary)?;
    info!("Summary statistics saved to: {}", summary_path.display());
    artifacts += 1;

    artifacts += emit_scatter(
        path,
        &frame,
        "voltage_load",
        "temperature_battery",
        "voltage_vs_temp.png",
        config,
    )?;

    if frame.numeric(&config.analysis.outlier_column).is_some() {
        let rows = outlier_rows(
            &frame,
            &config.analysis.outlier_column,
            config.analysis.fence_multiplier,
        );
        let outliers = frame.select_rows(&rows);
        let kind = format!("{}_outliers.csv", config.analysis.outlier_column);
        let outlier_path = artifact_path(path, &kind);
        write_frame_csv(&outlier_path, &outliers)?;
        info!("Outliers saved to: {}", outlier_path.display());
        artifacts += 1;
    } else {
        debug!(
            "column '{}' absent, skipping outlier detection for {}",
            config.analysis.outlier_column,
            path.display()
        );
    }

    Ok(artifacts)
}

/// Per-mode statistics and plots, plus the overall cycle table.
fn run_modes_stage(path: &Path, config: &PipelineConfig) -> Result<usize> {
    let dataset = load_dataset(path, config.load.mode_delimiter)?;
    let frame = coerce(&dataset, &MODES_PLAN);
    let mut artifacts = 0;

    for mode in Mode::ALL {
        let subset = partition_by_mode(&frame, mode);
        if subset.is_empty() {
            debug!("no {} rows in {}, skipping", mode.name(), path.display());
            continue;
        }

        match mode_stats_table(&subset, mode) {
            Some(table) => {
                let stats_path = artifact_path(path, &format!("{}_stats.csv", mode.name()));
                write_table_csv(&stats_path, &table)?;
                info!("{} statistics saved to: {}", mode.name(), stats_path.display());
                artifacts += 1;
            }
            None => {
                warn!(
                    "missing columns for {} statistics in {}, skipping",
                    mode.name(),
                    path.display()
                );
            }
        }

        artifacts += emit_mode_plot(path, &subset, mode, config)?;
    }

    match cycle_table(&frame) {
        Some(table) => {
            let cycle_path = artifact_path(path, "battery_cycle_analysis.csv");
            write_table_csv(&cycle_path, &table)?;
            info!("Cycle analysis saved to: {}", cycle_path.display());
            artifacts += 1;
        }
        None => {
            warn!(
                "missing columns for cycle analysis in {}, skipping",
                path.display()
            );
        }
    }

    Ok(artifacts)
}

/// Daily mode resampling: CSV series plus line plot.
fn run_time_series_stage(path: &Path, config: &PipelineConfig) -> Result<usize> {
    let dataset = load_dataset(path, config.load.mode_delimiter)?;
    let frame = coerce(&dataset, &TIME_SERIES_PLAN);
    let mut artifacts = 0;

    let series = match daily_mode_series(&frame) {
        Some(series) => series,
        None => {
            warn!(
                "start_time/mode columns absent in {}, skipping time-series analysis",
                path.display()
            );
            return Ok(0);
        }
    };

    let table = daily_series_table(&series);
    let csv_path = artifact_path(path, "time_series_analysis.csv");
    write_table_csv(&csv_path, &table)?;
    info!("Time-series analysis saved to: {}", csv_path.display());
    artifacts += 1;

    let png_path = artifact_path(path, "time_series_analysis.png");
    match plot_daily_modes(&png_path, &series, &config.plot) {
        Ok(()) => {
            info!("Time-series plot saved to: {}", png_path.display());
            artifacts += 1;
        }
        Err(e) => debug!("skipping time-series plot for {}: {}", path.display(), e),
    }

    Ok(artifacts)
}

/// Scatter plot of two numeric columns; silently skipped when either
/// column is absent or no complete pairs exist.
fn emit_scatter(
    path: &Path,
    frame: &Frame,
    x: &str,
    y: &str,
    kind: &str,
    config: &PipelineConfig,
) -> Result<usize> {
    let (xs, ys) = match (frame.numeric(x), frame.numeric(y)) {
        (Some(xs), Some(ys)) => (xs, ys),
        _ => {
            debug!("columns '{}'/'{}' absent, skipping {}", x, y, kind);
            return Ok(0);
        }
    };

    let points = paired(xs, ys);
    if points.is_empty() {
        debug!("no complete '{}'/'{}' pairs, skipping {}", x, y, kind);
        return Ok(0);
    }

    let plot_path = artifact_path(path, kind);
    plot_scatter(&plot_path, &points, &config.plot)?;
    info!("Plot saved to: {}", plot_path.display());
    Ok(1)
}

/// The plot associated with one mode's subset.
fn emit_mode_plot(
    path: &Path,
    subset: &Frame,
    mode: Mode,
    config: &PipelineConfig,
) -> Result<usize> {
    match mode {
        Mode::Discharge => emit_scatter(
            path,
            subset,
            "voltage_load",
            "current_load",
            "voltage_vs_current_discharge.png",
            config,
        ),
        Mode::Rest => {
            let points = match (subset.numeric("time"), subset.numeric("temperature_battery")) {
                (Some(xs), Some(ys)) => paired(xs, ys),
                _ => Vec::new(),
            };
            if points.is_empty() {
                debug!("skipping rest plot for {}", path.display());
                return Ok(0);
            }
            let plot_path = artifact_path(path, "temperature_vs_time_rest.png");
            plot_line(&plot_path, &points, &config.plot)?;
            info!("Plot saved to: {}", plot_path.display());
            Ok(1)
        }
        Mode::Charge => {
            let (times, voltage, temperature) = match (
                subset.numeric("time"),
                subset.numeric("voltage_charger"),
                subset.numeric("temperature_battery"),
            ) {
                (Some(t), Some(v), Some(temp)) => (t, v, temp),
                _ => {
                    debug!("skipping charge plot for {}", path.display());
                    return Ok(0);
                }
            };

            let voltage_series = paired(times, voltage);
            let temperature_series = paired(times, temperature);
            if voltage_series.is_empty() && temperature_series.is_empty() {
                debug!("skipping charge plot for {}", path.display());
                return Ok(0);
            }

            let plot_path = artifact_path(path, "voltage_temp_vs_time_charge.png");
            plot_lines(
                &plot_path,
                &[&voltage_series, &temperature_series],
                &config.plot,
            )?;
            info!("Plot saved to: {}", plot_path.display());
            Ok(1)
        }
    }
}
