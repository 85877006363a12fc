//! Descriptive statistics over numeric columns.
//!
//! Conventions follow the battery loggers' historical reports: sample
//! standard deviation (n - 1 denominator), quartiles by linear
//! interpolation over the sorted non-missing values.

use crate::core::frame::{ColumnValues, Frame};
use crate::core::writers::Table;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Stats {
    /// Stats of an empty column: count 0, everything else missing.
    pub fn empty() -> Self {
        Stats {
            count: 0,
            mean: None,
            std: None,
            min: None,
            q25: None,
            median: None,
            q75: None,
            max: None,
        }
    }
}

/// Non-missing values of a column, in row order.
fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().filter_map(|v| *v).collect()
}

/// The p-th percentile (0..=100) by linear interpolation over sorted
/// values. Returns `None` for an empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }

    let weight = rank - lo as f64;
    Some(sorted[lo] * (1.0 - weight) + sorted[hi] * weight)
}

/// Descriptive statistics over a column's non-missing values.
pub fn describe(values: &[Option<f64>]) -> Stats {
    let data = present(values);
    if data.is_empty() {
        return Stats::empty();
    }

    let count = data.len();
    let mean = data.iter().sum::<f64>() / count as f64;

    // Sample standard deviation; undefined for a single observation.
    let std = if count > 1 {
        let ss: f64 = data.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (count - 1) as f64).sqrt())
    } else {
        None
    };

    Stats {
        count,
        mean: Some(mean),
        std,
        min: percentile(&data, 0.0),
        q25: percentile(&data, 25.0),
        median: percentile(&data, 50.0),
        q75: percentile(&data, 75.0),
        max: percentile(&data, 100.0),
    }
}

/// Mean over the non-missing values, or `None` if all missing.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let data = present(values);
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

const STAT_NAMES: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn stat_cells(stats: &Stats) -> [String; 8] {
    let fmt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    [
        stats.count.to_string(),
        fmt(stats.mean),
        fmt(stats.std),
        fmt(stats.min),
        fmt(stats.q25),
        fmt(stats.median),
        fmt(stats.q75),
        fmt(stats.max),
    ]
}

/// Whole-frame summary: one row per column, stats as columns.
///
/// Text and timestamp columns report their non-missing count with the
/// remaining cells blank, so every input column appears in the output.
pub fn summary_table(frame: &Frame) -> Table {
    let mut headers = vec!["column".to_string()];
    headers.extend(STAT_NAMES.iter().map(|s| s.to_string()));

    let rows = frame
        .iter()
        .map(|(label, column)| {
            let mut row = vec![label.to_string()];
            match column {
                ColumnValues::Numeric(values) => {
                    row.extend(stat_cells(&describe(values)));
                }
                ColumnValues::Timestamp(values) => {
                    let count = values.iter().filter(|v| v.is_some()).count();
                    row.push(count.to_string());
                    row.extend(std::iter::repeat(String::new()).take(7));
                }
                ColumnValues::Text(values) => {
                    let count = values.iter().filter(|v| v.is_some()).count();
                    row.push(count.to_string());
                    row.extend(std::iter::repeat(String::new()).take(7));
                }
            }
            row
        })
        .collect();

    Table { headers, rows }
}

/// Stats for a fixed set of numeric columns, stat names as rows and columns
/// as columns (the per-mode report layout).
///
/// Returns `None` if any requested column is absent or not numeric; the
/// caller logs and skips that sub-analysis.
pub fn stats_by_column(frame: &Frame, columns: &[&str]) -> Option<Table> {
    let mut per_column: Vec<[String; 8]> = Vec::with_capacity(columns.len());
    for name in columns {
        let values = frame.numeric(name)?;
        per_column.push(stat_cells(&describe(values)));
    }

    let mut headers = vec![String::new()];
    headers.extend(columns.iter().map(|c| c.to_string()));

    let rows = (0..STAT_NAMES.len())
        .map(|s| {
            let mut row = vec![STAT_NAMES[s].to_string()];
            row.extend(per_column.iter().map(|cells| cells[s].clone()));
            row
        })
        .collect();

    Some(Table { headers, rows })
}
