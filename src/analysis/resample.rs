//! Daily resampling of the operating mode.
//!
//! Buckets rows by the calendar day of their `start_time` and reduces each
//! day to the most frequent raw mode value observed that day. The output
//! index is dense: every day between the dataset's first and last timestamp
//! appears, and days without observations carry a missing entry.

use chrono::{Duration, NaiveDate};

use crate::core::frame::Frame;
use crate::core::writers::Table;

use super::modes::MODE_COLUMN;

/// One resampled day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMode {
    pub day: NaiveDate,
    /// Most frequent raw mode value that day; `None` on empty days.
    pub mode: Option<f64>,
}

/// Most frequent value, ties broken by first-encountered order.
fn most_frequent(values: &[f64]) -> Option<f64> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        match counts.iter_mut().find(|(key, _)| *key == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let best = counts.iter().map(|(_, n)| *n).max()?;
    counts.iter().find(|(_, n)| *n == best).map(|(v, _)| *v)
}

/// Resample the frame's mode by calendar day.
///
/// Requires a timestamp `start_time` column and a numeric `mode` column;
/// returns `None` when either is absent so the caller can skip the
/// analysis. Rows whose timestamp or mode failed coercion are ignored, and
/// a frame with no usable timestamps yields an empty series.
pub fn daily_mode_series(frame: &Frame) -> Option<Vec<DailyMode>> {
    let timestamps = frame.timestamps("start_time")?;
    let modes = frame.numeric(MODE_COLUMN)?;

    // (day, modes-in-row-order) in first-encounter order
    let mut buckets: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for (ts, mode) in timestamps.iter().zip(modes.iter()) {
        let (day, mode) = match (ts, mode) {
            (Some(ts), Some(mode)) => (ts.date(), *mode),
            _ => continue,
        };
        match buckets.iter_mut().find(|(d, _)| *d == day) {
            Some((_, values)) => values.push(mode),
            None => buckets.push((day, vec![mode])),
        }
    }

    let first = buckets.iter().map(|(d, _)| *d).min();
    let last = buckets.iter().map(|(d, _)| *d).max();
    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => return Some(Vec::new()),
    };

    let mut series = Vec::new();
    let mut day = first;
    while day <= last {
        let mode = buckets
            .iter()
            .find(|(d, _)| *d == day)
            .and_then(|(_, values)| most_frequent(values));
        series.push(DailyMode { day, mode });
        day = day + Duration::days(1);
    }

    Some(series)
}

/// Render a daily series as the time-series artifact table.
pub fn daily_series_table(series: &[DailyMode]) -> Table {
    Table {
        headers: vec!["start_time".to_string(), "mode".to_string()],
        rows: series
            .iter()
            .map(|entry| {
                vec![
                    entry.day.format("%Y-%m-%d").to_string(),
                    entry.mode.map(|v| v.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{coerce, SemanticType};
    use crate::core::loader::Dataset;

    fn frame_from(rows: &[(&str, &str)]) -> Frame {
        let ds = Dataset {
            labels: vec!["start_time".into(), "mode".into()],
            rows: rows
                .iter()
                .map(|(ts, m)| vec![Some(ts.to_string()), Some(m.to_string())])
                .collect(),
        };
        coerce(
            &ds,
            &[
                ("start_time", SemanticType::Timestamp),
                ("mode", SemanticType::Numeric),
            ],
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_most_frequent_tie_breaks_first_encountered() {
        assert_eq!(most_frequent(&[1.0, -1.0, -1.0, 1.0]), Some(1.0));
        assert_eq!(most_frequent(&[0.0, 1.0, 1.0]), Some(1.0));
        assert_eq!(most_frequent(&[]), None);
    }

    #[test]
    fn test_series_is_dense_and_inclusive() {
        let frame = frame_from(&[
            ("2024-03-01 08:00:00", "-1"),
            ("2024-03-01 09:00:00", "-1"),
            ("2024-03-01 10:00:00", "1"),
            // no rows on the 2nd and 3rd
            ("2024-03-04 08:00:00", "0"),
        ]);
        let series = daily_mode_series(&frame).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series[0], DailyMode { day: day(2024, 3, 1), mode: Some(-1.0) });
        assert_eq!(series[1], DailyMode { day: day(2024, 3, 2), mode: None });
        assert_eq!(series[2], DailyMode { day: day(2024, 3, 3), mode: None });
        assert_eq!(series[3], DailyMode { day: day(2024, 3, 4), mode: Some(0.0) });
    }

    #[test]
    fn test_unparseable_rows_are_ignored() {
        let frame = frame_from(&[
            ("garbage", "-1"),
            ("2024-03-01 08:00:00", "oops"),
            ("2024-03-01 09:00:00", "1"),
        ]);
        let series = daily_mode_series(&frame).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].mode, Some(1.0));
    }

    #[test]
    fn test_missing_columns_skip() {
        let ds = Dataset {
            labels: vec!["start_time".into()],
            rows: vec![vec![Some("2024-03-01".into())]],
        };
        let frame = coerce(&ds, &[("start_time", SemanticType::Timestamp)]);
        assert!(daily_mode_series(&frame).is_none());
    }

    #[test]
    fn test_no_usable_timestamps_yields_empty_series() {
        let frame = frame_from(&[("nope", "1")]);
        assert_eq!(daily_mode_series(&frame).unwrap(), Vec::new());
    }

    #[test]
    fn test_daily_series_table() {
        let series = vec![
            DailyMode { day: day(2024, 3, 1), mode: Some(-1.0) },
            DailyMode { day: day(2024, 3, 2), mode: None },
        ];
        let table = daily_series_table(&series);

        assert_eq!(table.headers, vec!["start_time", "mode"]);
        assert_eq!(table.rows[0], vec!["2024-03-01", "-1"]);
        assert_eq!(table.rows[1], vec!["2024-03-02", ""]);
    }
}
