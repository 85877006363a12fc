//! Mode partitioning, per-mode statistics, and the battery cycle table.
//!
//! The `mode` column encodes the operating state of the pack: -1 while
//! discharging into the load, 0 at rest, 1 while charging. Rows with a
//! missing or unrecognized mode belong to none of the three named subsets
//! but still appear in the grouped cycle table under their raw value.

use crate::core::frame::Frame;
use crate::core::writers::Table;

use super::describe::{mean, stats_by_column};

/// Label of the column holding the operating mode.
pub const MODE_COLUMN: &str = "mode";

/// Battery operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Discharge,
    Rest,
    Charge,
}

impl Mode {
    /// All modes, in their numeric order.
    pub const ALL: [Mode; 3] = [Mode::Discharge, Mode::Rest, Mode::Charge];

    /// The raw value stored in the `mode` column.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Mode::Discharge => -1.0,
            Mode::Rest => 0.0,
            Mode::Charge => 1.0,
        }
    }

    /// Short name used in artifact file names and log messages.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Discharge => "discharge",
            Mode::Rest => "rest",
            Mode::Charge => "charge",
        }
    }

    /// Numeric columns reported in this mode's statistics table.
    pub fn stat_columns(self) -> &'static [&'static str] {
        match self {
            Mode::Discharge => &[
                "voltage_load",
                "current_load",
                "temperature_mosfet",
                "temperature_resistor",
            ],
            Mode::Rest | Mode::Charge => &["voltage_charger", "temperature_battery"],
        }
    }
}

/// The rows of `frame` whose mode equals the given mode's raw value.
///
/// Missing modes never match, so the three subsets are pairwise disjoint
/// and their union is exactly the {-1, 0, 1}-valued rows.
pub fn partition_by_mode(frame: &Frame, mode: Mode) -> Frame {
    let target = mode.value();
    let indices = frame.numeric_row_indices(MODE_COLUMN, |v| v == target);
    frame.select_rows(&indices)
}

/// Per-mode descriptive statistics over that mode's column set.
///
/// `subset` must already be partitioned to one mode. Returns `None` when
/// any required column is absent or not numeric; callers log and skip.
pub fn mode_stats_table(subset: &Frame, mode: Mode) -> Option<Table> {
    stats_by_column(subset, mode.stat_columns())
}

/// Columns whose means appear in the cycle table.
const CYCLE_MEAN_COLUMNS: [&str; 4] = [
    "voltage_charger",
    "temperature_battery",
    "voltage_load",
    "current_load",
];

/// The overall battery cycle table: one row per distinct raw mode value
/// (ascending), with the first start timestamp, the last elapsed-time
/// value, and the per-group means of the main electrical columns.
///
/// Requires `mode`, `start_time`, `time`, and the four mean columns to be
/// present with their coerced types; otherwise returns `None` and the
/// caller skips the sub-analysis.
pub fn cycle_table(frame: &Frame) -> Option<Table> {
    let mode_values = frame.numeric(MODE_COLUMN)?;
    let start_times = frame.timestamps("start_time")?;
    let times = frame.numeric("time")?;
    let mean_columns: Vec<&[Option<f64>]> = CYCLE_MEAN_COLUMNS
        .iter()
        .map(|name| frame.numeric(name))
        .collect::<Option<Vec<_>>>()?;

    // f64 keys, so grouping goes through a sorted Vec instead of a HashMap.
    let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
    for (i, value) in mode_values.iter().enumerate() {
        let v = match value {
            Some(v) => *v,
            None => continue,
        };
        match groups.iter_mut().find(|(key, _)| *key == v) {
            Some((_, rows)) => rows.push(i),
            None => groups.push((v, vec![i])),
        }
    }
    groups.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let headers = vec![
        "mode".to_string(),
        "start_time".to_string(),
        "end_time".to_string(),
        "average_voltage_charger".to_string(),
        "average_temperature_battery".to_string(),
        "average_voltage_load".to_string(),
        "average_current_load".to_string(),
    ];

    let rows = groups
        .into_iter()
        .map(|(key, indices)| {
            let first_start = indices
                .iter()
                .find_map(|&i| start_times[i])
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            let last_time = indices
                .iter()
                .rev()
                .find_map(|&i| times[i])
                .map(|v| v.to_string())
                .unwrap_or_default();

            let mut row = vec![key.to_string(), first_start, last_time];
            for column in &mean_columns {
                let values: Vec<Option<f64>> = indices.iter().map(|&i| column[i]).collect();
                row.push(mean(&values).map(|v| v.to_string()).unwrap_or_default());
            }
            row
        })
        .collect();

    Some(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{coerce, SemanticType};
    use crate::core::loader::Dataset;

    fn mode_dataset() -> Dataset {
        let rows = [
            ("2024-01-01 00:00:00", "-1", "0", "3.7", "1.2", "4.1", "25"),
            ("2024-01-01 00:00:05", "-1", "5", "3.6", "1.3", "4.1", "26"),
            ("2024-01-01 00:00:10", "0", "10", "3.6", "0", "4.2", "24"),
            ("2024-01-01 00:00:15", "1", "15", "3.8", "0", "4.3", "23"),
            ("2024-01-01 00:00:20", "7", "20", "3.9", "0", "4.4", "22"),
        ];
        Dataset {
            labels: vec![
                "start_time".into(),
                "mode".into(),
                "time".into(),
                "voltage_load".into(),
                "current_load".into(),
                "voltage_charger".into(),
                "temperature_battery".into(),
            ],
            rows: rows
                .iter()
                .map(|(st, m, t, vl, cl, vc, tb)| {
                    vec![
                        Some(st.to_string()),
                        Some(m.to_string()),
                        Some(t.to_string()),
                        Some(vl.to_string()),
                        Some(cl.to_string()),
                        Some(vc.to_string()),
                        Some(tb.to_string()),
                    ]
                })
                .collect(),
        }
    }

    fn mode_frame() -> Frame {
        coerce(
            &mode_dataset(),
            &[
                ("start_time", SemanticType::Timestamp),
                ("mode", SemanticType::Numeric),
                ("time", SemanticType::Numeric),
                ("voltage_load", SemanticType::Numeric),
                ("current_load", SemanticType::Numeric),
                ("voltage_charger", SemanticType::Numeric),
                ("temperature_battery", SemanticType::Numeric),
            ],
        )
    }

    #[test]
    fn test_partition_is_disjoint_and_covers_named_modes() {
        let frame = mode_frame();

        let discharge = partition_by_mode(&frame, Mode::Discharge);
        let rest = partition_by_mode(&frame, Mode::Rest);
        let charge = partition_by_mode(&frame, Mode::Charge);

        assert_eq!(discharge.num_rows(), 2);
        assert_eq!(rest.num_rows(), 1);
        assert_eq!(charge.num_rows(), 1);

        // Union of named partitions = rows with mode in {-1, 0, 1}; the
        // mode-7 row belongs to none of them.
        let named: usize = discharge.num_rows() + rest.num_rows() + charge.num_rows();
        let in_named = frame
            .numeric_row_indices(MODE_COLUMN, |v| v == -1.0 || v == 0.0 || v == 1.0)
            .len();
        assert_eq!(named, in_named);
        assert_eq!(frame.num_rows() - named, 1);
    }

    #[test]
    fn test_mode_stats_table_rest() {
        let frame = mode_frame();
        let rest = partition_by_mode(&frame, Mode::Rest);
        let table = mode_stats_table(&rest, Mode::Rest).unwrap();

        assert_eq!(table.headers, vec!["", "voltage_charger", "temperature_battery"]);
        assert_eq!(table.rows[0], vec!["count", "1", "1"]);
    }

    #[test]
    fn test_mode_stats_table_missing_column() {
        let ds = Dataset {
            labels: vec!["mode".into()],
            rows: vec![vec![Some("0".into())]],
        };
        let frame = coerce(&ds, &[("mode", SemanticType::Numeric)]);
        let rest = partition_by_mode(&frame, Mode::Rest);
        assert!(mode_stats_table(&rest, Mode::Rest).is_none());
    }

    #[test]
    fn test_cycle_table_groups_by_raw_mode() {
        let frame = mode_frame();
        let table = cycle_table(&frame).unwrap();

        // Distinct raw modes: -1, 0, 1, 7 (ascending)
        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.rows[0][0], "-1");
        assert_eq!(table.rows[3][0], "7");

        // Discharge group: first start_time, last time, mean voltage_load
        assert_eq!(table.rows[0][1], "2024-01-01 00:00:00");
        assert_eq!(table.rows[0][2], "5");
        let mean_voltage: f64 = table.rows[0][5].parse().unwrap();
        assert!((mean_voltage - 3.65).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_table_requires_mode() {
        let ds = Dataset {
            labels: vec!["a".into()],
            rows: vec![vec![Some("1".into())]],
        };
        let frame = coerce(&ds, &[("a", SemanticType::Numeric)]);
        assert!(cycle_table(&frame).is_none());
    }
}
