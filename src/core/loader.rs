//! Loading and normalization of battery-test CSV logs.
//!
//! This module parses a raw CSV file into an untyped [`Dataset`] and applies
//! the cleaning steps every analysis stage relies on:
//! - dropping all-empty columns, then all-empty rows (in that order)
//! - trimming and lower-casing column labels
//! - repairing single-column delimiter misdetection by re-splitting on commas

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use crate::config::Delimiter;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// An untyped in-memory table: normalized column labels plus string cells.
///
/// A `None` cell is a missing value. Rows are ragged-safe: every row is
/// padded to the label count on load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Normalized (trimmed, lower-cased) column labels.
    pub labels: Vec<String>,
    /// Row-major cell data, one `Vec` per row, aligned with `labels`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Number of data rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.labels.len()
    }

    /// True if the dataset holds no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by its normalized label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Turn a raw cell into an owned value, treating blank strings as missing.
fn cell_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Normalize a single column label: trim whitespace, lower-case.
///
/// Idempotent: normalizing an already-normalized label is a no-op.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Drop columns that are entirely missing, then rows that are entirely
/// missing. The order matters: a row that only had values in dropped
/// columns becomes empty and is removed by the second pass.
///
/// Idempotent: re-applying to the result is a no-op.
pub fn drop_empty(dataset: &mut Dataset) {
    let num_cols = dataset.labels.len();

    // Column pass
    let keep: Vec<bool> = (0..num_cols)
        .map(|c| dataset.rows.iter().any(|row| row[c].is_some()))
        .collect();

    if keep.iter().any(|&k| !k) {
        let mut labels = Vec::with_capacity(num_cols);
        for (c, label) in dataset.labels.drain(..).enumerate() {
            if keep[c] {
                labels.push(label);
            }
        }
        dataset.labels = labels;

        for row in &mut dataset.rows {
            let mut kept = Vec::with_capacity(dataset.labels.len());
            for (c, cell) in row.drain(..).enumerate() {
                if keep[c] {
                    kept.push(cell);
                }
            }
            *row = kept;
        }
    }

    // Row pass
    dataset.rows.retain(|row| row.iter().any(|c| c.is_some()));
}

/// Legacy delimiter repair for datasets that collapsed into one column.
///
/// When the configured delimiter was wrong, the whole header and every data
/// row land in a single column. This heuristic re-splits the header label and
/// every cell on commas. It is lossy whenever
/// a data value legitimately contains a comma; that is a known limitation of
/// the original capture scripts, preserved here deliberately.
///
/// A header-only input yields an empty dataset rather than an error.
pub fn repair_single_column(dataset: &mut Dataset) {
    if dataset.labels.len() != 1 {
        return;
    }

    let labels: Vec<String> = dataset.labels[0].split(',').map(normalize_label).collect();
    let width = labels.len();

    // The first data row is the misparsed header line's successor and is
    // consumed along with the header, matching the original scripts.
    let rows: Vec<Vec<Option<String>>> = dataset
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let cell = row[0].as_deref().unwrap_or("");
            let mut split: Vec<Option<String>> = cell.split(',').map(cell_value).collect();
            split.resize(width, None);
            split.truncate(width);
            split
        })
        .collect();

    dataset.labels = labels;
    dataset.rows = rows;
}

/// Load a battery-test CSV file into a normalized [`Dataset`].
///
/// Applies, in order: CSV parsing with the given delimiter, empty column and
/// row dropping, label normalization, and the single-column delimiter
/// repair.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it contains
/// no header row at all. A file that loses every data row to cleaning still
/// loads successfully as an empty dataset.
pub fn load_dataset<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter.as_byte())
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::EmptyFile(path.to_path_buf()));
    }

    let labels: Vec<String> = headers.iter().map(normalize_label).collect();
    let width = labels.len();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row: Vec<Option<String>> = record.iter().map(cell_value).collect();
        row.resize(width, None);
        row.truncate(width);
        rows.push(row);
    }

    let mut dataset = Dataset { labels, rows };
    drop_empty(&mut dataset);
    repair_single_column(&mut dataset);

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset_from(labels: &[&str], rows: &[&[Option<&str>]]) -> Dataset {
        Dataset {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn test_load_tab_separated() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Start_Time\tMode\tVoltage_Load").unwrap();
        writeln!(file, "2024-01-01 00:00:00\t-1\t3.7").unwrap();
        writeln!(file, "2024-01-01 00:00:05\t0\t3.8").unwrap();
        file.flush().unwrap();

        let ds = load_dataset(file.path(), Delimiter::Tab)?;
        assert_eq!(ds.labels, vec!["start_time", "mode", "voltage_load"]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.rows[0][2].as_deref(), Some("3.7"));

        Ok(())
    }

    #[test]
    fn test_normalize_label_idempotent() {
        let once = normalize_label("  Voltage_Load ");
        assert_eq!(once, "voltage_load");
        assert_eq!(normalize_label(&once), once);
    }

    #[test]
    fn test_drop_empty_column_then_row() {
        // Second column is entirely empty; second row only had a value there
        // before the column pass, so it must fall in the row pass.
        let mut ds = dataset_from(
            &["a", "b"],
            &[&[Some("1"), None], &[None, None], &[Some("3"), None]],
        );
        drop_empty(&mut ds);

        assert_eq!(ds.labels, vec!["a"]);
        assert_eq!(ds.num_rows(), 2);
    }

    #[test]
    fn test_drop_empty_idempotent() {
        let mut ds = dataset_from(
            &["a", "b", "c"],
            &[&[Some("1"), None, None], &[None, None, Some("2")]],
        );
        drop_empty(&mut ds);
        let labels = ds.labels.clone();
        let rows = ds.rows.clone();

        drop_empty(&mut ds);
        assert_eq!(ds.labels, labels);
        assert_eq!(ds.rows, rows);
    }

    #[test]
    fn test_single_column_repair() -> Result<()> {
        // Comma data loaded with a tab delimiter collapses into one column.
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "4,5,6").unwrap();
        file.flush().unwrap();

        let ds = load_dataset(file.path(), Delimiter::Tab)?;
        assert_eq!(ds.labels, vec!["a", "b", "c"]);
        assert_eq!(ds.num_rows(), 1);
        assert_eq!(ds.rows[0][0].as_deref(), Some("4"));
        assert_eq!(ds.rows[0][2].as_deref(), Some("6"));

        Ok(())
    }

    #[test]
    fn test_single_column_repair_header_only() {
        // Repair that only yields a header must leave an empty dataset. The
        // labels come from the collapsed header label, while the single data
        // row is consumed with it.
        let mut ds = dataset_from(&["a,b,c"], &[&[Some("x,y,z")]]);
        repair_single_column(&mut ds);

        assert_eq!(ds.labels, vec!["a", "b", "c"]);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_repair_normalizes_split_header() {
        // Duplicate header line in the data, the classic misdetection shape.
        let mut ds = dataset_from(
            &[" Mode , Voltage_Load "],
            &[&[Some("Mode,Voltage_Load")], &[Some("-1,3.7")]],
        );
        repair_single_column(&mut ds);

        assert_eq!(ds.labels, vec!["mode", "voltage_load"]);
        assert_eq!(ds.num_rows(), 1);
        assert_eq!(ds.rows[0][1].as_deref(), Some("3.7"));
    }

    #[test]
    fn test_blank_cells_become_missing() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,").unwrap();
        writeln!(file, " ,2").unwrap();
        file.flush().unwrap();

        let ds = load_dataset(file.path(), Delimiter::Comma)?;
        assert_eq!(ds.rows[0][1], None);
        assert_eq!(ds.rows[1][0], None);

        Ok(())
    }

    #[test]
    fn test_column_index() {
        let ds = dataset_from(&["mode", "voltage_load"], &[]);
        assert_eq!(ds.column_index("voltage_load"), Some(1));
        assert_eq!(ds.column_index("missing"), None);
    }
}
