//! CSV writers for derived tables and artifact path naming.
//!
//! Every derived artifact is written next to its input file as
//! `<input-file-name>_<kind>.<ext>`, overwriting any previous run. Writes
//! are plain buffered overwrites; there is no atomic-rename guarantee.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::frame::Frame;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush buffered data.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// A small derived table ready for CSV output: a header row plus string
/// cells. Empty strings are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of data rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True if the table holds no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the artifact path for an input file and artifact kind.
///
/// `data/a.csv` + `summary.csv` gives `data/a.csv_summary.csv`, keeping the
/// full input file name (extension included) as the artifact prefix.
pub fn artifact_path(input: &Path, kind: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}_{}", file_name, kind))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

/// Write a derived table as CSV.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<()> {
    let path_str = path.display().to_string();
    let mut writer = csv_writer(path)?;

    writer
        .write_record(&table.headers)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for row in &table.rows {
        writer.write_record(row).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a frame (typically a row-filtered subset such as an outlier set)
/// as CSV, all columns, missing cells as empty fields.
pub fn write_frame_csv(path: &Path, frame: &Frame) -> Result<()> {
    let path_str = path.display().to_string();
    let mut writer = csv_writer(path)?;

    writer
        .write_record(frame.labels())
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for row in 0..frame.num_rows() {
        let record: Vec<String> = frame.iter().map(|(_, col)| col.format_cell(row)).collect();
        writer.write_record(&record).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
