//! Typed column frames and best-effort type coercion.
//!
//! A [`Frame`] is the coerced view of a [`Dataset`]: every column carries a
//! tag decided once during coercion (numeric, timestamp, or text) and is
//! consumed by pattern matching thereafter. Coercion is total: a cell that
//! fails to parse becomes a missing value, never an error.

use chrono::NaiveDateTime;
use log::warn;

use super::loader::Dataset;

/// Timestamp formats accepted by the loggers, tried in order. Date-only
/// values resolve to midnight.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Semantic type requested for a column during coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Numeric,
    Timestamp,
}

/// Column data with its coercion tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Numeric values; `None` marks a cell that failed to parse.
    Numeric(Vec<Option<f64>>),
    /// Timestamps; `None` marks a cell that failed to parse.
    Timestamp(Vec<Option<NaiveDateTime>>),
    /// Uncoerced cells, kept as loaded.
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    /// True if the column holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the cells at the given row indices, in order.
    fn select(&self, indices: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Numeric(v) => {
                ColumnValues::Numeric(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnValues::Timestamp(v) => {
                ColumnValues::Timestamp(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnValues::Text(v) => {
                ColumnValues::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// Render one cell for CSV output; missing cells become empty strings.
    pub fn format_cell(&self, row: usize) -> String {
        match self {
            ColumnValues::Numeric(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnValues::Timestamp(v) => v[row]
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            ColumnValues::Text(v) => v[row].clone().unwrap_or_default(),
        }
    }
}

/// A table of tagged columns, produced by [`coerce`].
#[derive(Debug, Clone, Default)]
pub struct Frame {
    labels: Vec<String>,
    columns: Vec<ColumnValues>,
    num_rows: usize,
}

impl Frame {
    /// Number of data rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.labels.len()
    }

    /// True if the frame holds no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Column labels, in load order.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Look up a column by label.
    pub fn column(&self, label: &str) -> Option<&ColumnValues> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| &self.columns[i])
    }

    /// Numeric cells of a column, if it was coerced to numeric.
    pub fn numeric(&self, label: &str) -> Option<&[Option<f64>]> {
        match self.column(label)? {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Timestamp cells of a column, if it was coerced to timestamp.
    pub fn timestamps(&self, label: &str) -> Option<&[Option<NaiveDateTime>]> {
        match self.column(label)? {
            ColumnValues::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    /// Iterate over `(label, column)` pairs in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValues)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// New frame keeping only the rows at the given indices, in order.
    pub fn select_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            labels: self.labels.clone(),
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
            num_rows: indices.len(),
        }
    }

    /// Row indices for which the predicate holds on a numeric column.
    ///
    /// Missing cells never match. Returns an empty vector if the column is
    /// absent or not numeric.
    pub fn numeric_row_indices<F>(&self, label: &str, pred: F) -> Vec<usize>
    where
        F: Fn(f64) -> bool,
    {
        match self.numeric(label) {
            Some(values) => values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| match v {
                    Some(x) if pred(*x) => Some(i),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

fn parse_numeric(cell: &str) -> Option<f64> {
    let v: f64 = cell.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let s = cell.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}

/// Coerce a dataset into a typed [`Frame`].
///
/// Columns named in `plan` are converted to the requested semantic type,
/// cell by cell; unparseable cells degrade to missing. A planned column
/// absent from the dataset logs a warning and is skipped. Columns without a
/// plan entry stay text. Plan entries are independent, so their order never
/// affects the result.
pub fn coerce(dataset: &Dataset, plan: &[(&str, SemanticType)]) -> Frame {
    let num_rows = dataset.num_rows();
    let mut columns: Vec<ColumnValues> = Vec::with_capacity(dataset.num_columns());

    for (idx, label) in dataset.labels.iter().enumerate() {
        let requested = plan
            .iter()
            .find(|(name, _)| *name == label.as_str())
            .map(|(_, ty)| *ty);

        let cells = dataset.rows.iter().map(|row| row[idx].as_deref());

        let column = match requested {
            Some(SemanticType::Numeric) => {
                ColumnValues::Numeric(cells.map(|c| c.and_then(parse_numeric)).collect())
            }
            Some(SemanticType::Timestamp) => {
                ColumnValues::Timestamp(cells.map(|c| c.and_then(parse_timestamp)).collect())
            }
            None => ColumnValues::Text(cells.map(|c| c.map(str::to_string)).collect()),
        };
        columns.push(column);
    }

    for (name, _) in plan {
        if dataset.column_index(name).is_none() {
            warn!("column '{}' not found, skipping coercion", name);
        }
    }

    Frame {
        labels: dataset.labels.clone(),
        columns,
        num_rows,
    }
}

/// Coerce every column of the dataset to numeric, as the whole-dataset
/// summary stage does.
pub fn coerce_all_numeric(dataset: &Dataset) -> Frame {
    let plan: Vec<(&str, SemanticType)> = dataset
        .labels
        .iter()
        .map(|l| (l.as_str(), SemanticType::Numeric))
        .collect();
    coerce(dataset, &plan)
}
