//! IQR-fence outlier detection.

use crate::core::frame::Frame;

use super::describe::percentile;

/// The IQR fence `[q1 - k*iqr, q3 + k*iqr]` for a set of values.
///
/// Returns `None` when the input is empty or the IQR is zero; in both
/// cases there is no meaningful fence and no outliers are reported.
pub fn iqr_fence(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let q1 = percentile(values, 25.0)?;
    let q3 = percentile(values, 75.0)?;
    let iqr = q3 - q1;
    if iqr == 0.0 {
        return None;
    }
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Row indices whose value in `column` lies strictly outside the IQR fence.
///
/// Degenerate inputs (absent or non-numeric column, all-missing values,
/// zero IQR) yield an empty set rather than an error.
pub fn outlier_rows(frame: &Frame, column: &str, multiplier: f64) -> Vec<usize> {
    let values: Vec<f64> = match frame.numeric(column) {
        Some(cells) => cells.iter().filter_map(|v| *v).collect(),
        None => return Vec::new(),
    };

    let (lower, upper) = match iqr_fence(&values, multiplier) {
        Some(fence) => fence,
        None => return Vec::new(),
    };

    frame.numeric_row_indices(column, |v| v < lower || v > upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::coerce_all_numeric;
    use crate::core::loader::Dataset;

    fn numeric_frame(label: &str, values: &[&str]) -> Frame {
        let ds = Dataset {
            labels: vec![label.to_string()],
            rows: values.iter().map(|v| vec![Some(v.to_string())]).collect(),
        };
        coerce_all_numeric(&ds)
    }

    #[test]
    fn test_detects_extreme_values() {
        let frame = numeric_frame(
            "voltage_load",
            &["3.6", "3.7", "3.7", "3.8", "3.7", "3.6", "3.8", "100.0"],
        );
        let rows = outlier_rows(&frame, "voltage_load", 1.5);
        assert_eq!(rows, vec![7]);
    }

    #[test]
    fn test_zero_iqr_yields_empty_set() {
        // Identical quartiles, one deviating value: no fence, no outliers.
        let frame = numeric_frame("v", &["5", "5", "5", "5", "5", "9"]);
        assert!(outlier_rows(&frame, "v", 1.5).is_empty());
    }

    #[test]
    fn test_all_missing_yields_empty_set() {
        let frame = numeric_frame("v", &["x", "y", "z"]);
        assert!(outlier_rows(&frame, "v", 1.5).is_empty());
    }

    #[test]
    fn test_absent_column_yields_empty_set() {
        let frame = numeric_frame("v", &["1", "2", "3"]);
        assert!(outlier_rows(&frame, "other", 1.5).is_empty());
    }

    #[test]
    fn test_widening_fence_is_monotonic() {
        let frame = numeric_frame(
            "v",
            &["1", "2", "3", "4", "5", "6", "7", "8", "20", "40", "80"],
        );

        let mut previous = usize::MAX;
        for multiplier in [0.5, 1.0, 1.5, 3.0, 10.0] {
            let count = outlier_rows(&frame, "v", multiplier).len();
            assert!(count <= previous);
            previous = count;
        }
    }
}
