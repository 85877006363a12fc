//! Statistical analysis of coerced battery-test frames.

pub mod describe;
pub mod modes;
pub mod outliers;
pub mod resample;

pub use describe::{describe, percentile, stats_by_column, summary_table, Stats};
pub use modes::{cycle_table, mode_stats_table, partition_by_mode, Mode, MODE_COLUMN};
pub use outliers::{iqr_fence, outlier_rows};
pub use resample::{daily_mode_series, daily_series_table, DailyMode};
