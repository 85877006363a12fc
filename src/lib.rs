//! Batch pipeline for battery-test CSV logs.
//!
//! This crate provides tools for:
//! - Discovering and loading battery-test CSV files (tab or comma delimited)
//! - Cleaning and normalizing tabular data (empty row/column dropping,
//!   header normalization, legacy single-column delimiter repair)
//! - Best-effort numeric and timestamp coercion
//! - Descriptive statistics, per-mode analysis, and IQR outlier detection
//! - Daily resampling of the operating mode
//! - Emitting derived CSV tables and PNG plots, one artifact set per input
//!
//! # Example
//!
//! ```no_run
//! use battery_pipeline::config::PipelineConfig;
//! use battery_pipeline::pipeline::{run_batch, StageSet};
//!
//! let config = PipelineConfig::default();
//! let report = run_batch(".".as_ref(), &config, StageSet::all()).unwrap();
//! println!("processed {} files", report.processed);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod visualization;

pub use config::{AnalysisConfig, Delimiter, LoadConfig, PipelineConfig, PlotConfig};
pub use core::frame::{ColumnValues, Frame};
pub use core::loader::Dataset;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
