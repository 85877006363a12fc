//! Configuration types for the battery pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field delimiter used when parsing input CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Tab-separated values (the raw logger export format).
    Tab,
    /// Comma-separated values.
    Comma,
}

impl Delimiter {
    /// The delimiter byte handed to the CSV reader.
    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

/// Configuration for loading and normalizing input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Delimiter for the whole-dataset summary stage
    #[serde(default = "default_summary_delimiter")]
    pub summary_delimiter: Delimiter,

    /// Delimiter for the per-mode and time-series stages
    #[serde(default = "default_mode_delimiter")]
    pub mode_delimiter: Delimiter,
}

fn default_summary_delimiter() -> Delimiter {
    Delimiter::Tab
}

fn default_mode_delimiter() -> Delimiter {
    Delimiter::Comma
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            summary_delimiter: default_summary_delimiter(),
            mode_delimiter: default_mode_delimiter(),
        }
    }
}

/// Configuration for the analysis stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Column checked for IQR outliers in the summary stage
    #[serde(default = "default_outlier_column")]
    pub outlier_column: String,

    /// IQR fence multiplier (1.5 gives the standard Tukey fence)
    #[serde(default = "default_fence_multiplier")]
    pub fence_multiplier: f64,
}

fn default_outlier_column() -> String {
    "voltage_load".to_string()
}

fn default_fence_multiplier() -> f64 {
    1.5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier_column: default_outlier_column(),
            fence_multiplier: default_fence_multiplier(),
        }
    }
}

/// Configuration for plot rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Plot width in pixels
    #[serde(default = "default_plot_width")]
    pub width: u32,

    /// Plot height in pixels
    #[serde(default = "default_plot_height")]
    pub height: u32,

    /// Marker radius for scatter plots, in pixels
    #[serde(default = "default_point_size")]
    pub point_size: u32,
}

fn default_plot_width() -> u32 {
    1000
}

fn default_plot_height() -> u32 {
    600
}

fn default_point_size() -> u32 {
    3
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            height: default_plot_height(),
            point_size: default_point_size(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_load_config() {
        let config = LoadConfig::default();
        assert_eq!(config.summary_delimiter, Delimiter::Tab);
        assert_eq!(config.mode_delimiter, Delimiter::Comma);
    }

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.analysis.outlier_column, "voltage_load");
        assert_eq!(config.analysis.fence_multiplier, 1.5);
        assert_eq!(config.plot.width, 1000);
    }

    #[test]
    fn test_delimiter_bytes() {
        assert_eq!(Delimiter::Tab.as_byte(), b'\t');
        assert_eq!(Delimiter::Comma.as_byte(), b',');
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.analysis.fence_multiplier = 3.0;
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.analysis.fence_multiplier, 3.0);
        assert_eq!(loaded.load.summary_delimiter, Delimiter::Tab);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("analysis:\n  outlier_column: current_load\n").unwrap();
        assert_eq!(config.analysis.outlier_column, "current_load");
        assert_eq!(config.analysis.fence_multiplier, 1.5);
        assert_eq!(config.load.mode_delimiter, Delimiter::Comma);
    }
}
