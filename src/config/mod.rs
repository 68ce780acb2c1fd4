//! Configuration types for the flowviz pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level settings: naming, radar network and data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used as the output file prefix
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Radar identifiers expected in the input (reporting only)
    #[serde(default)]
    pub radars: Vec<String>,

    /// Countries covered by the radar network (reporting only)
    #[serde(default)]
    pub countries: Vec<String>,

    /// Directory holding the per-radar vp CSV files
    #[serde(default = "default_vp_data_dir")]
    pub vp_data_dir: PathBuf,

    /// Directory the flowviz CSV is written to
    #[serde(default = "default_processed_data_dir")]
    pub processed_data_dir: PathBuf,
}

fn default_project_name() -> String {
    "flowviz".to_string()
}

fn default_vp_data_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_processed_data_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            radars: Vec::new(),
            countries: Vec::new(),
            vp_data_dir: default_vp_data_dir(),
            processed_data_dir: default_processed_data_dir(),
        }
    }
}

/// Rules for discovering input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Substring a file name must contain
    #[serde(default = "default_file_marker")]
    pub file_marker: String,

    /// Suffix a file name must end with
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

fn default_file_marker() -> String {
    "vpts".to_string()
}

fn default_file_extension() -> String {
    ".csv".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_marker: default_file_marker(),
            file_extension: default_file_extension(),
        }
    }
}

/// Altitude band edges in meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Lower edge (inclusive) of band "1"
    #[serde(default = "default_low_band_min")]
    pub low_band_min_m: f64,

    /// Lower edge (inclusive) of band "2"; also the exclusive upper edge of band "1"
    #[serde(default = "default_high_band_min")]
    pub high_band_min_m: f64,
}

fn default_low_band_min() -> f64 {
    200.0
}

fn default_high_band_min() -> f64 {
    2000.0
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            low_band_min_m: default_low_band_min(),
            high_band_min_m: default_high_band_min(),
        }
    }
}

/// Record quality thresholds applied before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum bird density (inclusive) for a record to be aggregated
    #[serde(default = "default_min_density")]
    pub min_density: f64,
}

fn default_min_density() -> f64 {
    10.0
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_density: default_min_density(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowvizConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub binning: BinningConfig,

    #[serde(default)]
    pub filtering: FilterConfig,
}

impl FlowvizConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: FlowvizConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Destination of the flowviz CSV: `<processed_data_dir>/<name>_flowviz.csv`.
    pub fn output_path(&self) -> PathBuf {
        self.project
            .processed_data_dir
            .join(format!("{}_flowviz.csv", self.project.name))
    }
}
