//! Data writers for the flowviz CSV format.
//!
//! The flowviz file holds one row per radar, hour and altitude band:
//!
//! ```text
//! radar_id,interval_start_time,altitude_band,avg_u_speed,avg_v_speed,avg_dens
//! bejab,2020-03-01 06:00:00+00,1,1.5,-2.0,15.0
//! ```
//!
//! Undefined statistics are written as empty fields.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::processors::aggregation::AggregateRecord;

/// Column order of the flowviz CSV.
pub const FLOWVIZ_HEADER: [&str; 6] = [
    "radar_id",
    "interval_start_time",
    "altitude_band",
    "avg_u_speed",
    "avg_v_speed",
    "avg_dens",
];

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
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

/// One output row, in flowviz column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowvizRow {
    pub radar_id: String,
    pub interval_start_time: String,
    pub altitude_band: &'static str,
    pub avg_u_speed: Option<f64>,
    pub avg_v_speed: Option<f64>,
    pub avg_dens: Option<f64>,
}

impl From<&AggregateRecord> for FlowvizRow {
    fn from(agg: &AggregateRecord) -> Self {
        Self {
            radar_id: agg.radar_id.clone(),
            interval_start_time: format_interval_start(agg.datetime_bin),
            altitude_band: agg.height_bin.label(),
            avg_u_speed: agg.avg_u,
            avg_v_speed: agg.avg_v,
            avg_dens: agg.avg_dens,
        }
    }
}

/// Render a time bin as `YYYY-MM-DD HH:MM:SS+00`.
///
/// The `+00` suffix is a fixed marker; bins are always UTC.
pub fn format_interval_start(dt: DateTime<Utc>) -> String {
    format!("{}+00", dt.format("%Y-%m-%d %H:%M:%S"))
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write aggregate records to a flowviz CSV.
///
/// The header is always written, so an empty record set yields a
/// header-only file. Rows are written in the order given.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `aggregates` - Aggregate records, normally sorted by group key
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use vp_flowviz::core::writers::write_flowviz_csv;
/// use std::path::Path;
///
/// write_flowviz_csv(Path::new("data/processed/demo_flowviz.csv"), &[]).unwrap();
/// ```
pub fn write_flowviz_csv(path: &Path, aggregates: &[AggregateRecord]) -> Result<usize> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let buf_writer = BufWriter::new(file);
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(buf_writer);

    let path_str = path.display().to_string();

    // Write header
    csv_writer
        .write_record(FLOWVIZ_HEADER)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    // Write data rows
    for agg in aggregates {
        csv_writer
            .serialize(FlowvizRow::from(agg))
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(aggregates.len())
}
