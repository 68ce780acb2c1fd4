//! End-to-end flowviz pipeline: load, bin, filter, aggregate, export.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::FlowvizConfig;
use crate::core::loaders::{self, VpRecord};
use crate::core::transforms;
use crate::core::writers;

use super::aggregation::{self, AggregateRecord};
use super::filtering;

/// Comparison between the configured radar network and the loaded data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadarCoverage {
    /// Radar ids present in the data, sorted.
    pub observed: Vec<String>,
    /// Configured radars that produced no records.
    pub missing: Vec<String>,
    /// Radars in the data that are not configured.
    pub unexpected: Vec<String>,
}

impl RadarCoverage {
    /// Compare loaded records against the configured radar list.
    ///
    /// An empty configured list means no expectation: nothing is reported
    /// as missing or unexpected.
    pub fn from_records(records: &[VpRecord], configured: &[String]) -> Self {
        let observed: BTreeSet<&str> = records
            .iter()
            .map(|r| r.radar_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();

        if configured.is_empty() {
            return Self {
                observed: observed.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            };
        }

        let expected: BTreeSet<&str> = configured.iter().map(String::as_str).collect();

        Self {
            observed: observed.iter().map(|s| s.to_string()).collect(),
            missing: expected.difference(&observed).map(|s| s.to_string()).collect(),
            unexpected: observed.difference(&expected).map(|s| s.to_string()).collect(),
        }
    }

    fn log(&self, countries: &[String]) {
        if !countries.is_empty() {
            info!("Radar network countries: {}", countries.join(", "));
        }
        info!("Radars with data: {}", self.observed.len());
        if !self.missing.is_empty() {
            warn!("Configured radars without data: {}", self.missing.join(", "));
        }
        if !self.unexpected.is_empty() {
            warn!("Radars in data but not configured: {}", self.unexpected.join(", "));
        }
    }
}

/// Counts and locations from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub files_loaded: usize,
    pub records_loaded: usize,
    /// Records passing the density and exclusion filter.
    pub records_kept: usize,
    pub groups: usize,
    /// Rows written after dropping all-undefined groups.
    pub rows_written: usize,
    pub output_path: PathBuf,
    pub coverage: RadarCoverage,
}

/// Run binning, filtering and aggregation on an in-memory record set.
///
/// Returns the aggregate rows that will be exported plus the number of
/// records that survived the quality filter and the number of groups formed.
pub fn process_records(
    records: Vec<VpRecord>,
    config: &FlowvizConfig,
) -> (Vec<AggregateRecord>, usize, usize) {
    let binned = transforms::bin_records(records, &config.binning);
    let unbanded = binned.iter().filter(|b| b.height_bin.is_none()).count();
    debug!("{} records fall outside both altitude bands", unbanded);

    let kept = filtering::filter_for_aggregation(binned, &config.filtering);
    let kept_count = kept.len();
    info!(
        "{} records pass density >= {} and exclusion filter",
        kept_count, config.filtering.min_density
    );

    let aggregates = aggregation::aggregate(&kept);
    let group_count = aggregates.len();

    let aggregates = filtering::drop_empty_aggregates(aggregates);
    if aggregates.len() < group_count {
        debug!(
            "Dropped {} groups with no defined statistics",
            group_count - aggregates.len()
        );
    }

    (aggregates, kept_count, group_count)
}

/// Run the full pipeline described by `config`.
///
/// Reads every vp file in `config.project.vp_data_dir`, aggregates the
/// records and writes `config.output_path()`. No matching files is not an
/// error: a header-only CSV is written.
///
/// # Errors
///
/// Fails if the data directory is missing, any vp file cannot be parsed, or
/// the output cannot be written.
pub fn run_pipeline(config: &FlowvizConfig) -> Result<PipelineSummary> {
    let data_dir = &config.project.vp_data_dir;

    let files = loaders::find_vp_files(data_dir, &config.input)
        .with_context(|| format!("Failed to list vp files in {}", data_dir.display()))?;
    if files.is_empty() {
        warn!(
            "No files matching '*{}*{}' in {}",
            config.input.file_marker,
            config.input.file_extension,
            data_dir.display()
        );
    } else {
        info!("Found {} vp files in {}", files.len(), data_dir.display());
    }

    let records = loaders::load_vp_files(&files).context("Failed to load vp data")?;
    let records_loaded = records.len();

    let coverage = RadarCoverage::from_records(&records, &config.project.radars);
    coverage.log(&config.project.countries);

    let (aggregates, records_kept, groups) = process_records(records, config);

    let output_path = config.output_path();
    let rows_written = writers::write_flowviz_csv(&output_path, &aggregates)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!("Wrote {} rows to {}", rows_written, output_path.display());

    Ok(PipelineSummary {
        files_loaded: files.len(),
        records_loaded,
        records_kept,
        groups,
        rows_written,
        output_path,
        coverage,
    })
}
