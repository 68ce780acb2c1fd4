//! Data loaders for vertical-profile (vp) radar CSV files.
//!
//! This module provides:
//! - Discovery of vp files in a data directory (non-recursive)
//! - A header-driven CSV parser producing [`VpRecord`]s
//! - Concatenation of many per-radar files into one record set

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use thiserror::Error;

use crate::config::InputConfig;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Data directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Missing required column '{column}' in '{path}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Invalid {column} value '{value}' in '{path}' at line {line}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Tokens treated as an undefined numeric value.
const MISSING_TOKENS: [&str; 4] = ["", "NA", "NaN", "nan"];

/// One vp measurement: a radar, an observation time and a height level.
#[derive(Debug, Clone, PartialEq)]
pub struct VpRecord {
    pub radar_id: String,
    pub datetime: DateTime<Utc>,
    /// Height of the level in meters (`HGHT`).
    pub height_m: Option<f64>,
    /// Bird density (`dens`).
    pub dens: Option<f64>,
    /// Wind direction in degrees (`dd`).
    pub dd: Option<f64>,
    pub u: Option<f64>,
    pub v: Option<f64>,
    /// Wind speed (`ff`).
    pub ff: Option<f64>,
    /// Empty or absent means the record is not excluded.
    pub exclusion_reason: Option<String>,
}

impl VpRecord {
    /// Returns true if the record carries a non-empty exclusion reason.
    #[inline]
    pub fn is_excluded(&self) -> bool {
        self.exclusion_reason
            .as_deref()
            .is_some_and(|reason| !reason.is_empty())
    }
}

/// Column positions resolved from a file header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    radar_id: usize,
    datetime: usize,
    height: Option<usize>,
    dens: Option<usize>,
    dd: Option<usize>,
    u: Option<usize>,
    v: Option<usize>,
    ff: Option<usize>,
    exclusion_reason: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self> {
        let col_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        let required = |column: &'static str| {
            col_map
                .get(column)
                .copied()
                .ok_or_else(|| LoaderError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };

        Ok(Self {
            radar_id: required("radar_id")?,
            datetime: required("datetime")?,
            height: col_map.get("hght").copied(),
            dens: col_map.get("dens").copied(),
            dd: col_map.get("dd").copied(),
            u: col_map.get("u").copied(),
            v: col_map.get("v").copied(),
            ff: col_map.get("ff").copied(),
            exclusion_reason: col_map.get("exclusion_reason").copied(),
        })
    }
}

/// Parse a vp timestamp into UTC.
///
/// Accepts RFC 3339 (`2020-03-01T06:23:00Z`), `2020-03-01 06:23:00` with an
/// optional `+00` / `+00:00` offset, and `2020-03-01T06:23:00`. Timestamps
/// without an offset are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i)).map(str::trim)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_numeric(
    record: &StringRecord,
    idx: Option<usize>,
    column: &'static str,
    path: &Path,
) -> Result<Option<f64>> {
    let Some(raw) = field(record, idx) else {
        return Ok(None);
    };
    if MISSING_TOKENS.contains(&raw) {
        return Ok(None);
    }

    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| LoaderError::InvalidValue {
            path: path.to_path_buf(),
            line: line_of(record),
            column,
            value: raw.to_string(),
        })
}

fn parse_record(record: &StringRecord, cols: &ColumnMap, path: &Path) -> Result<VpRecord> {
    let radar_id = field(record, Some(cols.radar_id)).unwrap_or_default().to_string();

    let raw_datetime = field(record, Some(cols.datetime)).unwrap_or_default();
    let datetime = parse_timestamp(raw_datetime).ok_or_else(|| LoaderError::InvalidValue {
        path: path.to_path_buf(),
        line: line_of(record),
        column: "datetime",
        value: raw_datetime.to_string(),
    })?;

    Ok(VpRecord {
        radar_id,
        datetime,
        height_m: parse_numeric(record, cols.height, "HGHT", path)?,
        dens: parse_numeric(record, cols.dens, "dens", path)?,
        dd: parse_numeric(record, cols.dd, "dd", path)?,
        u: parse_numeric(record, cols.u, "u", path)?,
        v: parse_numeric(record, cols.v, "v", path)?,
        ff: parse_numeric(record, cols.ff, "ff", path)?,
        exclusion_reason: field(record, cols.exclusion_reason).map(str::to_string),
    })
}

/// Returns true if `name` matches the configured vp file rule.
pub fn is_vp_file_name(name: &str, input: &InputConfig) -> bool {
    name.contains(&input.file_marker) && name.ends_with(&input.file_extension)
}

/// Find vp files directly inside `directory`.
///
/// A file matches when its name contains `input.file_marker` and ends with
/// `input.file_extension`. Subdirectories are not searched. The result is
/// sorted so repeated runs read files in the same order.
///
/// # Errors
///
/// Returns [`LoaderError::DirectoryNotFound`] if `directory` does not exist.
pub fn find_vp_files(directory: &Path, input: &InputConfig) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(LoaderError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut vp_files: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| is_vp_file_name(name, input))
                .unwrap_or(false)
        })
        .collect();

    vp_files.sort();
    Ok(vp_files)
}

/// Load all measurement records from one vp CSV file.
///
/// Columns are located by header name (case-insensitive). `radar_id` and
/// `datetime` are required; any other column that is absent yields undefined
/// values for every row of this file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has ragged rows, lacks a
/// required column, or holds an unparseable number or timestamp.
pub fn load_vp_csv<P: AsRef<Path>>(path: P) -> Result<Vec<VpRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let csv_err = |source| LoaderError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let cols = ColumnMap::from_headers(&headers, path)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(parse_record(&record, &cols, path)?);
    }

    debug!("Parsed {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load and concatenate every file in `paths`, in order.
///
/// Any file failing to load aborts the whole load.
pub fn load_vp_files(paths: &[PathBuf]) -> Result<Vec<VpRecord>> {
    let mut all_records = Vec::new();

    for path in paths {
        let records = load_vp_csv(path)?;
        info!("Loaded {} records from {}", records.len(), path.display());
        all_records.extend(records);
    }

    Ok(all_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "radar_id,datetime,HGHT,dens,dd,u,v,ff,exclusion_reason";

    fn create_test_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 3, 1, 6, 23, 0).unwrap();

        assert_eq!(parse_timestamp("2020-03-01T06:23:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-01 06:23:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-01T06:23:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-01 06:23:00+00"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-01T07:23:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_load_vp_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_csv(
            temp_dir.path(),
            "bejab_vpts_202003.csv",
            &[
                HEADER,
                "bejab,2020-03-01T06:23:00Z,200,12.5,350,1.5,-2.0,2.5,",
                "bejab,2020-03-01T06:23:00Z,400,NA,,,,,rain",
            ],
        );

        let records = load_vp_csv(&path).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.radar_id, "bejab");
        assert_eq!(first.height_m, Some(200.0));
        assert_eq!(first.dens, Some(12.5));
        assert_eq!(first.dd, Some(350.0));
        assert_eq!(first.u, Some(1.5));
        assert_eq!(first.v, Some(-2.0));
        assert_eq!(first.ff, Some(2.5));
        assert!(!first.is_excluded());

        let second = &records[1];
        assert_eq!(second.dens, None);
        assert_eq!(second.dd, None);
        assert!(second.is_excluded());
    }

    #[test]
    fn test_missing_optional_columns_are_undefined() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_csv(
            temp_dir.path(),
            "nldhl_vpts.csv",
            &["datetime,radar_id,HGHT,dens", "2020-03-01 06:00:00,nldhl,600,20"],
        );

        let records = load_vp_csv(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].radar_id, "nldhl");
        assert_eq!(records[0].dens, Some(20.0));
        assert_eq!(records[0].u, None);
        assert_eq!(records[0].exclusion_reason, None);
        assert!(!records[0].is_excluded());
    }

    #[test]
    fn test_missing_required_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_csv(
            temp_dir.path(),
            "bad_vpts.csv",
            &["radar_id,HGHT,dens", "bejab,200,12"],
        );

        match load_vp_csv(&path) {
            Err(LoaderError::MissingColumn { column, .. }) => assert_eq!(column, "datetime"),
            other => panic!("Expected MissingColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_csv(
            temp_dir.path(),
            "bad_vpts.csv",
            &[HEADER, "bejab,2020-03-01T06:23:00Z,200,lots,,,,,"],
        );

        match load_vp_csv(&path) {
            Err(LoaderError::InvalidValue { column, value, line, .. }) => {
                assert_eq!(column, "dens");
                assert_eq!(value, "lots");
                assert_eq!(line, 2);
            }
            other => panic!("Expected InvalidValue error, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_csv(
            temp_dir.path(),
            "bad_vpts.csv",
            &[HEADER, "bejab,2020-03-01T06:23:00Z,200"],
        );

        assert!(matches!(load_vp_csv(&path), Err(LoaderError::Csv { .. })));
    }

    #[test]
    fn test_find_vp_files() {
        let temp_dir = TempDir::new().unwrap();
        let input = InputConfig::default();

        create_test_csv(temp_dir.path(), "nldhl_vpts_2020.csv", &[HEADER]);
        create_test_csv(temp_dir.path(), "bejab_vpts_2020.csv", &[HEADER]);
        create_test_csv(temp_dir.path(), "bejab_vpts_2020.csv.bak", &[HEADER]);
        create_test_csv(temp_dir.path(), "stations.csv", &[HEADER]);
        fs::create_dir_all(temp_dir.path().join("nested")).unwrap();
        create_test_csv(&temp_dir.path().join("nested"), "deep_vpts.csv", &[HEADER]);

        let files = find_vp_files(temp_dir.path(), &input).unwrap();
        let names: Vec<&str> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();

        assert_eq!(names, vec!["bejab_vpts_2020.csv", "nldhl_vpts_2020.csv"]);
    }

    #[test]
    fn test_find_vp_files_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        assert!(matches!(
            find_vp_files(&missing, &InputConfig::default()),
            Err(LoaderError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_load_vp_files_concatenates_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_test_csv(
            temp_dir.path(),
            "a_vpts.csv",
            &[HEADER, "bejab,2020-03-01T06:00:00Z,200,11,,,,,"],
        );
        let b = create_test_csv(
            temp_dir.path(),
            "b_vpts.csv",
            &["radar_id,datetime,dens", "nldhl,2020-03-01T07:00:00Z,12"],
        );

        let records = load_vp_files(&[a, b]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].radar_id, "bejab");
        assert_eq!(records[1].radar_id, "nldhl");
        assert_eq!(records[1].height_m, None);
    }
}
