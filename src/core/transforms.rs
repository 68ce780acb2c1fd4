//! Time and altitude binning of vp records.
//!
//! Each record is keyed by the UTC hour containing its observation time and
//! by one of two altitude bands. Binning is a pure per-record transform.

use std::fmt;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::config::BinningConfig;
use super::loaders::VpRecord;

/// Coarse altitude category used by the flow visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeightBand {
    /// Between the low and high band edges (default 200 to 2000 m).
    Low,
    /// At or above the high band edge (default 2000 m).
    High,
}

impl HeightBand {
    /// Label written to the `altitude_band` output column.
    pub fn label(self) -> &'static str {
        match self {
            HeightBand::Low => "1",
            HeightBand::High => "2",
        }
    }
}

impl fmt::Display for HeightBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A measurement record with its derived bin keys.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedRecord {
    pub record: VpRecord,
    /// Start of the UTC hour containing `record.datetime`.
    pub datetime_bin: DateTime<Utc>,
    /// `None` when the height falls in neither band.
    pub height_bin: Option<HeightBand>,
}

/// Truncate a timestamp to the start of its hour.
pub fn truncate_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    // Only fails for timestamps at the edge of chrono's representable range.
    dt.duration_trunc(TimeDelta::hours(1)).unwrap_or(dt)
}

/// Classify a height into an altitude band.
///
/// Band edges are inclusive below and exclusive above. Undefined, negative
/// and sub-band heights yield `None`.
pub fn height_band(height_m: Option<f64>, config: &BinningConfig) -> Option<HeightBand> {
    let h = height_m?;
    if h >= config.high_band_min_m {
        Some(HeightBand::High)
    } else if h >= config.low_band_min_m {
        Some(HeightBand::Low)
    } else {
        None
    }
}

/// Derive the bin keys for one record.
pub fn bin_record(record: VpRecord, config: &BinningConfig) -> BinnedRecord {
    let datetime_bin = truncate_to_hour(record.datetime);
    let height_bin = height_band(record.height_m, config);
    BinnedRecord {
        record,
        datetime_bin,
        height_bin,
    }
}

/// Bin every record, preserving order.
pub fn bin_records(records: Vec<VpRecord>, config: &BinningConfig) -> Vec<BinnedRecord> {
    records
        .into_iter()
        .map(|record| bin_record(record, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(height_m: Option<f64>) -> VpRecord {
        VpRecord {
            radar_id: "bejab".to_string(),
            datetime: Utc.with_ymd_and_hms(2020, 3, 1, 6, 23, 0).unwrap(),
            height_m,
            dens: Some(12.0),
            dd: None,
            u: None,
            v: None,
            ff: None,
            exclusion_reason: None,
        }
    }

    #[test]
    fn test_height_band_boundaries() {
        let config = BinningConfig::default();

        assert_eq!(height_band(Some(200.0), &config), Some(HeightBand::Low));
        assert_eq!(height_band(Some(1999.999), &config), Some(HeightBand::Low));
        assert_eq!(height_band(Some(2000.0), &config), Some(HeightBand::High));
        assert_eq!(height_band(Some(4800.0), &config), Some(HeightBand::High));
        assert_eq!(height_band(Some(199.0), &config), None);
        assert_eq!(height_band(Some(-50.0), &config), None);
        assert_eq!(height_band(None, &config), None);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(HeightBand::Low.label(), "1");
        assert_eq!(HeightBand::High.to_string(), "2");
        assert!(HeightBand::Low < HeightBand::High);
    }

    #[test]
    fn test_truncate_to_hour() {
        let dt = Utc.with_ymd_and_hms(2020, 3, 1, 6, 23, 45).unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 3, 1, 6, 0, 0).unwrap();
        assert_eq!(truncate_to_hour(dt), expected);

        let on_the_hour = Utc.with_ymd_and_hms(2020, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(truncate_to_hour(on_the_hour), on_the_hour);
    }

    #[test]
    fn test_bin_records_preserves_order() {
        let config = BinningConfig::default();
        let binned = bin_records(
            vec![record_at(Some(2500.0)), record_at(Some(100.0)), record_at(Some(300.0))],
            &config,
        );

        let bands: Vec<Option<HeightBand>> = binned.iter().map(|b| b.height_bin).collect();
        assert_eq!(bands, vec![Some(HeightBand::High), None, Some(HeightBand::Low)]);
        assert!(binned
            .iter()
            .all(|b| b.datetime_bin == Utc.with_ymd_and_hms(2020, 3, 1, 6, 0, 0).unwrap()));
    }
}
