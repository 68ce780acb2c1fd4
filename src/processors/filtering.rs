//! Record filtering before and after aggregation.

use crate::config::FilterConfig;
use crate::core::transforms::BinnedRecord;

use super::aggregation::AggregateRecord;

/// Decide whether a binned record takes part in aggregation.
///
/// A record is kept when its density is defined and at least
/// `config.min_density`, and it carries no exclusion reason.
pub fn passes_quality(binned: &BinnedRecord, config: &FilterConfig) -> bool {
    let dense_enough = binned
        .record
        .dens
        .is_some_and(|dens| dens >= config.min_density);

    dense_enough && !binned.record.is_excluded()
}

/// Keep only records passing [`passes_quality`], preserving order.
pub fn filter_for_aggregation(records: Vec<BinnedRecord>, config: &FilterConfig) -> Vec<BinnedRecord> {
    records
        .into_iter()
        .filter(|binned| passes_quality(binned, config))
        .collect()
}

/// Drop aggregate rows whose statistics are all undefined.
pub fn drop_empty_aggregates(aggregates: Vec<AggregateRecord>) -> Vec<AggregateRecord> {
    aggregates
        .into_iter()
        .filter(AggregateRecord::has_any_statistic)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::VpRecord;
    use crate::core::transforms::HeightBand;
    use chrono::{TimeZone, Utc};

    fn binned(dens: Option<f64>, exclusion_reason: Option<&str>) -> BinnedRecord {
        let datetime = Utc.with_ymd_and_hms(2020, 3, 1, 6, 0, 0).unwrap();
        BinnedRecord {
            record: VpRecord {
                radar_id: "bejab".to_string(),
                datetime,
                height_m: Some(400.0),
                dens,
                dd: None,
                u: None,
                v: None,
                ff: None,
                exclusion_reason: exclusion_reason.map(str::to_string),
            },
            datetime_bin: datetime,
            height_bin: Some(HeightBand::Low),
        }
    }

    fn aggregate(avg_dens: Option<f64>) -> AggregateRecord {
        AggregateRecord {
            radar_id: "bejab".to_string(),
            datetime_bin: Utc.with_ymd_and_hms(2020, 3, 1, 6, 0, 0).unwrap(),
            height_bin: HeightBand::Low,
            avg_u: None,
            avg_v: None,
            avg_dens,
            avg_dd: None,
            avg_ff: None,
        }
    }

    #[test]
    fn test_density_threshold() {
        let config = FilterConfig::default();

        assert!(!passes_quality(&binned(Some(9.999), None), &config));
        assert!(passes_quality(&binned(Some(10.0), None), &config));
        assert!(passes_quality(&binned(Some(250.0), Some("")), &config));
        assert!(!passes_quality(&binned(None, None), &config));
    }

    #[test]
    fn test_exclusion_reason_drops_regardless_of_density() {
        let config = FilterConfig::default();

        assert!(!passes_quality(&binned(Some(1000.0), Some("rain")), &config));
    }

    #[test]
    fn test_filter_preserves_order() {
        let config = FilterConfig::default();
        let kept = filter_for_aggregation(
            vec![
                binned(Some(30.0), None),
                binned(Some(5.0), None),
                binned(Some(20.0), None),
                binned(Some(40.0), Some("clutter")),
            ],
            &config,
        );

        let densities: Vec<Option<f64>> = kept.iter().map(|b| b.record.dens).collect();
        assert_eq!(densities, vec![Some(30.0), Some(20.0)]);
    }

    #[test]
    fn test_drop_empty_aggregates() {
        let kept = drop_empty_aggregates(vec![aggregate(None), aggregate(Some(12.0))]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].avg_dens, Some(12.0));
    }
}
