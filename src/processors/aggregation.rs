//! Grouped aggregation of binned vp records.
//!
//! Records are grouped by radar, hourly time bin and altitude band. Each
//! group is reduced to arithmetic means of the wind components, density and
//! wind speed, and a circular mean of the wind direction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::transforms::{BinnedRecord, HeightBand};

/// Resultant vectors shorter than this (per sample) have no defined direction.
const MIN_RESULTANT_LENGTH: f64 = 1e-9;

/// Composite grouping key. Ordering is radar, then time, then band.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub radar_id: String,
    pub datetime_bin: DateTime<Utc>,
    pub height_bin: HeightBand,
}

impl GroupKey {
    /// Key for a binned record, or `None` if it belongs to no group.
    pub fn of(binned: &BinnedRecord) -> Option<Self> {
        if binned.record.radar_id.is_empty() {
            return None;
        }
        Some(Self {
            radar_id: binned.record.radar_id.clone(),
            datetime_bin: binned.datetime_bin,
            height_bin: binned.height_bin?,
        })
    }
}

/// Statistics for one radar, hour and altitude band.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub radar_id: String,
    pub datetime_bin: DateTime<Utc>,
    pub height_bin: HeightBand,
    pub avg_u: Option<f64>,
    pub avg_v: Option<f64>,
    pub avg_dens: Option<f64>,
    /// Circular mean of the wind direction, degrees in `[0, 360)`.
    pub avg_dd: Option<f64>,
    pub avg_ff: Option<f64>,
}

impl AggregateRecord {
    /// Returns true if at least one statistic is defined.
    pub fn has_any_statistic(&self) -> bool {
        [self.avg_u, self.avg_v, self.avg_dens, self.avg_dd, self.avg_ff]
            .iter()
            .any(Option::is_some)
    }
}

/// Running arithmetic mean over defined values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    #[inline]
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// Mean of the defined values, `None` if there were none.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Running vector sum of unit directions, for a circular mean in degrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularAccumulator {
    sum_sin: f64,
    sum_cos: f64,
    count: usize,
}

impl CircularAccumulator {
    #[inline]
    pub fn push(&mut self, degrees: Option<f64>) {
        if let Some(deg) = degrees {
            let rad = deg.to_radians();
            self.sum_sin += rad.sin();
            self.sum_cos += rad.cos();
            self.count += 1;
        }
    }

    /// Direction of the mean resultant vector in `[0, 360)` degrees.
    ///
    /// Returns `None` when no direction was pushed, or when the directions
    /// cancel out (e.g. `[0, 90, 180, 270]`) so the resultant has no angle.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }

        let resultant = self.sum_sin.hypot(self.sum_cos);
        if resultant <= MIN_RESULTANT_LENGTH * self.count as f64 {
            return None;
        }

        let mut mean = self.sum_sin.atan2(self.sum_cos).to_degrees();
        if mean < 0.0 {
            mean += 360.0;
        }
        // -tiny + 360.0 rounds up to exactly 360.0
        if mean >= 360.0 {
            mean -= 360.0;
        }
        Some(mean)
    }
}

/// Circular mean of directions in degrees, ignoring undefined entries.
pub fn circular_mean(directions: &[Option<f64>]) -> Option<f64> {
    let mut acc = CircularAccumulator::default();
    for &dd in directions {
        acc.push(dd);
    }
    acc.mean()
}

/// Accumulators for every statistic of one group.
#[derive(Debug, Clone, Copy, Default)]
struct GroupAccumulator {
    u: MeanAccumulator,
    v: MeanAccumulator,
    dens: MeanAccumulator,
    dd: CircularAccumulator,
    ff: MeanAccumulator,
}

impl GroupAccumulator {
    fn push(&mut self, binned: &BinnedRecord) {
        let record = &binned.record;
        self.u.push(record.u);
        self.v.push(record.v);
        self.dens.push(record.dens);
        self.dd.push(record.dd);
        self.ff.push(record.ff);
    }

    fn finish(&self, key: GroupKey) -> AggregateRecord {
        AggregateRecord {
            radar_id: key.radar_id,
            datetime_bin: key.datetime_bin,
            height_bin: key.height_bin,
            avg_u: self.u.mean(),
            avg_v: self.v.mean(),
            avg_dens: self.dens.mean(),
            avg_dd: self.dd.mean(),
            avg_ff: self.ff.mean(),
        }
    }
}

/// Group records by (radar, time bin, altitude band) and reduce each group.
///
/// Records without an altitude band or radar id are skipped. The output is
/// sorted by group key, so identical input always yields identical output.
pub fn aggregate(records: &[BinnedRecord]) -> Vec<AggregateRecord> {
    let mut groups: BTreeMap<GroupKey, GroupAccumulator> = BTreeMap::new();

    for binned in records {
        if let Some(key) = GroupKey::of(binned) {
            groups.entry(key).or_default().push(binned);
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect()
}
