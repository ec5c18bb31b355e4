//! Zone variance: observed per-zone vectors against a fixed target vector.
//!
//! Each reading carries one value per physical zone. Values are compared
//! index by index with the zone targets; the deviations are aggregated per
//! zone, per group (production line) with a per-zone breakdown, and overall.

#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deviation::classifier::{Severity, SeverityCutoffs};
use crate::records::record::Timestamp;
use crate::stats::kit::{self, percentage, round_to};

/// One observed zone vector. Missing or `null` zone values are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<Timestamp>,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub values: Vec<Option<f64>>,
}

/// Aggregate deviation statistics for a set of (actual, target) pairs.
///
/// Averages, spread and extrema are rounded to 2 decimals; rates and tier
/// percentages to 1 decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationStats {
    pub count: usize,
    pub avg_actual: f64,
    pub avg_deviation: f64,
    pub std_deviation: f64,
    pub min_actual: f64,
    pub max_actual: f64,
    pub range: f64,
    pub minor_count: usize,
    pub major_count: usize,
    pub critical_count: usize,
    /// Share of readings classified major or critical.
    pub out_of_tolerance_rate: f64,
    pub critical_rate: f64,
    pub minor_pct: f64,
    pub major_pct: f64,
    pub critical_pct: f64,
    /// Tier of the average deviation itself.
    pub severity_class: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStats {
    /// 1-based zone number.
    pub zone: usize,
    pub target: f64,
    #[serde(flatten)]
    pub stats: DeviationStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    #[serde(flatten)]
    pub stats: DeviationStats,
    pub zones: Vec<ZoneStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceReport {
    pub cutoffs: SeverityCutoffs,
    pub readings: usize,
    pub zones: Vec<ZoneStats>,
    pub groups: Vec<GroupStats>,
    /// `None` when no zone value was observed at all.
    pub overall: Option<DeviationStats>,
}

#[derive(Debug, Default, Clone)]
struct Accumulator {
    actuals: Vec<f64>,
    deviations: Vec<f64>,
}

impl Accumulator {
    fn push(&mut self, actual: f64, target: f64) {
        self.actuals.push(actual);
        self.deviations.push(actual - target);
    }

    fn finish(&self, cutoffs: SeverityCutoffs) -> Option<DeviationStats> {
        let count = self.actuals.len();
        if count == 0 {
            return None;
        }
        let mut tiers = [0_usize; 3];
        for deviation in &self.deviations {
            tiers[cutoffs.tier(*deviation) as usize] += 1;
        }
        let [minor_count, major_count, critical_count] = tiers;
        let share = |n: usize| round_to(percentage(n as f64, count as f64), 1);

        let avg_deviation = round_to(kit::mean(&self.deviations), 2);
        let min_actual = kit::min(&self.actuals);
        let max_actual = kit::max(&self.actuals);
        Some(DeviationStats {
            count,
            avg_actual: round_to(kit::mean(&self.actuals), 2),
            avg_deviation,
            std_deviation: round_to(kit::std_dev(&self.deviations), 2),
            min_actual: round_to(min_actual, 2),
            max_actual: round_to(max_actual, 2),
            range: round_to(max_actual - min_actual, 2),
            minor_count,
            major_count,
            critical_count,
            out_of_tolerance_rate: share(major_count + critical_count),
            critical_rate: share(critical_count),
            minor_pct: share(minor_count),
            major_pct: share(major_count),
            critical_pct: share(critical_count),
            severity_class: cutoffs.tier(avg_deviation),
        })
    }
}

fn zone_stats(accs: &[Accumulator], targets: &[f64], cutoffs: SeverityCutoffs) -> Vec<ZoneStats> {
    accs.iter()
        .zip(targets)
        .enumerate()
        .filter_map(|(idx, (acc, target))| {
            acc.finish(cutoffs).map(|stats| ZoneStats {
                zone: idx + 1,
                target: *target,
                stats,
            })
        })
        .collect()
}

/// Build the variance report. Values beyond the target vector's length are
/// ignored; zones and groups without any observed value are omitted.
pub fn zone_variance(
    readings: &[ZoneReading],
    targets: &[f64],
    cutoffs: SeverityCutoffs,
) -> VarianceReport {
    let mut per_zone = vec![Accumulator::default(); targets.len()];
    let mut per_group: BTreeMap<&str, (Accumulator, Vec<Accumulator>)> = BTreeMap::new();
    let mut overall = Accumulator::default();

    for reading in readings {
        let (group_acc, group_zones) = per_group
            .entry(reading.group.as_str())
            .or_insert_with(|| (Accumulator::default(), vec![Accumulator::default(); targets.len()]));

        for (idx, (value, target)) in reading.values.iter().zip(targets).enumerate() {
            let Some(actual) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            per_zone[idx].push(actual, *target);
            group_zones[idx].push(actual, *target);
            group_acc.push(actual, *target);
            overall.push(actual, *target);
        }
    }

    let groups = per_group
        .iter()
        .filter_map(|(group, (acc, zones))| {
            acc.finish(cutoffs).map(|stats| GroupStats {
                group: (*group).to_string(),
                stats,
                zones: zone_stats(zones, targets, cutoffs),
            })
        })
        .collect();

    VarianceReport {
        cutoffs,
        readings: readings.len(),
        zones: zone_stats(&per_zone, targets, cutoffs),
        groups,
        overall: overall.finish(cutoffs),
    }
}
