//! L/R press cycle pairing.
//!
//! A press stroke produces one record per side (typically `L` and `R`) a few
//! seconds apart. Records are grouped into cycles by source-key prefix and a
//! fixed-width time bucket floored from the Unix epoch, then assigned to side
//! slots by their side discriminator.
//!
//! Two views are derived from the pairing and kept separate:
//! - per-cycle status: the peak of each waveform channel banded against the
//!   tolerance range. Malformed payloads are zero-filled here.
//! - compliance tally: every individual reading of every *complete* cycle
//!   counted as standard or not. Cycles with a malformed side are skipped.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, Timelike};
use serde::Serialize;

use crate::deviation::classifier::{BandStatus, StandardBand, classify_band};
use crate::records::record::{Timestamp, TimestampedRecord};
use crate::records::waveform::Channel;
use crate::stats::kit::{self, percentage, round_to};

/// Identity of a cycle: key prefix plus the start of its time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CycleKey {
    pub prefix: String,
    pub bucket_start: Timestamp,
}

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.prefix, self.bucket_start.to_rfc3339())
    }
}

/// Records sharing one bucket, by side.
#[derive(Debug, Clone)]
pub struct Cycle<'a> {
    pub key: CycleKey,
    pub sides: BTreeMap<&'a str, Vec<&'a TimestampedRecord>>,
    /// Every required side holds exactly one record and that record's
    /// payload is a valid waveform.
    pub complete: bool,
}

impl<'a> Cycle<'a> {
    /// The single record in `side`, or `None` when missing or duplicated.
    pub fn side(&self, side: &str) -> Option<&'a TimestampedRecord> {
        match self.sides.get(side).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    fn all_present(&self, required: &[&str]) -> bool {
        required.iter().all(|side| self.side(side).is_some())
    }
}

/// Start of the `bucket_secs`-wide bucket containing `ts`, in `ts`'s offset.
pub fn floor_to_bucket(ts: Timestamp, bucket_secs: i64) -> Timestamp {
    debug_assert!(bucket_secs > 0, "bucket width must be positive");
    let bucket = bucket_secs.max(1);
    let excess = ts.timestamp().rem_euclid(bucket);
    let whole = ts.with_nanosecond(0).unwrap_or(ts);
    whole - Duration::seconds(excess)
}

/// Group records into cycles keyed by prefix and bucket.
///
/// Records without a side discriminator cannot be paired and are ignored.
pub fn pair_cycles<'a>(
    records: impl IntoIterator<Item = &'a TimestampedRecord>,
    bucket_secs: i64,
    required_sides: &[&str],
) -> BTreeMap<CycleKey, Cycle<'a>> {
    let mut cycles: BTreeMap<CycleKey, Cycle<'a>> = BTreeMap::new();
    for record in records {
        let Some(side) = record.source_key.side() else {
            continue;
        };
        let key = CycleKey {
            prefix: record.source_key.prefix().to_string(),
            bucket_start: floor_to_bucket(record.timestamp, bucket_secs),
        };
        cycles
            .entry(key.clone())
            .or_insert_with(|| Cycle {
                key,
                sides: BTreeMap::new(),
                complete: false,
            })
            .sides
            .entry(side)
            .or_default()
            .push(record);
    }

    for cycle in cycles.values_mut() {
        let complete = required_sides.iter().all(|side| {
            cycle
                .side(side)
                .is_some_and(|record| record.payload.waveform().is_valid())
        });
        cycle.complete = complete;
    }
    cycles
}

/// Peak values and band status of one side of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideSummary {
    pub side: String,
    pub toe_heel_peak: f64,
    pub side_peak: f64,
    pub toe_heel_status: BandStatus,
    pub side_status: BandStatus,
    /// The payload was malformed and the peaks come from zero-filled channels.
    pub zero_filled: bool,
}

impl SideSummary {
    pub fn status(&self) -> BandStatus {
        self.toe_heel_status.max(self.side_status)
    }
}

/// Snapshot status of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatus {
    pub key: CycleKey,
    pub complete: bool,
    pub sides: Vec<SideSummary>,
    /// Worst side status.
    pub overall: BandStatus,
}

/// Band one record's waveform peaks. Malformed payloads read as `[[0], [0]]`.
pub fn summarize_side(side: &str, record: &TimestampedRecord, band: StandardBand) -> SideSummary {
    let waveform = record.payload.waveform();
    let toe_heel_peak = kit::max(waveform.display_channel(Channel::ToeHeel));
    let side_peak = kit::max(waveform.display_channel(Channel::Side));
    SideSummary {
        side: side.to_string(),
        toe_heel_peak,
        side_peak,
        toe_heel_status: classify_band(toe_heel_peak, band),
        side_status: classify_band(side_peak, band),
        zero_filled: !waveform.is_valid(),
    }
}

/// Status of a cycle in which every required side has exactly one record.
/// Returns `None` otherwise.
pub fn cycle_status(cycle: &Cycle<'_>, required_sides: &[&str], band: StandardBand) -> Option<CycleStatus> {
    if !cycle.all_present(required_sides) {
        return None;
    }
    let sides: Vec<SideSummary> = required_sides
        .iter()
        .filter_map(|side| cycle.side(side).map(|record| summarize_side(side, record, band)))
        .collect();
    let overall = sides
        .iter()
        .map(SideSummary::status)
        .max()
        .unwrap_or(BandStatus::Normal);
    Some(CycleStatus {
        key: cycle.key.clone(),
        complete: cycle.complete,
        sides,
        overall,
    })
}

/// Reading-level compliance counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceTally {
    pub standard: usize,
    pub not_standard: usize,
}

impl ComplianceTally {
    pub const fn total(&self) -> usize {
        self.standard + self.not_standard
    }

    /// Standard share in percent (2 decimals), 0 when nothing was counted.
    #[allow(clippy::cast_precision_loss)]
    pub fn standard_pct(&self) -> f64 {
        round_to(percentage(self.standard as f64, self.total() as f64), 2)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn not_standard_pct(&self) -> f64 {
        round_to(percentage(self.not_standard as f64, self.total() as f64), 2)
    }

    fn count(&mut self, value: f64, band: StandardBand) {
        if band.contains(value) {
            self.standard += 1;
        } else {
            self.not_standard += 1;
        }
    }
}

/// Count every reading of every complete cycle against `band` (inclusive).
pub fn compliance_tally<'a, 'r: 'a>(
    cycles: impl IntoIterator<Item = &'a Cycle<'r>>,
    band: StandardBand,
) -> ComplianceTally {
    let mut tally = ComplianceTally::default();
    for cycle in cycles.into_iter().filter(|cycle| cycle.complete) {
        for record in cycle.sides.values().flatten() {
            for value in record.payload.waveform().readings() {
                tally.count(value, band);
            }
        }
    }
    tally
}

/// Cycle counts for a pairing result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairingSummary {
    pub cycles: usize,
    pub complete: usize,
    pub incomplete: usize,
}

pub fn pairing_summary(cycles: &BTreeMap<CycleKey, Cycle<'_>>) -> PairingSummary {
    let complete = cycles.values().filter(|cycle| cycle.complete).count();
    PairingSummary {
        cycles: cycles.len(),
        complete,
        incomplete: cycles.len() - complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::waveform::{Payload, Waveform};
    use chrono::DateTime;

    const SIDES: [&str; 2] = ["L", "R"];
    const BAND: StandardBand = StandardBand::new(30.0, 45.0);

    fn ts(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn wave(key: &str, at: &str, toe_heel: &[f64], side: &[f64]) -> TimestampedRecord {
        TimestampedRecord::new(
            ts(at),
            key,
            Payload::Waveform(Waveform::pair(toe_heel.to_vec(), side.to_vec())),
        )
    }

    fn malformed(key: &str, at: &str) -> TimestampedRecord {
        TimestampedRecord::new(ts(at), key, Payload::Waveform(Waveform::Malformed))
    }

    #[test]
    fn floor_uses_epoch_buckets_and_keeps_offset() {
        let floored = floor_to_bucket(ts("2025-03-01T10:00:03+07:00"), 5);
        assert_eq!(floored, ts("2025-03-01T10:00:00+07:00"));
        assert_eq!(floored.offset().local_minus_utc(), 7 * 3600);
        assert_eq!(
            floor_to_bucket(ts("2025-03-01T10:00:07.900+07:00"), 5),
            ts("2025-03-01T10:00:05+07:00")
        );
    }

    #[test]
    fn same_bucket_pairs_into_complete_cycle() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[40.0], &[41.0]),
            wave("M1|R", "2025-03-01T10:00:03+07:00", &[38.0], &[39.0]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        assert_eq!(cycles.len(), 1);
        let cycle = cycles.values().next().unwrap();
        assert!(cycle.complete);
        assert_eq!(cycle.key.prefix, "M1");
    }

    #[test]
    fn different_bucket_does_not_pair() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[40.0], &[41.0]),
            wave("M1|R", "2025-03-01T10:00:07+07:00", &[38.0], &[39.0]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.values().all(|c| !c.complete));
        assert_eq!(pairing_summary(&cycles).incomplete, 2);
    }

    #[test]
    fn different_prefixes_do_not_pair() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[40.0], &[41.0]),
            wave("M2|R", "2025-03-01T10:00:01+07:00", &[38.0], &[39.0]),
        ];
        assert_eq!(pair_cycles(&records, 5, &SIDES).len(), 2);
    }

    #[test]
    fn duplicate_side_makes_cycle_incomplete() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[40.0], &[41.0]),
            wave("M1|L", "2025-03-01T10:00:01+07:00", &[40.0], &[41.0]),
            wave("M1|R", "2025-03-01T10:00:02+07:00", &[38.0], &[39.0]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        let cycle = cycles.values().next().unwrap();
        assert!(!cycle.complete);
        assert!(cycle.side("L").is_none());
        assert!(cycle_status(cycle, &SIDES, BAND).is_none());
    }

    #[test]
    fn unsided_records_are_ignored() {
        let records = vec![wave("M1", "2025-03-01T10:00:00+07:00", &[40.0], &[41.0])];
        assert!(pair_cycles(&records, 5, &SIDES).is_empty());
    }

    #[test]
    fn status_uses_channel_peaks_and_worst_side() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[20.0, 37.0], &[36.0]),
            wave("M1|R", "2025-03-01T10:00:02+07:00", &[44.0], &[38.0]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        let status = cycle_status(cycles.values().next().unwrap(), &SIDES, BAND).unwrap();
        assert_eq!(status.sides[0].toe_heel_peak, 37.0);
        assert_eq!(status.sides[0].status(), BandStatus::Normal);
        assert_eq!(status.sides[1].toe_heel_status, BandStatus::Warning);
        assert_eq!(status.overall, BandStatus::Warning);
    }

    #[test]
    fn malformed_side_is_zero_filled_for_status_but_skipped_in_tally() {
        let records = vec![
            malformed("M1|L", "2025-03-01T10:00:00+07:00"),
            wave("M1|R", "2025-03-01T10:00:02+07:00", &[40.0, 41.0], &[39.0]),
            wave("M2|L", "2025-03-01T10:00:00+07:00", &[40.0, 50.0], &[39.0]),
            wave("M2|R", "2025-03-01T10:00:01+07:00", &[20.0], &[35.0]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        assert_eq!(cycles.len(), 2);

        let m1 = cycles.values().find(|c| c.key.prefix == "M1").unwrap();
        assert!(!m1.complete);
        let status = cycle_status(m1, &SIDES, BAND).unwrap();
        assert!(status.sides[0].zero_filled);
        assert_eq!(status.sides[0].toe_heel_peak, 0.0);
        assert_eq!(status.overall, BandStatus::Alert);

        let tally = compliance_tally(cycles.values(), BAND);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.standard, 3);
        assert_eq!(tally.not_standard, 2);
        assert_eq!(tally.standard_pct(), 60.0);
        assert_eq!(tally.not_standard_pct(), 40.0);
    }

    #[test]
    fn tally_bounds_are_inclusive() {
        let records = vec![
            wave("M1|L", "2025-03-01T10:00:00+07:00", &[30.0], &[45.0]),
            wave("M1|R", "2025-03-01T10:00:01+07:00", &[29.9], &[45.1]),
        ];
        let cycles = pair_cycles(&records, 5, &SIDES);
        let tally = compliance_tally(cycles.values(), BAND);
        assert_eq!(tally.standard, 2);
        assert_eq!(tally.not_standard, 2);
    }

    #[test]
    fn empty_tally_percentages_are_zero() {
        let tally = ComplianceTally::default();
        assert_eq!(tally.standard_pct(), 0.0);
        assert_eq!(tally.not_standard_pct(), 0.0);
    }
}
