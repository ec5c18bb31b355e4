//! Line dashboard assembly.
//!
//! Filters a record set down to a window and a set of machines, runs gap
//! accounting, cycle pairing and banding over it, and shapes the results into
//! plain data for presentation. Every input arrives as an explicit parameter;
//! nothing is cached between calls.

#![allow(missing_docs, clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::cycles::pairing::{self, ComplianceTally, PairingSummary};
use crate::deviation::classifier::{BandStatus, StandardBand, classify_band};
use crate::deviation::zones::VarianceReport;
use crate::records::record::{Timestamp, TimestampedRecord, filter_by_sources};
use crate::records::ingest::count_malformed;
use crate::records::waveform::{Channel, Waveform};
use crate::records::window::TimeWindow;
use crate::report::chart::ChartSeries;
use crate::stats::kit::{self, FiveNumberSummary, round_to};
use crate::uptime::gaps::{self, UptimeSummary};

/// How a snapshot reduces one waveform channel to a single current reading.
///
/// The press dashboards disagree here: the machine overview shows the median
/// of the latest waveform, the cycle views show the peak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentReading {
    #[default]
    Max,
    Median,
}

impl CurrentReading {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Median => "median",
        }
    }

    pub fn reduce(self, values: &[f64]) -> f64 {
        match self {
            Self::Max => kit::max(values),
            Self::Median => kit::median(values),
        }
    }
}

impl fmt::Display for CurrentReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrentReading {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "median" => Ok(Self::Median),
            other => Err(format!("expected max or median, got {other:?}")),
        }
    }
}

/// Constants a line dashboard is computed with.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub threshold_secs: i64,
    pub bucket_secs: i64,
    pub required_sides: Vec<String>,
    pub band: StandardBand,
    pub current_reading: CurrentReading,
}

impl DashboardParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold_secs: config.uptime.downtime_threshold_secs,
            bucket_secs: config.cycles.bucket_secs,
            required_sides: config.cycles.required_sides.clone(),
            band: config.pressure.band(),
            current_reading: config.pressure.current_reading,
        }
    }

    fn side_refs(&self) -> Vec<&str> {
        self.required_sides.iter().map(String::as_str).collect()
    }
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: f64,
    pub status: BandStatus,
}

impl SensorReading {
    fn banded(value: f64, band: StandardBand) -> Self {
        let value = round_to(value, 0);
        Self {
            value,
            status: classify_band(value, band),
        }
    }
}

/// Latest reading on one side of a machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideSnapshot {
    pub side: String,
    /// `None` when the side produced no record in the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<Timestamp>,
    pub toe_heel: SensorReading,
    #[serde(rename = "side_sensor")]
    pub side_channel: SensorReading,
    /// Records this side produced in the window.
    pub output: usize,
    pub zero_filled: bool,
}

impl SideSnapshot {
    pub fn status(&self) -> BandStatus {
        self.toe_heel.status.max(self.side_channel.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub machine: String,
    pub sides: Vec<SideSnapshot>,
    /// Worst status over every side and channel.
    pub overall: BandStatus,
    /// Mean of every positive reading of every well-formed record in the
    /// window, rounded to a whole number; 0 without any.
    pub average_pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceSummary {
    pub standard: usize,
    pub not_standard: usize,
    pub standard_pct: f64,
    pub not_standard_pct: f64,
}

impl From<ComplianceTally> for ComplianceSummary {
    fn from(tally: ComplianceTally) -> Self {
        Self {
            standard: tally.standard,
            not_standard: tally.not_standard,
            standard_pct: tally.standard_pct(),
            not_standard_pct: tally.not_standard_pct(),
        }
    }
}

/// Cycle snapshot statuses by band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub normal: usize,
    pub warning: usize,
    pub alert: usize,
}

impl StatusCounts {
    fn record(&mut self, status: BandStatus) {
        match status {
            BandStatus::Normal => self.normal += 1,
            BandStatus::Warning => self.warning += 1,
            BandStatus::Alert => self.alert += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDashboard {
    pub window: TimeWindow,
    pub records: usize,
    pub malformed_payloads: usize,
    pub uptime: UptimeSummary,
    pub pairing: PairingSummary,
    pub compliance: ComplianceSummary,
    pub cycle_status: StatusCounts,
    pub machines: Vec<MachineSnapshot>,
    pub average_pressure: ChartSeries,
    /// Five-number summaries of per-record channel peaks, keyed like
    /// `"L toe-heel"`.
    pub box_plots: BTreeMap<String, FiveNumberSummary>,
}

/// Assemble the dashboard for records of `sources` within `window`. An empty
/// source list selects every machine.
pub fn line_dashboard(
    records: &[TimestampedRecord],
    window: &TimeWindow,
    sources: &[String],
    params: &DashboardParams,
) -> LineDashboard {
    let selected: Vec<&TimestampedRecord> = filter_by_sources(records, sources)
        .filter(|record| window.contains(record.timestamp))
        .collect();
    let sides = params.side_refs();

    let mut activity: Vec<Timestamp> = selected.iter().map(|record| record.timestamp).collect();
    activity.sort_unstable();
    let uptime = gaps::summarize(&activity, window, params.threshold_secs);

    let cycles = pairing::pair_cycles(selected.iter().copied(), params.bucket_secs, &sides);
    let mut cycle_status = StatusCounts::default();
    for cycle in cycles.values() {
        if let Some(status) = pairing::cycle_status(cycle, &sides, params.band) {
            cycle_status.record(status.overall);
        }
    }
    let compliance = pairing::compliance_tally(cycles.values(), params.band).into();

    let machines = machine_snapshots(&selected, &sides, params);
    let average_pressure = ChartSeries::with_labels(machines.iter().map(|m| m.machine.clone()))
        .dataset(
            "average pressure",
            machines.iter().map(|m| m.average_pressure),
            1,
        );

    LineDashboard {
        window: *window,
        records: selected.len(),
        malformed_payloads: count_malformed(selected.iter().copied()),
        uptime,
        pairing: pairing::pairing_summary(&cycles),
        compliance,
        cycle_status,
        machines,
        average_pressure,
        box_plots: box_plots(&selected),
    }
}

fn machine_snapshots(
    records: &[&TimestampedRecord],
    sides: &[&str],
    params: &DashboardParams,
) -> Vec<MachineSnapshot> {
    let mut by_machine: BTreeMap<&str, Vec<&TimestampedRecord>> = BTreeMap::new();
    for &record in records {
        if record.source_key.side().is_some() {
            by_machine
                .entry(record.source_key.prefix())
                .or_default()
                .push(record);
        }
    }

    by_machine
        .into_iter()
        .map(|(machine, records)| {
            let snapshots: Vec<SideSnapshot> = sides
                .iter()
                .map(|side| side_snapshot(&records, side, params))
                .collect();
            let overall = snapshots
                .iter()
                .map(SideSnapshot::status)
                .max()
                .unwrap_or(BandStatus::Normal);
            let positive: Vec<f64> = records
                .iter()
                .flat_map(|record| record.payload.waveform().readings())
                .filter(|value| *value > 0.0)
                .collect();
            MachineSnapshot {
                machine: machine.to_string(),
                sides: snapshots,
                overall,
                average_pressure: round_to(kit::mean(&positive), 0),
            }
        })
        .collect()
}

/// Latest record of `side`; a side without records reads as zero-filled.
fn side_snapshot(records: &[&TimestampedRecord], side: &str, params: &DashboardParams) -> SideSnapshot {
    let on_side: Vec<&TimestampedRecord> = records
        .iter()
        .copied()
        .filter(|record| record.source_key.side() == Some(side))
        .collect();
    let latest = on_side.iter().copied().max_by_key(|record| record.timestamp);

    let waveform = latest
        .map_or(&Waveform::Malformed, |record| record.payload.waveform())
        .or_zero_filled();
    let reading = |channel: Channel| {
        SensorReading::banded(
            params.current_reading.reduce(waveform.display_channel(channel)),
            params.band,
        )
    };

    SideSnapshot {
        side: side.to_string(),
        recorded_at: latest.map(|record| record.timestamp),
        toe_heel: reading(Channel::ToeHeel),
        side_channel: reading(Channel::Side),
        output: on_side.len(),
        zero_filled: latest.is_none_or(|record| !record.payload.waveform().is_valid()),
    }
}

fn box_plots(records: &[&TimestampedRecord]) -> BTreeMap<String, FiveNumberSummary> {
    let mut peaks: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        let Some(side) = record.source_key.side() else {
            continue;
        };
        let waveform = record.payload.waveform();
        for channel in Channel::ALL {
            if let Some(values) = waveform.channel(channel)
                && !values.is_empty()
            {
                peaks
                    .entry(format!("{side} {}", channel.as_str()))
                    .or_default()
                    .push(kit::max(values));
            }
        }
    }
    peaks
        .into_iter()
        .filter_map(|(key, values)| kit::five_number_summary(&values).map(|summary| (key, summary)))
        .collect()
}

/// Per-zone target and observed averages, one label per zone.
pub fn variance_chart(report: &VarianceReport) -> ChartSeries {
    ChartSeries::with_labels(report.zones.iter().map(|zone| format!("Zone {}", zone.zone)))
        .dataset("target", report.zones.iter().map(|zone| zone.target), 2)
        .dataset("average", report.zones.iter().map(|zone| zone.stats.avg_actual), 2)
        .dataset(
            "deviation",
            report.zones.iter().map(|zone| zone.stats.avg_deviation),
            2,
        )
}

/// Snapshot status of every cycle with all required sides present, in cycle
/// order.
pub fn cycle_statuses(
    records: &[TimestampedRecord],
    window: &TimeWindow,
    params: &DashboardParams,
) -> Vec<pairing::CycleStatus> {
    let sides = params.side_refs();
    let cycles = pairing::pair_cycles(
        records.iter().filter(|record| window.contains(record.timestamp)),
        params.bucket_secs,
        &sides,
    );
    cycles
        .values()
        .filter_map(|cycle| pairing::cycle_status(cycle, &sides, params.band))
        .collect()
}
