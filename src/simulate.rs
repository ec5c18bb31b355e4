//! Synthetic press cycle generator.
//!
//! Produces L/R record pairs for a set of machines on one line, with the
//! timing irregularities and quality mix seen on a real press floor: a cycle
//! of roughly 16 seconds, the right side firing 2 to 8 seconds after the
//! left, occasional production breaks, and a minority of marginal, defective
//! or faulty-sensor strokes. Output is deterministic for a given seed.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use std::fmt;
use std::io::Write;

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::errors::Result;
use crate::records::ingest::write_jsonl;
use crate::records::record::{SourceKey, Timestamp, TimestampedRecord};
use crate::records::waveform::{Payload, Waveform};

const SAMPLES_PER_WAVEFORM: usize = 30;
const BASE_CYCLE_SECS: i64 = 16;
const GOOD_PEAK: (i64, i64) = (30, 45);
const EXCELLENT_PEAK: (i64, i64) = (32, 42);

/// Stroke quality. Weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityGrade {
    Excellent,
    Good,
    Marginal,
    Defective,
    SensorIssue,
}

impl QualityGrade {
    pub const WEIGHTS: [(Self, f64); 5] = [
        (Self::Excellent, 0.60),
        (Self::Good, 0.25),
        (Self::Marginal, 0.10),
        (Self::Defective, 0.03),
        (Self::SensorIssue, 0.02),
    ];

    fn pick(rng: &mut impl Rng) -> Self {
        let roll: f64 = rng.random();
        let mut cumulative = 0.0;
        for (grade, weight) in Self::WEIGHTS {
            cumulative += weight;
            if roll < cumulative {
                return grade;
            }
        }
        Self::Excellent
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Marginal => "MARGINAL",
            Self::Defective => "DEFECTIVE",
            Self::SensorIssue => "SENSOR_ISSUE",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationParams {
    /// Records to produce (two per cycle).
    pub count: usize,
    pub line: String,
    pub machines: Vec<String>,
    pub start: Timestamp,
    /// `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl SimulationParams {
    pub fn new(count: usize, line: impl Into<String>, start: Timestamp) -> Self {
        Self {
            count,
            line: line.into(),
            machines: (1..=4).map(|n| format!("M{n}")).collect(),
            start,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One generated record plus the generator's own view of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedRecord {
    pub timestamp: Timestamp,
    pub source_key: SourceKey,
    pub grade: QualityGrade,
    pub toe_heel_peak: i64,
    pub side_peak: i64,
    pub cycle_secs: i64,
    pub toe_heel: Vec<f64>,
    pub side: Vec<f64>,
}

impl SimulatedRecord {
    pub fn to_record(&self) -> TimestampedRecord {
        TimestampedRecord::new(
            self.timestamp,
            self.source_key.clone(),
            Payload::Waveform(Waveform::pair(self.toe_heel.clone(), self.side.clone())),
        )
    }

    /// Stored shape: the enhanced payload object carrying both waveforms
    /// next to the generator's quality annotation.
    fn payload_value(&self) -> Value {
        json!({
            "waveforms": [self.toe_heel, self.side],
            "quality": {
                "grade": self.grade,
                "peaks": {"th": self.toe_heel_peak, "side": self.side_peak},
                "sample_count": self.toe_heel.len(),
                "actual_cycle_time": self.cycle_secs,
            },
        })
    }
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    timestamp: Timestamp,
    source_key: &'a SourceKey,
    payload: Value,
}

/// Generate `params.count` records ordered by timestamp.
pub fn simulate(params: &SimulationParams) -> Vec<SimulatedRecord> {
    let mut rng = params
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut out = Vec::with_capacity(params.count);
    let mut clock = params.start;

    if params.machines.is_empty() {
        return out;
    }

    while out.len() < params.count {
        for machine in &params.machines {
            if out.len() >= params.count {
                break;
            }
            let cycle_secs = BASE_CYCLE_SECS + rng.random_range(-1..=4);
            let left_at = clock + Duration::seconds(rng.random_range(0..=30));
            let right_at = left_at + Duration::seconds(rng.random_range(2..=8));

            for (side, at) in [("L", left_at), ("R", right_at)] {
                let key = SourceKey::new(format!("{}|{machine}|{side}", params.line));
                out.push(stroke(&mut rng, key, at, cycle_secs));
            }
            clock += Duration::seconds(cycle_secs + rng.random_range(1..=3));
        }

        if rng.random_range(1..=100) <= 5 {
            clock += Duration::minutes(rng.random_range(2..=10));
        }
    }

    out.truncate(params.count);
    out.sort_by_key(|record| record.timestamp);
    out
}

/// Write records as JSONL in the enhanced payload shape.
pub fn write_simulation<W: Write>(out: W, records: &[SimulatedRecord]) -> Result<()> {
    let stored: Vec<StoredRecord<'_>> = records
        .iter()
        .map(|record| StoredRecord {
            timestamp: record.timestamp,
            source_key: &record.source_key,
            payload: record.payload_value(),
        })
        .collect();
    write_jsonl(out, &stored)
}

fn stroke(rng: &mut StdRng, source_key: SourceKey, timestamp: Timestamp, cycle_secs: i64) -> SimulatedRecord {
    let grade = QualityGrade::pick(rng);
    let (toe_heel_peak, side_peak) = peaks(rng, grade);
    SimulatedRecord {
        timestamp,
        source_key,
        grade,
        toe_heel_peak,
        side_peak,
        cycle_secs,
        toe_heel: waveform(rng, toe_heel_peak, grade),
        side: waveform(rng, side_peak, grade),
    }
}

fn between(rng: &mut impl Rng, (lo, hi): (i64, i64)) -> i64 {
    rng.random_range(lo..=hi)
}

fn peaks(rng: &mut impl Rng, grade: QualityGrade) -> (i64, i64) {
    match grade {
        QualityGrade::Excellent => (between(rng, EXCELLENT_PEAK), between(rng, EXCELLENT_PEAK)),
        QualityGrade::Good => (between(rng, GOOD_PEAK), between(rng, GOOD_PEAK)),
        QualityGrade::Marginal => {
            if rng.random_bool(0.5) {
                (between(rng, GOOD_PEAK), between(rng, (20, 29)))
            } else {
                (between(rng, (46, 55)), between(rng, GOOD_PEAK))
            }
        }
        QualityGrade::SensorIssue => match rng.random_range(1..=3) {
            1 => (between(rng, (5, 15)), between(rng, (5, 15))),
            2 => (between(rng, GOOD_PEAK), between(rng, (0, 5))),
            _ => (between(rng, (80, 100)), between(rng, (80, 100))),
        },
        QualityGrade::Defective => (between(rng, (10, 25)), between(rng, (50, 75))),
    }
}

/// Ramp, hold, release over a fixed sample count. Noise and shape depend on
/// the grade; samples never go below zero.
fn waveform(rng: &mut impl Rng, peak: i64, grade: QualityGrade) -> Vec<f64> {
    let ramp = SAMPLES_PER_WAVEFORM * 3 / 10;
    let hold = SAMPLES_PER_WAVEFORM * 4 / 10;
    let release = SAMPLES_PER_WAVEFORM - ramp - hold;
    let peak_f = peak as f64;

    (0..SAMPLES_PER_WAVEFORM)
        .map(|i| {
            let sample = match grade {
                QualityGrade::Excellent | QualityGrade::Good => {
                    if i < ramp {
                        let progress = i as f64 / ramp as f64;
                        peak_f * progress * progress + f64::from(rng.random_range(-1_i32..=1))
                    } else if i < ramp + hold {
                        peak_f + f64::from(rng.random_range(-2_i32..=2))
                    } else {
                        let progress = (i - ramp - hold) as f64 / release as f64;
                        peak_f * (1.0 - progress * progress) + f64::from(rng.random_range(-1_i32..=1))
                    }
                }
                QualityGrade::Marginal => {
                    if i < ramp {
                        peak_f * (i as f64 / ramp as f64) + f64::from(rng.random_range(-3_i32..=5))
                    } else if i < ramp + hold {
                        let spike = if rng.random_range(0..=5) == 0 {
                            rng.random_range(5..=15)
                        } else {
                            0
                        };
                        peak_f + f64::from(rng.random_range(-8_i32..=8) + spike)
                    } else {
                        let progress = (i - ramp - hold) as f64 / release as f64;
                        peak_f * (1.0 - progress) + f64::from(rng.random_range(-5_i32..=3))
                    }
                }
                QualityGrade::SensorIssue if peak < 10 => f64::from(rng.random_range(0_i32..=8)),
                QualityGrade::SensorIssue => (peak + rng.random_range(-25..=25)) as f64,
                QualityGrade::Defective => (rng.random_range(0..=peak) + rng.random_range(-10..=15)) as f64,
            };
            sample.trunc().max(0.0)
        })
        .collect()
}
