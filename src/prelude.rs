//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use plant_insight::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{PinError, Result};

// Records
pub use crate::records::ingest::{load_records, parse_jsonl, read_jsonl};
pub use crate::records::record::{SourceKey, Timestamp, TimestampedRecord};
pub use crate::records::waveform::{Channel, Payload, Waveform};
pub use crate::records::window::TimeWindow;

// Uptime
pub use crate::uptime::format::{format_clock, format_duration};
pub use crate::uptime::gaps::{GapInterval, UptimeSplit, UptimeSummary, downtime_gaps, total_downtime, uptime_split};
pub use crate::uptime::transitions::{DeviceStatus, StatusLedger, StatusLogEntry, account_transitions};

// Cycles
pub use crate::cycles::pairing::{Cycle, CycleKey, CycleStatus, pair_cycles};

// Deviation
pub use crate::deviation::classifier::{BandStatus, Severity, SeverityCutoffs, StandardBand, classify, classify_band};
pub use crate::deviation::zones::{VarianceReport, ZoneReading, zone_variance};

// Reports
pub use crate::report::assembler::{DashboardParams, LineDashboard, line_dashboard};
pub use crate::report::chart::ChartSeries;
