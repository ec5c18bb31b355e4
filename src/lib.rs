#![forbid(unsafe_code)]

//! Plant Insight (pins): analytics core for industrial monitoring dashboards.
//!
//! Four concerns over timestamped sensor records:
//! 1. **Uptime**: downtime gaps between activity and status-log accounting
//! 2. **Cycles**: pairing left/right press readings into cycles
//! 3. **Deviation**: band and tiered-severity classification against targets
//! 4. **Reports**: dashboard snapshots and chart-ready series
//!
//! Analytics functions are pure: they take records, a [`records::window::TimeWindow`]
//! and parameters, and return serializable values. Only config loading, record
//! ingestion and the run log touch the outside world.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use plant_insight::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use plant_insight::core::config::Config;
//! use plant_insight::uptime::gaps::{downtime_gaps, summarize};
//! ```

pub mod prelude;

pub mod core;
pub mod cycles;
pub mod deviation;
pub mod logger;
pub mod records;
pub mod report;
pub mod simulate;
pub mod stats;
pub mod uptime;
