//! Uptime and downtime accounting.

pub mod format;
pub mod gaps;
pub mod transitions;
