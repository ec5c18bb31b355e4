//! Closed time windows and the caller-side parsing of date-range filters.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;

use crate::core::errors::{PinError, Result};
use crate::records::record::Timestamp;

/// Which end of a window a user-supplied bound describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// A bare date means the start of that day.
    Start,
    /// A bare date means the last second of that day.
    End,
}

/// A closed interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
        if start > end {
            return Err(PinError::InvalidWindow {
                details: format!("start {} is after end {}", start.to_rfc3339(), end.to_rfc3339()),
            });
        }
        Ok(Self { start, end })
    }

    /// Window of `length` ending at `end`. Negative lengths collapse to an
    /// empty window at `end`; a start before the representable range is an
    /// error.
    pub fn ending_at(end: Timestamp, length: Duration) -> Result<Self> {
        let start = end
            .checked_sub_signed(length.max(Duration::zero()))
            .ok_or_else(|| PinError::InvalidWindow {
                details: format!("window of {}s before {} is out of range", length.num_seconds(), end.to_rfc3339()),
            })?;
        Ok(Self { start, end })
    }

    /// Parse a pair of user-supplied bounds, interpreting naive inputs in `offset`.
    pub fn parse(start: &str, end: &str, offset: FixedOffset) -> Result<Self> {
        let start = parse_bound(start, Bound::Start, offset)?;
        let end = parse_bound(end, Bound::End, offset)?;
        Self::new(start, end)
    }

    pub const fn start(&self) -> Timestamp {
        self.start
    }

    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Window length in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// `instant` clamped into the window.
    pub fn clamp(&self, instant: Timestamp) -> Timestamp {
        instant.clamp(self.start, self.end)
    }
}

/// Parse one bound of a date-range filter.
///
/// Accepts RFC 3339 (`2025-03-01T08:00:00+07:00`), a naive date-time
/// (`2025-03-01 08:00:00` or `2025-03-01T08:00`) or a bare date. Naive inputs
/// are placed in `offset`. A bare date is the start of the day for
/// [`Bound::Start`] and `23:59:59` for [`Bound::End`].
pub fn parse_bound(raw: &str, bound: Bound, offset: FixedOffset) -> Result<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(|date| {
                let time = match bound {
                    Bound::Start => NaiveTime::MIN,
                    Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
                };
                date.and_time(time)
            })
        })
        .ok_or_else(|| PinError::InvalidWindow {
            details: format!("unrecognized time {raw:?} (expected RFC 3339 or YYYY-MM-DD)"),
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| PinError::InvalidWindow {
            details: format!("time {raw:?} does not exist at offset {offset}"),
        })
}
