//! Timestamped observations and the source keys that identify their origin.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::records::waveform::Payload;

/// Zoned, second-precision instant used throughout the analytics core.
pub type Timestamp = DateTime<FixedOffset>;

/// Identifier of the machine, line or position a record came from.
///
/// Segments are separated by `|`. The last segment of a multi-segment key is
/// the *side* discriminator (`"M3|L"` has prefix `"M3"` and side `"L"`); a
/// single-segment key (`"M3"`) has no side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceKey(String);

impl SourceKey {
    /// Separator between key segments.
    pub const SEPARATOR: char = '|';

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a sided key such as `M3|L`.
    pub fn with_side(prefix: &str, side: &str) -> Self {
        Self(format!("{prefix}{}{side}", Self::SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the side discriminator, or the whole key when unsided.
    pub fn prefix(&self) -> &str {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .map_or(self.0.as_str(), |(prefix, _)| prefix)
    }

    /// The side discriminator, if the key has one.
    pub fn side(&self) -> Option<&str> {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .map(|(_, side)| side)
            .filter(|side| !side.is_empty())
    }

    /// Whether this key belongs to `filter`, matched against the whole key or
    /// any of its leading segments (`"G5"` matches `"G5|M3|L"`).
    pub fn matches(&self, filter: &str) -> bool {
        if self.0 == filter {
            return true;
        }
        self.0
            .strip_prefix(filter)
            .is_some_and(|rest| rest.starts_with(Self::SEPARATOR))
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An immutable observation produced by ingestion outside the analytics core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedRecord {
    pub timestamp: Timestamp,
    pub source_key: SourceKey,
    pub payload: Payload,
}

impl TimestampedRecord {
    pub fn new(timestamp: Timestamp, source_key: impl Into<SourceKey>, payload: Payload) -> Self {
        Self {
            timestamp,
            source_key: source_key.into(),
            payload,
        }
    }
}

/// Keep only records whose key matches one of `filters`; an empty filter set
/// keeps everything.
pub fn filter_by_sources<'a>(
    records: &'a [TimestampedRecord],
    filters: &'a [String],
) -> impl Iterator<Item = &'a TimestampedRecord> + 'a {
    records.iter().filter(move |record| {
        filters.is_empty() || filters.iter().any(|f| record.source_key.matches(f))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sided_key_splits_on_last_separator() {
        let key = SourceKey::new("G5|M3|L");
        assert_eq!(key.prefix(), "G5|M3");
        assert_eq!(key.side(), Some("L"));
    }

    #[test]
    fn unsided_key_is_its_own_prefix() {
        let key = SourceKey::new("M3");
        assert_eq!(key.prefix(), "M3");
        assert_eq!(key.side(), None);
    }

    #[test]
    fn trailing_separator_has_no_side() {
        let key = SourceKey::new("M3|");
        assert_eq!(key.prefix(), "M3");
        assert_eq!(key.side(), None);
    }

    #[test]
    fn with_side_round_trips_through_accessors() {
        let key = SourceKey::with_side("M1", "R");
        assert_eq!(key.as_str(), "M1|R");
        assert_eq!(key.prefix(), "M1");
        assert_eq!(key.side(), Some("R"));
    }

    #[test]
    fn matches_whole_segments_only() {
        let key = SourceKey::new("G5|M3|L");
        assert!(key.matches("G5"));
        assert!(key.matches("G5|M3"));
        assert!(key.matches("G5|M3|L"));
        assert!(!key.matches("G"));
        assert!(!key.matches("M3"));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let ts = DateTime::parse_from_rfc3339("2025-01-01T00:00:00+07:00").unwrap();
        let records = vec![
            TimestampedRecord::new(ts, "M1|L", Payload::Scalar(1.0)),
            TimestampedRecord::new(ts, "M2|L", Payload::Scalar(2.0)),
        ];
        assert_eq!(filter_by_sources(&records, &[]).count(), 2);
        let only_m2 = vec!["M2".to_string()];
        let kept: Vec<_> = filter_by_sources(&records, &only_m2).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source_key.as_str(), "M2|L");
    }
}
