//! Downtime accounting from activity timestamps.
//!
//! A silence between two activity instants (or between a window edge and the
//! nearest instant) is downtime when it lasts strictly longer than the
//! threshold. Qualifying gaps count in full; shorter ones are polling jitter
//! and count as uptime.

use serde::Serialize;

use crate::records::record::Timestamp;
use crate::records::window::TimeWindow;
use crate::stats::kit::{percentage, round_to};

/// A silence interval long enough to count as downtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapInterval {
    pub from: Timestamp,
    pub to: Timestamp,
    pub duration_secs: i64,
}

impl GapInterval {
    fn between(from: Timestamp, to: Timestamp) -> Self {
        Self {
            from,
            to,
            duration_secs: (to - from).num_seconds(),
        }
    }
}

/// Online/offline split in percent. The two halves sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UptimeSplit {
    pub online: f64,
    pub offline: f64,
}

/// Everything an uptime widget shows for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeSummary {
    pub total_secs: i64,
    pub downtime_secs: i64,
    pub gaps: Vec<GapInterval>,
    pub split: UptimeSplit,
}

/// Gaps longer than `threshold_secs` within `window`.
///
/// `timestamps` must be sorted ascending; this is checked in debug builds
/// only. With no timestamps the whole window is a single gap, provided it is
/// itself longer than the threshold.
pub fn downtime_gaps(
    timestamps: &[Timestamp],
    window: &TimeWindow,
    threshold_secs: i64,
) -> Vec<GapInterval> {
    debug_assert!(
        timestamps.is_sorted(),
        "downtime_gaps requires timestamps sorted ascending"
    );

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        let whole = GapInterval::between(window.start(), window.end());
        return if whole.duration_secs > threshold_secs {
            vec![whole]
        } else {
            Vec::new()
        };
    };

    std::iter::once(GapInterval::between(window.start(), first))
        .chain(
            timestamps
                .windows(2)
                .map(|pair| GapInterval::between(pair[0], pair[1])),
        )
        .chain(std::iter::once(GapInterval::between(last, window.end())))
        .filter(|gap| gap.duration_secs > threshold_secs)
        .collect()
}

/// Total downtime in seconds; see [`downtime_gaps`].
pub fn total_downtime(timestamps: &[Timestamp], window: &TimeWindow, threshold_secs: i64) -> i64 {
    downtime_gaps(timestamps, window, threshold_secs)
        .iter()
        .map(|gap| gap.duration_secs)
        .sum()
}

/// Split a tracked period into online and offline percentages (2 decimals).
///
/// A non-positive total yields `{online: 0, offline: 100}`: nothing measured
/// is never reported as fully online.
pub fn uptime_split(total_secs: i64, downtime_secs: i64) -> UptimeSplit {
    if total_secs <= 0 {
        return UptimeSplit {
            online: 0.0,
            offline: 100.0,
        };
    }
    #[allow(clippy::cast_precision_loss)]
    let offline = round_to(percentage(downtime_secs as f64, total_secs as f64), 2).clamp(0.0, 100.0);
    UptimeSplit {
        online: round_to(100.0 - offline, 2),
        offline,
    }
}

/// Gaps, total downtime and split for one window.
pub fn summarize(timestamps: &[Timestamp], window: &TimeWindow, threshold_secs: i64) -> UptimeSummary {
    let gaps = downtime_gaps(timestamps, window, threshold_secs);
    let downtime_secs = gaps.iter().map(|gap| gap.duration_secs).sum();
    let total_secs = window.duration_secs();
    UptimeSummary {
        total_secs,
        downtime_secs,
        gaps,
        split: uptime_split(total_secs, downtime_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use proptest::prelude::*;

    fn ts(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn hour_window() -> TimeWindow {
        TimeWindow::new(ts("2025-01-01T00:00:00Z"), ts("2025-01-01T01:00:00Z")).unwrap()
    }

    #[test]
    fn empty_timestamps_count_whole_window() {
        assert_eq!(total_downtime(&[], &hour_window(), 120), 3600);
    }

    #[test]
    fn empty_timestamps_in_short_window_count_nothing() {
        let start = ts("2025-01-01T00:00:00Z");
        let window = TimeWindow::new(start, start + Duration::seconds(120)).unwrap();
        assert_eq!(total_downtime(&[], &window, 120), 0);
        let window = TimeWindow::new(start, start + Duration::seconds(121)).unwrap();
        assert_eq!(total_downtime(&[], &window, 120), 121);
    }

    #[test]
    fn single_midpoint_counts_both_boundary_gaps() {
        let gaps = downtime_gaps(&[ts("2025-01-01T00:30:00Z")], &hour_window(), 120);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].duration_secs, 1800);
        assert_eq!(gaps[1].duration_secs, 1800);
        assert_eq!(total_downtime(&[ts("2025-01-01T00:30:00Z")], &hour_window(), 120), 3600);
    }

    #[test]
    fn regular_polling_has_no_downtime() {
        let start = hour_window().start();
        let stamps: Vec<Timestamp> = (0..=60).map(|i| start + Duration::seconds(i * 60)).collect();
        assert_eq!(total_downtime(&stamps, &hour_window(), 120), 0);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_count() {
        let start = hour_window().start();
        let stamps = vec![start, start + Duration::seconds(120), hour_window().end()];
        let gaps = downtime_gaps(&stamps, &hour_window(), 120);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].from, start + Duration::seconds(120));
        assert_eq!(gaps[0].duration_secs, 3600 - 120);
    }

    #[test]
    fn qualifying_gap_counts_in_full() {
        let start = hour_window().start();
        let stamps = vec![
            start,
            start + Duration::seconds(60),
            start + Duration::seconds(60 + 300),
            start + Duration::seconds(3540),
        ];
        let gaps = downtime_gaps(&stamps, &hour_window(), 120);
        let durations: Vec<i64> = gaps.iter().map(|g| g.duration_secs).collect();
        assert_eq!(durations, vec![300, 3540 - 360]);
    }

    #[test]
    fn split_guards_empty_total() {
        assert_eq!(
            uptime_split(0, 0),
            UptimeSplit {
                online: 0.0,
                offline: 100.0
            }
        );
        assert_eq!(uptime_split(-5, 0).offline, 100.0);
    }

    #[test]
    fn split_rounds_offline_and_complements() {
        let split = uptime_split(3, 1);
        assert_eq!(split.offline, 33.33);
        assert_eq!(split.online, 66.67);
    }

    #[test]
    fn summarize_reports_window_totals() {
        let summary = summarize(&[ts("2025-01-01T00:30:00Z")], &hour_window(), 120);
        assert_eq!(summary.total_secs, 3600);
        assert_eq!(summary.downtime_secs, 3600);
        assert_eq!(summary.split.offline, 100.0);
        assert_eq!(summary.split.online, 0.0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "sorted ascending")]
    fn unsorted_timestamps_panic_in_debug() {
        let stamps = vec![ts("2025-01-01T00:40:00Z"), ts("2025-01-01T00:10:00Z")];
        let _ = downtime_gaps(&stamps, &hour_window(), 120);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Downtime never exceeds the window when all instants lie inside it.
        #[test]
        fn downtime_bounded_by_window(
            mut offsets in prop::collection::vec(0_i64..=3600, 0..50),
            threshold in 0_i64..600,
        ) {
            offsets.sort_unstable();
            let window = hour_window();
            let stamps: Vec<Timestamp> = offsets
                .iter()
                .map(|s| window.start() + Duration::seconds(*s))
                .collect();
            let down = total_downtime(&stamps, &window, threshold);
            prop_assert!(down >= 0);
            prop_assert!(down <= window.duration_secs());
        }

        #[test]
        fn split_sums_to_hundred(total in 1_i64..1_000_000, frac in 0.0..=1.0_f64) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let down = (total as f64 * frac) as i64;
            let split = uptime_split(total, down);
            prop_assert!((split.online + split.offline - 100.0).abs() < 1e-9);
            prop_assert!((0.0..=100.0).contains(&split.offline));
        }
    }
}
