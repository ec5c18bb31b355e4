//! Device status-log accounting.
//!
//! Polling agents append one entry whenever a device changes status. Each
//! entry's `duration_secs` is the time the device spent in the *previous*
//! status, so an `online` entry closes an offline or timeout period and an
//! `offline`/`timeout` entry closes an online period. The final entry's
//! status is still open and is extended up to an explicit `as_of` instant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::record::{SourceKey, Timestamp};
use crate::records::window::TimeWindow;
use crate::stats::kit::{percentage, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Timeout,
}

impl DeviceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Timeout => "timeout",
        }
    }

    pub const fn is_down(self) -> bool {
        matches!(self, Self::Offline | Self::Timeout)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status-change entry from a device uptime log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub logged_at: Timestamp,
    pub source_key: SourceKey,
    pub status: DeviceStatus,
    /// Seconds spent in the previous status.
    #[serde(default, alias = "duration_seconds")]
    pub duration_secs: Option<i64>,
}

/// Per-device accounting over a status log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusLedger {
    pub online_secs: i64,
    pub offline_secs: i64,
    pub timeout_secs: i64,
    pub online_count: usize,
    pub offline_count: usize,
    pub timeout_count: usize,
    pub total_entries: usize,
    /// `None` when the log is empty.
    pub current_status: Option<DeviceStatus>,
    pub last_logged_at: Option<Timestamp>,
    pub longest_downtime_secs: i64,
    /// Online share of tracked time, 2 decimals; 0 when nothing is tracked.
    pub uptime_percentage: f64,
    /// Tracked seconds per entry, 2 decimals; 0 unless there are two or more entries.
    pub average_interval_secs: f64,
}

impl StatusLedger {
    pub const fn downtime_secs(&self) -> i64 {
        self.offline_secs + self.timeout_secs
    }

    pub const fn tracked_secs(&self) -> i64 {
        self.online_secs + self.offline_secs + self.timeout_secs
    }

    fn credit(&mut self, status: DeviceStatus, secs: i64) {
        match status {
            DeviceStatus::Online => self.online_secs += secs,
            DeviceStatus::Offline => self.offline_secs += secs,
            DeviceStatus::Timeout => self.timeout_secs += secs,
        }
    }
}

/// Account one device's status log.
///
/// `entries` must be sorted by `logged_at` (checked in debug builds). A
/// negative or missing duration counts as zero.
#[allow(clippy::cast_precision_loss)]
pub fn account_transitions(entries: &[StatusLogEntry], as_of: Timestamp) -> StatusLedger {
    debug_assert!(
        entries.is_sorted_by_key(|entry| entry.logged_at),
        "account_transitions requires entries sorted by logged_at"
    );

    let mut ledger = StatusLedger {
        total_entries: entries.len(),
        ..StatusLedger::default()
    };
    let Some(last) = entries.last() else {
        return ledger;
    };

    let mut previous: Option<DeviceStatus> = None;
    for entry in entries {
        let duration = entry.duration_secs.unwrap_or(0).max(0);
        match entry.status {
            DeviceStatus::Online => {
                ledger.online_count += 1;
                // The first entry has nothing before it to credit.
                if let Some(prev) = previous {
                    let closed = if prev == DeviceStatus::Timeout {
                        DeviceStatus::Timeout
                    } else {
                        DeviceStatus::Offline
                    };
                    ledger.credit(closed, duration);
                    ledger.longest_downtime_secs = ledger.longest_downtime_secs.max(duration);
                }
            }
            DeviceStatus::Offline | DeviceStatus::Timeout => {
                if entry.status == DeviceStatus::Offline {
                    ledger.offline_count += 1;
                } else {
                    ledger.timeout_count += 1;
                }
                ledger.online_secs += duration;
            }
        }
        previous = Some(entry.status);
    }

    let ongoing = (as_of - last.logged_at).num_seconds().max(0);
    ledger.credit(last.status, ongoing);
    if last.status.is_down() {
        ledger.longest_downtime_secs = ledger.longest_downtime_secs.max(ongoing);
    }

    ledger.current_status = Some(last.status);
    ledger.last_logged_at = Some(last.logged_at);

    let tracked = ledger.tracked_secs() as f64;
    ledger.uptime_percentage = round_to(percentage(ledger.online_secs as f64, tracked), 2);
    ledger.average_interval_secs = if entries.len() > 1 {
        round_to(tracked / entries.len() as f64, 2)
    } else {
        0.0
    };
    ledger
}

/// Account every device in a mixed log. Entries are grouped by source key
/// and each group keeps its input order.
pub fn account_by_device(
    entries: &[StatusLogEntry],
    as_of: Timestamp,
) -> BTreeMap<SourceKey, StatusLedger> {
    let mut grouped: BTreeMap<SourceKey, Vec<StatusLogEntry>> = BTreeMap::new();
    for entry in entries {
        grouped
            .entry(entry.source_key.clone())
            .or_default()
            .push(entry.clone());
    }
    grouped
        .into_iter()
        .map(|(key, group)| {
            let ledger = account_transitions(&group, as_of);
            (key, ledger)
        })
        .collect()
}

/// Fleet-wide totals across device ledgers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusTotals {
    pub online_secs: i64,
    pub offline_secs: i64,
    pub timeout_secs: i64,
    pub online_count: usize,
    pub offline_count: usize,
    pub timeout_count: usize,
    pub online_percentage: f64,
    pub offline_percentage: f64,
    pub timeout_percentage: f64,
}

#[allow(clippy::cast_precision_loss)]
pub fn combine<'a>(ledgers: impl IntoIterator<Item = &'a StatusLedger>) -> StatusTotals {
    let mut totals = ledgers
        .into_iter()
        .fold(StatusTotals::default(), |mut acc, ledger| {
            acc.online_secs += ledger.online_secs;
            acc.offline_secs += ledger.offline_secs;
            acc.timeout_secs += ledger.timeout_secs;
            acc.online_count += ledger.online_count;
            acc.offline_count += ledger.offline_count;
            acc.timeout_count += ledger.timeout_count;
            acc
        });
    let tracked = (totals.online_secs + totals.offline_secs + totals.timeout_secs) as f64;
    totals.online_percentage = round_to(percentage(totals.online_secs as f64, tracked), 2);
    totals.offline_percentage = round_to(percentage(totals.offline_secs as f64, tracked), 2);
    totals.timeout_percentage = round_to(percentage(totals.timeout_secs as f64, tracked), 2);
    totals
}

/// Seconds `status` was held according to ordered status checks in `window`.
///
/// A run opens at the first check reporting `status` and closes at the next
/// check reporting anything else. A run still open after the last check is
/// closed at `min(as_of, window.end)`. Checks outside the window are ignored.
pub fn time_in_status(
    checks: &[StatusLogEntry],
    status: DeviceStatus,
    window: &TimeWindow,
    as_of: Timestamp,
) -> i64 {
    let mut total = 0;
    let mut run_start: Option<Timestamp> = None;

    for check in checks.iter().filter(|c| window.contains(c.logged_at)) {
        if check.status == status {
            run_start.get_or_insert(check.logged_at);
        } else if let Some(start) = run_start.take() {
            total += (check.logged_at - start).num_seconds().max(0);
        }
    }

    if let Some(start) = run_start {
        let close = window.clamp(as_of);
        total += (close - start).num_seconds().max(0);
    }
    total
}
