//! Severity tiers against a target and status bands against a tolerance range.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How far an observation strays from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Minor, Self::Major, Self::Critical];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two ascending cutoffs on `|deviation|`.
///
/// Reports do not agree on one pair, so each report picks its own; the two
/// pairs in use are available as named presets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityCutoffs {
    pub minor: f64,
    pub major: f64,
}

impl SeverityCutoffs {
    /// Chamber temperature adjustment view.
    pub const STC_TIGHT: Self = Self {
        minor: 3.0,
        major: 6.0,
    };
    /// Chamber temperature history view.
    pub const STC_WIDE: Self = Self {
        minor: 5.0,
        major: 10.0,
    };

    pub const fn new(minor: f64, major: f64) -> Self {
        Self { minor, major }
    }

    /// Tier for an already computed deviation.
    pub fn tier(&self, deviation: f64) -> Severity {
        let magnitude = deviation.abs();
        if magnitude <= self.minor {
            Severity::Minor
        } else if magnitude <= self.major {
            Severity::Major
        } else {
            Severity::Critical
        }
    }
}

impl Default for SeverityCutoffs {
    fn default() -> Self {
        Self::STC_TIGHT
    }
}

/// `minor` within `cutoffs.minor` of target, `major` within `cutoffs.major`,
/// otherwise `critical`. Both cutoffs are inclusive.
pub fn classify(value: f64, target: f64, cutoffs: SeverityCutoffs) -> Severity {
    cutoffs.tier(value - target)
}

/// Live status of a reading against its tolerance band. Ordered from best to
/// worst so `max` picks the worse of two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandStatus {
    Normal,
    Warning,
    Alert,
}

impl BandStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for BandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive tolerance range `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardBand {
    pub lower: f64,
    pub upper: f64,
}

impl StandardBand {
    /// Width of the warning margin inside each bound.
    pub const WARNING_MARGIN: f64 = 1.0;

    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// `alert` outside the band, `warning` within one unit inside either bound
/// (margin edges included, so 44 warns on a `[30, 45]` band), `normal`
/// otherwise. Non-finite values are `alert`.
pub fn classify_band(value: f64, band: StandardBand) -> BandStatus {
    if !band.contains(value) {
        BandStatus::Alert
    } else if value >= band.upper - StandardBand::WARNING_MARGIN
        || value <= band.lower + StandardBand::WARNING_MARGIN
    {
        BandStatus::Warning
    } else {
        BandStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND: StandardBand = StandardBand::new(30.0, 45.0);

    #[test]
    fn band_examples() {
        assert_eq!(classify_band(46.0, BAND), BandStatus::Alert);
        assert_eq!(classify_band(44.0, BAND), BandStatus::Warning);
        assert_eq!(classify_band(37.0, BAND), BandStatus::Normal);
        assert_eq!(classify_band(20.0, BAND), BandStatus::Alert);
    }

    #[test]
    fn band_edges() {
        assert_eq!(classify_band(45.0, BAND), BandStatus::Warning);
        assert_eq!(classify_band(30.0, BAND), BandStatus::Warning);
        assert_eq!(classify_band(30.5, BAND), BandStatus::Warning);
        assert_eq!(classify_band(31.0, BAND), BandStatus::Warning);
        assert_eq!(classify_band(31.5, BAND), BandStatus::Normal);
        assert_eq!(classify_band(44.0 - 1e-9, BAND), BandStatus::Normal);
        assert_eq!(classify_band(f64::NAN, BAND), BandStatus::Alert);
    }

    #[test]
    fn band_status_orders_worst_last() {
        assert_eq!(BandStatus::Normal.max(BandStatus::Alert), BandStatus::Alert);
        assert_eq!(BandStatus::Warning.max(BandStatus::Normal), BandStatus::Warning);
    }

    #[test]
    fn tight_cutoffs() {
        let c = SeverityCutoffs::STC_TIGHT;
        assert_eq!(classify(75.0, 75.0, c), Severity::Minor);
        assert_eq!(classify(78.0, 75.0, c), Severity::Minor);
        assert_eq!(classify(71.0, 75.0, c), Severity::Major);
        assert_eq!(classify(81.0, 75.0, c), Severity::Major);
        assert_eq!(classify(81.5, 75.0, c), Severity::Critical);
    }

    #[test]
    fn wide_cutoffs_differ_from_tight() {
        assert_eq!(classify(80.0, 75.0, SeverityCutoffs::STC_WIDE), Severity::Minor);
        assert_eq!(classify(80.0, 75.0, SeverityCutoffs::STC_TIGHT), Severity::Major);
        assert_eq!(classify(64.0, 75.0, SeverityCutoffs::STC_WIDE), Severity::Critical);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
