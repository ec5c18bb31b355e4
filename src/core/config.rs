//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::core::errors::{PinError, Result};
use crate::deviation::classifier::{SeverityCutoffs, StandardBand};
use crate::report::assembler::CurrentReading;

/// Full plant insight configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub uptime: UptimeConfig,
    pub cycles: CyclesConfig,
    pub pressure: PressureConfig,
    pub severity: SeverityConfig,
    pub zones: ZonesConfig,
    pub window: WindowConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Downtime gap detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UptimeConfig {
    /// Silences longer than this are downtime.
    pub downtime_threshold_secs: i64,
}

/// L/R cycle pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CyclesConfig {
    pub bucket_secs: i64,
    pub required_sides: Vec<String>,
}

/// Press pressure tolerance band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PressureConfig {
    pub standard_min: f64,
    pub standard_max: f64,
    /// How a snapshot reduces a channel to its current reading.
    pub current_reading: CurrentReading,
}

/// Deviation severity cutoffs for zone variance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeverityConfig {
    pub minor_cutoff: f64,
    pub major_cutoff: f64,
}

/// Per-zone target vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZonesConfig {
    pub targets: Vec<f64>,
}

/// How user-supplied time ranges are interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowConfig {
    /// Offset for naive times and bare dates, as `+HH:MM` or `-HH:MM`.
    pub utc_offset: String,
    /// Trailing window length used when no range is given.
    pub default_hours: i64,
}

/// Run-log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
    pub jsonl_fallback: Option<PathBuf>,
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            downtime_threshold_secs: 120,
        }
    }
}

impl Default for CyclesConfig {
    fn default() -> Self {
        Self {
            bucket_secs: 5,
            required_sides: vec!["L".to_string(), "R".to_string()],
        }
    }
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            standard_min: 30.0,
            standard_max: 45.0,
            current_reading: CurrentReading::Max,
        }
    }
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            minor_cutoff: SeverityCutoffs::STC_TIGHT.minor,
            major_cutoff: SeverityCutoffs::STC_TIGHT.major,
        }
    }
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            targets: vec![75.0, 73.0, 68.0, 63.0, 58.0, 53.0, 43.0, 43.0],
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            utc_offset: "+07:00".to_string(),
            default_hours: 24,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[PIN-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("pins").join("config.toml");
        let data = home_dir.join(".local").join("share").join("pins");
        Self {
            config_file: cfg,
            jsonl_log: data.join("runs.jsonl"),
            jsonl_fallback: Some(env::temp_dir().join("pins-runs.jsonl")),
        }
    }
}

impl CyclesConfig {
    pub fn required_side_refs(&self) -> Vec<&str> {
        self.required_sides.iter().map(String::as_str).collect()
    }
}

impl PressureConfig {
    pub const fn band(&self) -> StandardBand {
        StandardBand::new(self.standard_min, self.standard_max)
    }
}

impl SeverityConfig {
    pub const fn cutoffs(&self) -> SeverityCutoffs {
        SeverityCutoffs::new(self.minor_cutoff, self.major_cutoff)
    }
}

impl WindowConfig {
    /// Upper bound on `default_hours`: one year.
    pub const MAX_DEFAULT_HOURS: i64 = 24 * 365;

    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    /// Length of the trailing window used when a range bound is omitted.
    pub fn default_length(&self) -> Result<Duration> {
        Duration::try_hours(self.default_hours)
            .filter(|_| (1..=Self::MAX_DEFAULT_HOURS).contains(&self.default_hours))
            .ok_or_else(|| PinError::InvalidConfig {
                details: format!(
                    "window.default_hours must be in 1..={}, got {}",
                    Self::MAX_DEFAULT_HOURS,
                    self.default_hours
                ),
            })
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    /// [`Config::load`] with an explicit environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| PinError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(PinError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the run log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;
        let digest = serde_json::to_string(self)?
            .bytes()
            .fold(OFFSET_BASIS, |acc, byte| (acc ^ u64::from(byte)).wrapping_mul(PRIME));
        Ok(format!("{digest:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut raw_lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut lookup = |name: &str| raw_lookup(name).filter(|raw| !raw.trim().is_empty());

        set_from(
            &mut lookup,
            "PIN_UPTIME_DOWNTIME_THRESHOLD_SECS",
            &mut self.uptime.downtime_threshold_secs,
        )?;
        set_from(&mut lookup, "PIN_CYCLES_BUCKET_SECS", &mut self.cycles.bucket_secs)?;

        set_from(
            &mut lookup,
            "PIN_PRESSURE_STANDARD_MIN",
            &mut self.pressure.standard_min,
        )?;
        set_from(
            &mut lookup,
            "PIN_PRESSURE_STANDARD_MAX",
            &mut self.pressure.standard_max,
        )?;
        set_from(
            &mut lookup,
            "PIN_PRESSURE_CURRENT_READING",
            &mut self.pressure.current_reading,
        )?;

        set_from(
            &mut lookup,
            "PIN_SEVERITY_MINOR_CUTOFF",
            &mut self.severity.minor_cutoff,
        )?;
        set_from(
            &mut lookup,
            "PIN_SEVERITY_MAJOR_CUTOFF",
            &mut self.severity.major_cutoff,
        )?;

        if let Some(raw) = lookup("PIN_WINDOW_UTC_OFFSET") {
            self.window.utc_offset = raw.trim().to_string();
        }
        set_from(
            &mut lookup,
            "PIN_WINDOW_DEFAULT_HOURS",
            &mut self.window.default_hours,
        )?;

        set_from(&mut lookup, "PIN_LOGGING_ENABLED", &mut self.logging.enabled)?;
        if let Some(raw) = lookup("PIN_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Trim side labels so `" L"` in a hand-edited file still pairs.
    fn normalize(&mut self) {
        for side in &mut self.cycles.required_sides {
            *side = side.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.uptime.downtime_threshold_secs <= 0 {
            return Err(PinError::InvalidConfig {
                details: format!(
                    "uptime.downtime_threshold_secs must be > 0, got {}",
                    self.uptime.downtime_threshold_secs
                ),
            });
        }

        if self.cycles.bucket_secs <= 0 {
            return Err(PinError::InvalidConfig {
                details: format!(
                    "cycles.bucket_secs must be > 0, got {}",
                    self.cycles.bucket_secs
                ),
            });
        }
        if self.cycles.required_sides.is_empty() {
            return Err(PinError::InvalidConfig {
                details: "cycles.required_sides must not be empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for side in &self.cycles.required_sides {
            if side.is_empty() || side.contains('|') {
                return Err(PinError::InvalidConfig {
                    details: format!("cycles.required_sides entry {side:?} is not a side label"),
                });
            }
            if !seen.insert(side) {
                return Err(PinError::InvalidConfig {
                    details: format!("cycles.required_sides lists {side:?} twice"),
                });
            }
        }

        let p = &self.pressure;
        if !(p.standard_min.is_finite() && p.standard_max.is_finite())
            || p.standard_min >= p.standard_max
        {
            return Err(PinError::InvalidConfig {
                details: format!(
                    "pressure.standard_min ({}) must be below pressure.standard_max ({})",
                    p.standard_min, p.standard_max
                ),
            });
        }

        let s = &self.severity;
        if !(s.minor_cutoff.is_finite() && s.major_cutoff.is_finite())
            || s.minor_cutoff < 0.0
            || s.minor_cutoff >= s.major_cutoff
        {
            return Err(PinError::InvalidConfig {
                details: format!(
                    "severity cutoffs must satisfy 0 <= minor_cutoff < major_cutoff, got {} / {}",
                    s.minor_cutoff, s.major_cutoff
                ),
            });
        }

        if self.zones.targets.is_empty() {
            return Err(PinError::InvalidConfig {
                details: "zones.targets must not be empty".to_string(),
            });
        }
        if let Some(bad) = self.zones.targets.iter().find(|t| !t.is_finite()) {
            return Err(PinError::InvalidConfig {
                details: format!("zones.targets must be finite, got {bad}"),
            });
        }

        self.window.offset()?;
        self.window.default_length()?;

        if self.logging.max_size_bytes == 0 {
            return Err(PinError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || PinError::InvalidConfig {
        details: format!("window.utc_offset {raw:?} must look like +07:00"),
    };
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw == "UTC" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_from<F, T>(lookup: &mut F, name: &str, slot: &mut T) -> Result<()>
where
    F: FnMut(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| PinError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
