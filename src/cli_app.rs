//! Top-level CLI definition and dispatch.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{FixedOffset, Utc};
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use plant_insight::core::config::Config;
use plant_insight::core::errors::PinError;
use plant_insight::deviation::classifier::{BandStatus, SeverityCutoffs};
use plant_insight::deviation::zones::{DeviationStats, ZoneReading, zone_variance};
use plant_insight::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use plant_insight::records::ingest::{load_records, read_jsonl};
use plant_insight::records::record::{SourceKey, Timestamp, filter_by_sources};
use plant_insight::records::window::{Bound, TimeWindow, parse_bound};
use plant_insight::report::assembler::{
    CurrentReading, DashboardParams, LineDashboard, line_dashboard, variance_chart,
};
use plant_insight::simulate::{SimulationParams, simulate, write_simulation};
use plant_insight::uptime::format::format_duration;
use plant_insight::uptime::gaps;
use plant_insight::uptime::transitions::{
    DeviceStatus, StatusLedger, StatusLogEntry, account_by_device, combine, time_in_status,
};

/// Plant insight: uptime, cycle and deviation reports over sensor records.
#[derive(Debug, Parser)]
#[command(
    name = "pins",
    author,
    version,
    about = "Plant Insight - uptime, press cycle and deviation reports",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Line dashboard: uptime split, compliance and per-machine snapshot.
    Report(ReportArgs),
    /// Downtime gaps from activity records, or status-log accounting.
    Uptime(UptimeArgs),
    /// Zone variance against the configured target vector.
    Variance(VarianceArgs),
    /// Generate synthetic press cycle records.
    Simulate(SimulateArgs),
    /// Print the effective configuration.
    Config,
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::Uptime(_) => "uptime",
            Self::Variance(_) => "variance",
            Self::Simulate(_) => "simulate",
            Self::Config => "config",
            Self::Completions(_) => "completions",
        }
    }
}

#[derive(Debug, Clone, Args, Serialize)]
struct RangeArgs {
    /// Window start: RFC 3339, `YYYY-MM-DD HH:MM[:SS]` or a bare date.
    #[arg(long, value_name = "TIME")]
    start: Option<String>,
    /// Window end; a bare date means the end of that day.
    #[arg(long, value_name = "TIME")]
    end: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize)]
struct ReportArgs {
    /// JSONL file of timestamped records.
    #[arg(long, value_name = "FILE")]
    records: PathBuf,
    #[command(flatten)]
    range: RangeArgs,
    /// Restrict to a machine or line key prefix (repeatable).
    #[arg(long = "machine", value_name = "KEY")]
    machines: Vec<String>,
    /// Reduce each channel to its `max` or `median` for the snapshot.
    #[arg(long, value_name = "MODE")]
    current_reading: Option<CurrentReading>,
}

#[derive(Debug, Clone, Args, Serialize)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["records", "status_log"])
))]
struct UptimeArgs {
    /// JSONL file of timestamped records; every record counts as activity.
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,
    /// JSONL device status log (online / offline / timeout entries).
    #[arg(long, value_name = "FILE")]
    status_log: Option<PathBuf>,
    #[command(flatten)]
    range: RangeArgs,
    /// Restrict to a machine or line key prefix (repeatable).
    #[arg(long = "machine", value_name = "KEY")]
    machines: Vec<String>,
}

#[derive(Debug, Clone, Args, Serialize)]
struct VarianceArgs {
    /// JSONL file of zone readings.
    #[arg(long, value_name = "FILE")]
    readings: PathBuf,
    /// `tight` (3/6), `wide` (5/10) or `MINOR,MAJOR`; defaults to the configured pair.
    #[arg(long, value_name = "CUTOFFS", value_parser = parse_cutoffs)]
    #[serde(skip)]
    cutoffs: Option<SeverityCutoffs>,
}

#[derive(Debug, Clone, Args, Serialize)]
struct SimulateArgs {
    /// Records to generate (two per cycle).
    #[arg(long, default_value_t = 200, value_name = "N")]
    count: usize,
    /// Line key prefix for generated source keys.
    #[arg(long, default_value = "G5", value_name = "LINE")]
    line: String,
    /// RNG seed for reproducible output.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// First cycle time; defaults to the configured trailing window start.
    #[arg(long, value_name = "TIME")]
    start: Option<String>,
    /// Output file (stdout when omitted).
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Serialize)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    #[serde(skip)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Failure reported by the analytics library.
    #[error(transparent)]
    Core(#[from] PinError),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Core(err) => match err {
                PinError::Io { .. } => 2,
                PinError::Serialization { .. } => 3,
                _ => 1,
            },
        }
    }
}

/// Run-log handle for one command invocation.
struct RunLog {
    writer: JsonlWriter,
    command: &'static str,
    config_hash: Option<String>,
    started: Instant,
}

impl RunLog {
    fn open(config: &Config, command: &'static str) -> Self {
        let writer = if config.logging.enabled {
            JsonlWriter::open(JsonlConfig::from_config(config))
        } else {
            JsonlWriter::disabled()
        };
        Self {
            writer,
            command,
            config_hash: config.stable_hash().ok(),
            started: Instant::now(),
        }
    }

    fn entry(&self, event: EventType, severity: Severity) -> LogEntry {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let entry = LogEntry::new(event, severity)
            .command(self.command)
            .duration_ms(elapsed);
        match &self.config_hash {
            Some(hash) => entry.config_hash(hash),
            None => entry,
        }
    }

    fn record(&mut self, event: EventType, records: usize, malformed: usize) {
        let entry = self.entry(event, Severity::Info).records(records, malformed);
        self.writer.write_entry(&entry);
        if malformed > 0 {
            let warning = self
                .entry(EventType::MalformedPayload, Severity::Warning)
                .records(records, malformed)
                .details(format!("{malformed} payload(s) read as zero-filled waveforms"));
            self.writer.write_entry(&warning);
        }
    }

    fn failure(&mut self, err: &CliError) {
        let entry = match err {
            CliError::Core(pin) => LogEntry::failure(self.command, pin),
            other => self.entry(EventType::Error, Severity::Critical).details(other.to_string()),
        };
        self.writer.write_entry(&entry);
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    if let Command::Completions(args) = &cli.command {
        let mut command = Cli::command();
        let binary_name = command.get_name().to_string();
        generate(args.shell, &mut command, binary_name, &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let mut log = RunLog::open(&config, cli.command.label());

    let result = match &cli.command {
        Command::Report(args) => run_report(cli, &config, args, &mut log),
        Command::Uptime(args) => run_uptime(cli, &config, args, &mut log),
        Command::Variance(args) => run_variance(cli, &config, args, &mut log),
        Command::Simulate(args) => run_simulate(cli, &config, args, &mut log),
        Command::Config => run_config(cli, &config, &mut log),
        Command::Completions(_) => Ok(()),
    };
    if let Err(err) = &result {
        log.failure(err);
    }
    result
}

// ---------------------------------------------------------------------------
// report
// ---------------------------------------------------------------------------

fn run_report(cli: &Cli, config: &Config, args: &ReportArgs, log: &mut RunLog) -> Result<(), CliError> {
    let window = resolve_window(config, &args.range)?;
    let records = load_records(&args.records)?;

    let mut params = DashboardParams::from_config(config);
    if let Some(mode) = args.current_reading {
        params.current_reading = mode;
    }
    let dashboard = line_dashboard(&records, &window, &args.machines, &params);
    log.record(EventType::ReportGenerated, dashboard.records, dashboard.malformed_payloads);

    match output_mode(cli) {
        OutputMode::Human => print_dashboard(&dashboard),
        OutputMode::Json => {
            let payload = json!({
                "command": "report",
                "source": args.records.to_string_lossy(),
                "dashboard": serde_json::to_value(&dashboard)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_dashboard(dash: &LineDashboard) {
    println!("{}", "Line dashboard".bold());
    println!("  Window:     {}", window_label(&dash.window));
    println!(
        "  Records:    {} ({} malformed)",
        dash.records, dash.malformed_payloads
    );
    println!(
        "  Uptime:     {:.2}% online, {:.2}% offline (down {} over {} gap(s))",
        dash.uptime.split.online,
        dash.uptime.split.offline,
        format_duration(dash.uptime.downtime_secs),
        dash.uptime.gaps.len(),
    );
    println!(
        "  Cycles:     {} ({} complete, {} incomplete); {} normal, {} warning, {} alert",
        dash.pairing.cycles,
        dash.pairing.complete,
        dash.pairing.incomplete,
        dash.cycle_status.normal,
        dash.cycle_status.warning,
        dash.cycle_status.alert,
    );
    println!(
        "  Compliance: {:.2}% standard, {:.2}% out of standard ({} readings)",
        dash.compliance.standard_pct,
        dash.compliance.not_standard_pct,
        dash.compliance.standard + dash.compliance.not_standard,
    );

    if dash.machines.is_empty() {
        println!("\n  No machine data in the selected range.");
        return;
    }

    println!(
        "\n  {:<16} {:<5} {:<16} {:<16} {:>7} {:>5}",
        "MACHINE", "SIDE", "TOE-HEEL", "SIDE", "OUTPUT", "AVG"
    );
    for machine in &dash.machines {
        for (idx, side) in machine.sides.iter().enumerate() {
            let (name, avg) = if idx == 0 {
                (machine.machine.as_str(), format!("{:.0}", machine.average_pressure))
            } else {
                ("", String::new())
            };
            println!(
                "  {:<16} {:<5} {:<16} {:<16} {:>7} {:>5}",
                name,
                side.side,
                reading_cell(side.toe_heel.value, side.toe_heel.status),
                reading_cell(side.side_channel.value, side.side_channel.status),
                side.output,
                avg,
            );
        }
        println!("  {:<16} overall {}", "", paint(machine.overall));
    }

    if !dash.box_plots.is_empty() {
        println!("\n  {:<14} {:>7} {:>7} {:>7} {:>7} {:>7}", "PEAKS", "MIN", "Q1", "MEDIAN", "Q3", "MAX");
        for (key, summary) in &dash.box_plots {
            let [min, q1, median, q3, max] = summary.as_array();
            println!("  {key:<14} {min:>7.2} {q1:>7.2} {median:>7.2} {q3:>7.2} {max:>7.2}");
        }
    }
}

fn reading_cell(value: f64, status: BandStatus) -> String {
    // Pad before painting so escape codes do not skew the column.
    let text = format!("{value:.0} {status}");
    format!("{}{}", paint_text(&text, status), " ".repeat(16_usize.saturating_sub(text.len())))
}

fn paint(status: BandStatus) -> colored::ColoredString {
    paint_text(status.as_str(), status)
}

fn paint_text(text: &str, status: BandStatus) -> colored::ColoredString {
    match status {
        BandStatus::Normal => text.green(),
        BandStatus::Warning => text.yellow(),
        BandStatus::Alert => text.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// uptime
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DeviceUptime {
    device: SourceKey,
    #[serde(flatten)]
    ledger: StatusLedger,
    /// Seconds held online according to the checks inside the window.
    online_held_secs: i64,
}

fn run_uptime(cli: &Cli, config: &Config, args: &UptimeArgs, log: &mut RunLog) -> Result<(), CliError> {
    let window = resolve_window(config, &args.range)?;
    let threshold = config.uptime.downtime_threshold_secs;
    let mut payload = json!({
        "command": "uptime",
        "window": window,
        "threshold_secs": threshold,
    });
    let mut considered = 0;

    let activity = match &args.records {
        Some(path) => {
            let records = load_records(path)?;
            let mut stamps: Vec<Timestamp> = filter_by_sources(&records, &args.machines)
                .map(|record| record.timestamp)
                .filter(|ts| window.contains(*ts))
                .collect();
            stamps.sort_unstable();
            considered += stamps.len();
            let summary = gaps::summarize(&stamps, &window, threshold);
            payload["activity"] = serde_json::to_value(&summary)?;
            Some(summary)
        }
        None => None,
    };

    let devices = match &args.status_log {
        Some(path) => {
            let mut entries: Vec<StatusLogEntry> = read_jsonl(path)?;
            entries.retain(|entry| {
                window.contains(entry.logged_at)
                    && (args.machines.is_empty() || args.machines.iter().any(|m| entry.source_key.matches(m)))
            });
            entries.sort_by_key(|entry| entry.logged_at);
            considered += entries.len();
            let as_of = now_in(window.end().timezone()).min(window.end());
            let devices: Vec<DeviceUptime> = account_by_device(&entries, as_of)
                .into_iter()
                .map(|(device, ledger)| {
                    let checks: Vec<StatusLogEntry> = entries
                        .iter()
                        .filter(|entry| entry.source_key == device)
                        .cloned()
                        .collect();
                    let online_held_secs = time_in_status(&checks, DeviceStatus::Online, &window, as_of);
                    DeviceUptime {
                        device,
                        ledger,
                        online_held_secs,
                    }
                })
                .collect();
            let totals = combine(devices.iter().map(|d| &d.ledger));
            payload["devices"] = serde_json::to_value(&devices)?;
            payload["totals"] = serde_json::to_value(&totals)?;
            Some((devices, totals))
        }
        None => None,
    };

    log.record(EventType::ReportGenerated, considered, 0);

    match output_mode(cli) {
        OutputMode::Json => write_json_line(&payload)?,
        OutputMode::Human => {
            println!("{}", "Uptime".bold());
            println!("  Window:    {}", window_label(&window));
            println!("  Threshold: {}", format_duration(threshold));
            if let Some(summary) = &activity {
                println!(
                    "  Activity:  {:.2}% online, {:.2}% offline (down {})",
                    summary.split.online,
                    summary.split.offline,
                    format_duration(summary.downtime_secs),
                );
                for gap in &summary.gaps {
                    println!(
                        "    {} -> {}  {}",
                        gap.from.format("%Y-%m-%d %H:%M:%S"),
                        gap.to.format("%Y-%m-%d %H:%M:%S"),
                        format_duration(gap.duration_secs).red(),
                    );
                }
            }
            if let Some((devices, totals)) = &devices {
                println!(
                    "  Devices:   {:.2}% online, {:.2}% offline, {:.2}% timeout",
                    totals.online_percentage, totals.offline_percentage, totals.timeout_percentage,
                );
                for device in devices {
                    let current = device
                        .ledger
                        .current_status
                        .map_or_else(|| "-".to_string(), |s| s.to_string());
                    println!(
                        "    {:<16} {:>7.2}%  current {:<8} longest down {}",
                        device.device.as_str(),
                        device.ledger.uptime_percentage,
                        current,
                        format_duration(device.ledger.longest_downtime_secs),
                    );
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// variance
// ---------------------------------------------------------------------------

fn run_variance(cli: &Cli, config: &Config, args: &VarianceArgs, log: &mut RunLog) -> Result<(), CliError> {
    let readings: Vec<ZoneReading> = read_jsonl(&args.readings)?;
    let cutoffs = args.cutoffs.unwrap_or_else(|| config.severity.cutoffs());
    let report = zone_variance(&readings, &config.zones.targets, cutoffs);
    log.record(EventType::ReportGenerated, report.readings, 0);

    match output_mode(cli) {
        OutputMode::Json => {
            let payload = json!({
                "command": "variance",
                "source": args.readings.to_string_lossy(),
                "report": serde_json::to_value(&report)?,
                "chart": serde_json::to_value(variance_chart(&report))?,
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            println!("{}", "Zone variance".bold());
            println!(
                "  Readings: {}  cutoffs: minor <= {}, major <= {}",
                report.readings, cutoffs.minor, cutoffs.major
            );
            let Some(overall) = &report.overall else {
                println!("  No zone values in input.");
                return Ok(());
            };
            println!("\n  {:<8} {:>7} {}", "ZONE", "TARGET", stats_header());
            for zone in &report.zones {
                println!("  {:<8} {:>7.1} {}", zone.zone, zone.target, stats_row(&zone.stats));
            }
            for group in &report.groups {
                println!("  {:<8} {:>7} {}", format!("line {}", group.group), "", stats_row(&group.stats));
            }
            println!("  {:<8} {:>7} {}", "overall", "", stats_row(overall));
        }
    }
    Ok(())
}

fn stats_header() -> String {
    format!(
        "{:>6} {:>8} {:>8} {:>7} {:>7} {:>7} {:>7}  {}",
        "N", "AVG", "DEV", "STD", "MINOR%", "MAJOR%", "CRIT%", "CLASS"
    )
}

fn stats_row(stats: &DeviationStats) -> String {
    format!(
        "{:>6} {:>8.2} {:>8.2} {:>7.2} {:>7.1} {:>7.1} {:>7.1}  {}",
        stats.count,
        stats.avg_actual,
        stats.avg_deviation,
        stats.std_deviation,
        stats.minor_pct,
        stats.major_pct,
        stats.critical_pct,
        stats.severity_class,
    )
}

fn parse_cutoffs(raw: &str) -> Result<SeverityCutoffs, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "tight" => return Ok(SeverityCutoffs::STC_TIGHT),
        "wide" => return Ok(SeverityCutoffs::STC_WIDE),
        _ => {}
    }
    let (minor, major) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected tight, wide or MINOR,MAJOR, got {raw:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid cutoff {part:?}: {e}"))
    };
    let (minor, major) = (parse(minor)?, parse(major)?);
    if !(minor >= 0.0 && minor < major) {
        return Err(format!("cutoffs must satisfy 0 <= minor < major, got {minor},{major}"));
    }
    Ok(SeverityCutoffs::new(minor, major))
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

fn run_simulate(cli: &Cli, config: &Config, args: &SimulateArgs, log: &mut RunLog) -> Result<(), CliError> {
    if args.line.trim().is_empty() || args.line.contains(SourceKey::SEPARATOR) {
        return Err(CliError::User(format!(
            "line must be non-empty and must not contain '{}'",
            SourceKey::SEPARATOR
        )));
    }
    let offset = config.window.offset()?;
    let start = match &args.start {
        Some(raw) => parse_bound(raw, Bound::Start, offset)?,
        None => {
            let now = now_in(offset);
            now.checked_sub_signed(config.window.default_length()?)
                .ok_or_else(|| CliError::Internal(format!("default start before {now} is out of range")))?
        }
    };
    let mut params = SimulationParams::new(args.count, args.line.trim(), start);
    params.seed = args.seed;
    let records = simulate(&params);

    match &args.out {
        Some(path) => {
            let file = File::create(path).map_err(|source| PinError::io(path, source))?;
            write_simulation(BufWriter::new(file), &records)?;
        }
        None => write_simulation(io::stdout().lock(), &records)?,
    }

    let entry_details = args
        .out
        .as_deref()
        .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    let entry = log
        .entry(EventType::SimulationWritten, Severity::Info)
        .records(records.len(), 0)
        .details(entry_details);
    log.writer.write_entry(&entry);

    if let Some(path) = &args.out {
        report_written(cli, path, records.len())?;
    }
    Ok(())
}

fn report_written(cli: &Cli, path: &Path, count: usize) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => println!("Wrote {count} records to {}", path.display()),
        OutputMode::Json => write_json_line(&json!({
            "command": "simulate",
            "path": path.to_string_lossy(),
            "records": count,
        }))?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, config: &Config, log: &mut RunLog) -> Result<(), CliError> {
    let path = config.paths.config_file.clone();
    let hash = config.stable_hash()?;
    let entry = log
        .entry(EventType::ConfigLoaded, Severity::Info)
        .details(path.display().to_string());
    log.writer.write_entry(&entry);

    match output_mode(cli) {
        OutputMode::Human => {
            let toml_str = toml::to_string_pretty(config)
                .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
            println!("# source: {}", path.display());
            if !path.exists() {
                println!("# (file does not exist; defaults in use)");
            }
            println!("# hash: {hash}");
            println!("{toml_str}");
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "config",
                "path": path.to_string_lossy(),
                "exists": path.exists(),
                "hash": hash,
                "config": serde_json::to_value(config)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// shared helpers
// ---------------------------------------------------------------------------

fn now_in(offset: FixedOffset) -> Timestamp {
    Utc::now().with_timezone(&offset)
}

/// Window from optional bounds. A missing start trails the end by the
/// configured default length; a missing end is now.
fn resolve_window(config: &Config, range: &RangeArgs) -> Result<TimeWindow, CliError> {
    let offset = config.window.offset()?;
    let length = config.window.default_length()?;
    let window = match (range.start.as_deref(), range.end.as_deref()) {
        (Some(start), Some(end)) => TimeWindow::parse(start, end, offset)?,
        (Some(start), None) => TimeWindow::new(parse_bound(start, Bound::Start, offset)?, now_in(offset))?,
        (None, Some(end)) => TimeWindow::ending_at(parse_bound(end, Bound::End, offset)?, length)?,
        (None, None) => TimeWindow::ending_at(now_in(offset), length)?,
    };
    Ok(window)
}

fn window_label(window: &TimeWindow) -> String {
    format!(
        "{} -> {}",
        window.start().format("%Y-%m-%d %H:%M:%S %:z"),
        window.end().format("%Y-%m-%d %H:%M:%S %:z"),
    )
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("PIN_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
