//! JSONL ingestion: one JSON object per line.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::errors::{PinError, Result};
use crate::records::record::TimestampedRecord;

/// Parse JSONL content. Blank lines and lines starting with `#` are skipped;
/// line numbers in errors are 1-based.
pub fn parse_jsonl<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| PinError::RecordParse {
                line: idx + 1,
                details: e.to_string(),
            })
        })
        .collect()
}

/// Read and parse a JSONL file.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|e| PinError::io(path, e))?;
    parse_jsonl(&content)
}

/// Load sensor records, sorted by timestamp (stable for equal instants).
pub fn load_records(path: &Path) -> Result<Vec<TimestampedRecord>> {
    let mut records: Vec<TimestampedRecord> = read_jsonl(path)?;
    records.sort_by_key(|record| record.timestamp);
    Ok(records)
}

/// Write items as JSONL.
pub fn write_jsonl<T: Serialize, W: Write>(mut out: W, items: &[T]) -> Result<()> {
    for item in items {
        let line = serde_json::to_string(item)?;
        writeln!(out, "{line}").map_err(|e| PinError::io("<output>", e))?;
    }
    out.flush().map_err(|e| PinError::io("<output>", e))
}

/// Records without a usable waveform: undecodable payloads and scalars.
pub fn count_malformed<'a>(records: impl IntoIterator<Item = &'a TimestampedRecord>) -> usize {
    records
        .into_iter()
        .filter(|record| !record.payload.waveform().is_valid())
        .count()
}
