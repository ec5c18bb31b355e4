//! Append-only JSONL run log with graceful degradation.

pub mod jsonl;
