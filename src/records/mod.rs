//! Input data model: timestamped records, decoded payloads and time windows.

pub mod ingest;
pub mod record;
pub mod waveform;
pub mod window;
