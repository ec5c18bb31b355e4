//! Press cycle pairing and reading-level compliance.

pub mod pairing;
