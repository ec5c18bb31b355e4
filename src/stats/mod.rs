//! Statistics shared across reports.

pub mod kit;
