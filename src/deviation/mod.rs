//! Deviation classification and zone variance reporting.

pub mod classifier;
pub mod zones;
