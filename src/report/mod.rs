//! Report assembly and chart-ready output shapes.

pub mod assembler;
pub mod chart;
