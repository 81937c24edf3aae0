//! Built-in compilation passes.

pub mod dd;

pub use dd::{DdConfig, DdFamily, DdSummary, DynamicalDecoupling};
