//! Version calculation: increment decisions, pre-release formatting and
//! final assembly

pub mod next_version;

pub use next_version::{NextVersionCalculator, VersionCalculation};
