//! Analysis modules.
//!
//! Aggregation of dataset records into the age/sex report.

pub mod aggregator;

pub use aggregator::*;
