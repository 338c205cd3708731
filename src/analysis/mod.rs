//! Aggregation helpers.
//!
//! Group, count and cross-tabulate primitives used by every view.

pub mod aggregator;

pub use aggregator::*;
