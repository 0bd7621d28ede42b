//! Fee Tracker (spec §4.12): per-broker fee schedules and expense
//! analytics over recorded trade fees. Grounded on
//! `examples/original_source/src/fees/fee_tracker.py`.

pub mod structures;
pub mod tracker;

pub use structures::{broker_fee_structures, FeeStructure, FeeType};
pub use tracker::{FeeReport, FeeTracker, TradeFee};
