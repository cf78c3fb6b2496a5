//! Degradation tracking: sources that went dark, snapshots that failed to
//! persist, enrichment that fell back to defaults.

pub mod tracker;

pub use tracker::{DegradationEvent, DegradationKind, DegradationTracker, RecoveryStatus};
