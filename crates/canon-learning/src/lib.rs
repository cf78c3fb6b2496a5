//! # canon-learning
//!
//! Learns which past behaviours were effective. [`classify_trend`] compares
//! the two halves of a quality series, [`PatternStore`] keeps running-average
//! scores per normalized pattern text, and [`EffectivenessTracker`] turns a
//! completed unit of work into an append-only
//! [`LongTermEffectivenessRecord`](canon_core::effectiveness::LongTermEffectivenessRecord).

pub mod patterns;
pub mod tracker;
pub mod trend;

pub use patterns::{Observation, PatternStore};
pub use tracker::{EffectivenessTracker, PassOutcome, ProblemSolution, ScoredText, UnitOfWork};
pub use trend::classify_trend;
