//! # canon-core
//!
//! Foundation crate for the Canon master-record engine.
//! Defines the record data model, source payload schema, effectiveness types,
//! traits for external sources, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod candidate;
pub mod config;
pub mod constants;
pub mod effectiveness;
pub mod errors;
pub mod record;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use candidate::{Candidate, Rejection, SourceRecord};
pub use config::CanonConfig;
pub use errors::{CanonError, CanonResult};
pub use record::{
    ConflictResolution, ConsolidationSource, EntityKind, MasterRecord, ResolutionMethod,
    SourceKind,
};
