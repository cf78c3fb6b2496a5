//! # canon-observability
//!
//! Tracing subscriber setup with span definitions and structured events,
//! degradation event tracking with recovery status, and actionable health
//! recommendations for `diagnose()`.

pub mod degradation;
pub mod health;
pub mod tracing_setup;

pub use degradation::{DegradationEvent, DegradationKind, DegradationTracker, RecoveryStatus};
pub use health::{generate_recommendations, DiagnosisSnapshot, Recommendation, Severity};
pub use tracing_setup::events::log_error;
pub use tracing_setup::init_tracing;
