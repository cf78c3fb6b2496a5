//! Health inputs and actionable recommendations.

pub mod recommendations;

pub use recommendations::{generate as generate_recommendations, DiagnosisSnapshot, Recommendation, Severity};
