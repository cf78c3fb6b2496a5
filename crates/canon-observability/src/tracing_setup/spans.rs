//! Span definitions per operation: consolidation pass, source load, learning.

/// Span around one consolidation pass.
#[macro_export]
macro_rules! consolidation_span {
    ($subject:expr, $operation_id:expr) => {
        tracing::info_span!(
            "canon.consolidation",
            subject = %$subject,
            operation_id = %$operation_id
        )
    };
}

/// Span around one source load.
#[macro_export]
macro_rules! load_span {
    ($source:expr) => {
        tracing::info_span!("canon.load", source = %$source)
    };
}

/// Span around a learning update.
#[macro_export]
macro_rules! learning_span {
    ($unit:expr) => {
        tracing::info_span!("canon.learning", unit = %$unit)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const CONSOLIDATION: &str = "canon.consolidation";
    pub const LOAD: &str = "canon.load";
    pub const LEARNING: &str = "canon.learning";
}
