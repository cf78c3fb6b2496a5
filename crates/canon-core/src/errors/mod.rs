//! Error taxonomy. One enum per subsystem, aggregated by [`CanonError`].

mod enrichment_error;
mod guard_error;
mod record_error;
mod source_error;
mod storage_error;

pub use enrichment_error::EnrichmentError;
pub use guard_error::GuardError;
pub use record_error::RecordError;
pub use source_error::SourceError;
pub use storage_error::StorageError;

/// Top-level error for every fallible Canon operation.
#[derive(Debug, thiserror::Error)]
pub enum CanonError {
    #[error("source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("enrichment error: {0}")]
    EnrichmentError(#[from] EnrichmentError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("guard error: {0}")]
    GuardError(#[from] GuardError),

    #[error("record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CanonError {
    /// Short machine-friendly label, used as the `kind` field in error logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceError(_) => "source",
            Self::EnrichmentError(_) => "enrichment",
            Self::StorageError(_) => "storage",
            Self::GuardError(_) => "guard",
            Self::RecordError(_) => "record",
            Self::ConfigError { .. } => "config",
            Self::SerializationError(_) => "serialization",
        }
    }
}

/// Convenience alias used across the workspace.
pub type CanonResult<T> = Result<T, CanonError>;
