/// Errors from the exposed record API.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("master record {id} not found")]
    NotFound { id: String },

    #[error("invalid patch: {reason}")]
    InvalidPatch { reason: String },

    #[error("invalid master version {version:?}")]
    InvalidVersion { version: String },
}
