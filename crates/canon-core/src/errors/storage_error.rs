/// Durable store and persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("read of {path} failed: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("write of {path} failed: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("{path} not found")]
    NotFound { path: String },

    #[error("corrupt snapshot at {path}: {details}")]
    Corrupt { path: String, details: String },

    #[error("path {path} escapes the store root")]
    InvalidPath { path: String },
}
