/// Errors raised while talking to a candidate source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source {source_name} is not ready")]
    Unavailable { source_name: String },

    #[error("source {source_name} timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("fetch from {source_name} failed: {reason}")]
    FetchFailed { source_name: String, reason: String },

    #[error("invalid payload {source_id}: {reason}")]
    InvalidPayload { source_id: String, reason: String },
}
