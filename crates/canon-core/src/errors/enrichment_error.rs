/// Per-record enrichment failures. Never abort a pass.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("text of {len} chars exceeds enrichment limit {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("enrichment failed: {reason}")]
    Failed { reason: String },
}
