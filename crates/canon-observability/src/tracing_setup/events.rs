//! Structured log events for key operations.

use std::error::Error;

/// The single entry point for logging a caught error.
///
/// Emits an `error!` event carrying the error, its `source()` chain, and the
/// given key/value context.
pub fn log_error(err: &dyn Error, context: &[(&str, &str)], message: &str) {
    let chain = error_chain(err);
    let context: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
    tracing::error!(
        error = %err,
        chain = ?chain,
        context = ?context,
        "{message}"
    );
}

/// Messages of `err`'s sources, outermost first, excluding `err` itself.
pub fn error_chain(err: &dyn Error) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(e) = current {
        chain.push(e.to_string());
        current = e.source();
    }
    chain
}

pub fn source_unavailable(source: &str, reason: &str) {
    tracing::warn!(
        event = "source_unavailable",
        source = %source,
        reason = %reason,
        "source unavailable, contributing no candidates"
    );
}

pub fn payload_rejected(source: &str, source_id: &str, reason: &str) {
    tracing::debug!(
        event = "payload_rejected",
        source = %source,
        source_id = %source_id,
        reason = %reason,
        "payload rejected"
    );
}

pub fn consolidation_completed(subject: &str, records: usize, conflicts: usize, persisted: bool) {
    tracing::info!(
        event = "consolidation_completed",
        subject = %subject,
        records,
        conflicts,
        persisted,
        "consolidation completed"
    );
}

pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_core::errors::{CanonError, StorageError};

    #[test]
    fn chain_walks_sources() {
        let err: CanonError = StorageError::NotFound {
            path: "a.json".to_string(),
        }
        .into();
        assert_eq!(error_chain(&err), vec!["a.json not found".to_string()]);
        log_error(&err, &[("path", "a.json")], "load failed");
    }
}
