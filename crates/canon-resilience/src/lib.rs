//! # canon-resilience
//!
//! The only path from Canon to an external source. [`SafeOperation::run`]
//! never fails: it probes readiness, races each attempt against a timeout,
//! retries with exponential backoff, and hands back the caller's fallback once
//! retries are exhausted.

pub mod backoff;
pub mod safe_operation;
pub mod stats;

pub use safe_operation::SafeOperation;
pub use stats::OperationStats;
pub use tokio_util::sync::CancellationToken;
