/// Consolidation guard errors.
///
/// A blocked start is reported through this type only when the caller asked
/// for a hard `start`; `can_start` reports the same condition as a decision.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("consolidation for {key} blocked: {reason}")]
    Blocked { key: String, reason: String },

    #[error("release of {operation_id} ignored: not the running operation")]
    StaleRelease { operation_id: String },
}
