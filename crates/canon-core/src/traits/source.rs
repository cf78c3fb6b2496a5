use async_trait::async_trait;

use crate::errors::CanonResult;

/// Cheap, non-suspending status probe.
pub trait IReadiness: Send + Sync {
    /// Name used in logs and failure counters.
    fn name(&self) -> &str;
    /// Whether calls are worth attempting right now.
    fn is_ready(&self) -> bool;
}

/// The fast, in-process authoritative source.
///
/// Payloads are untyped; loaders validate them into candidates.
#[async_trait]
pub trait IAuthoritativeSource: IReadiness {
    async fn get_all(&self) -> CanonResult<Vec<serde_json::Value>>;
    async fn get_by_id(&self, id: &str) -> CanonResult<Option<serde_json::Value>>;
}
