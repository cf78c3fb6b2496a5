use crate::errors::EnrichmentError;
use crate::record::{MasterRecord, RecordExtensions};

/// Derives the extension payload of a merged record.
///
/// `record.extensions` holds the previous payload (or the minimal default on
/// creation) so implementations can carry history forward.
pub trait IEnricher: Send + Sync {
    fn enrich(&self, record: &MasterRecord) -> Result<RecordExtensions, EnrichmentError>;
}
