mod conflict;
mod extensions;
pub mod identity;
mod master;
mod source;
pub mod version;

pub use conflict::{ConflictResolution, ResolutionMethod};
pub use extensions::{EntityState, HistoryEntry, Personality, RecordExtensions, RecordStatistics};
pub use identity::{master_id_for, normalize_identity};
pub use master::{DeclaredRelationship, EntityKind, MasterRecord, RecordPatch};
pub use source::{ConsolidationSource, SourceKind};
