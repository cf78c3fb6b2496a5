//! # canon-consolidation
//!
//! Builds one master record per named entity from a primary source and a
//! secondary store. Each pass is serialized by the guard, reads sources
//! through [`canon_resilience::SafeOperation`], resolves field conflicts by
//! source priority, enriches, indexes, and persists best-effort.
//!
//! ```text
//! consolidate(subject)
//!   └─ guard.enter ─▶ loaders ─▶ merge/resolve ─▶ enrich ─▶ index ─▶ persist ─▶ learn
//! ```

pub mod engine;
pub mod enrichment;
pub mod index;
pub mod loaders;
pub mod merge;

pub use engine::{
    ConsolidationEngine, ConsolidationOutcome, Diagnosis, EngineStatus, InitReport, PassReport,
    RelatedRecord, SourceSummary,
};
pub use enrichment::HeuristicEnricher;
pub use index::{RecordIndex, RelatedEdge};
pub use loaders::{DurableLoader, ISourceLoader, LoadedSource, PrimaryLoader};
pub use merge::{ConflictResolver, MergeReport, Merger};
