//! Seams to the outside world: sources, the durable store, and enrichment.

mod enricher;
mod source;
mod store;

pub use enricher::IEnricher;
pub use source::{IAuthoritativeSource, IReadiness};
pub use store::IDurableStore;
