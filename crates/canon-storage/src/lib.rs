//! # canon-storage
//!
//! [`FileStore`] implements the durable key-value store over a directory,
//! writing every file whole (temp file + rename). [`InMemoryStore`] is the
//! same contract without a disk, for tests and embedded use.
//! [`PersistenceLayer`] reads and writes the JSON snapshots Canon keeps in
//! either store.

pub mod file_store;
pub mod memory_store;
pub mod paths;
pub mod persistence;

pub use file_store::FileStore;
pub use memory_store::InMemoryStore;
pub use persistence::PersistenceLayer;
