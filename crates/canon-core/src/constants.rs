/// Canon system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version stamped on a freshly created master record.
pub const INITIAL_MASTER_VERSION: &str = "1.0.0";

/// Prefix of deterministic master record ids.
pub const MASTER_ID_PREFIX: &str = "mr_";

/// Hex characters of the blake3 digest kept in generated ids.
pub const ID_HASH_LEN: usize = 16;

/// Actor recorded on conflict resolutions produced by the merger.
pub const SYSTEM_RESOLVER: &str = "system";

/// Actor recorded on conflict resolutions produced by `update`.
pub const MANUAL_RESOLVER: &str = "manual-update";

/// Source id used for manual edits in `consolidated_from`.
pub const MANUAL_SOURCE_ID: &str = "manual";
