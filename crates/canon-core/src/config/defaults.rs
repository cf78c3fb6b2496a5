//! Default values for every configuration key.

// Guard
pub const DEFAULT_DUPLICATE_WINDOW_MS: u64 = 500;
pub const DEFAULT_STUCK_CEILING_MS: u64 = 30_000;
pub const DEFAULT_ATTEMPT_HISTORY_PER_KEY: usize = 8;
pub const DEFAULT_MAX_QUEUE_LEN: usize = 64;

// Resilience
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

// Sources
pub const DEFAULT_PRIMARY_PRIORITY: i32 = 100;
pub const DEFAULT_PRIMARY_RELIABILITY: i32 = 90;
pub const DEFAULT_SECONDARY_PRIORITY: i32 = 50;
pub const DEFAULT_SECONDARY_RELIABILITY: i32 = 70;
pub const DEFAULT_MANUAL_PRIORITY: i32 = 150;
pub const DEFAULT_MANUAL_RELIABILITY: i32 = 100;
pub const DEFAULT_ENTITIES_DIR: &str = "entities";

// Consolidation
pub const DEFAULT_MAX_KEYWORDS: usize = 8;
pub const DEFAULT_MAX_HISTORY_ENTRIES: usize = 50;
pub const DEFAULT_MAX_ENRICHMENT_CHARS: usize = 20_000;

// Storage
pub const DEFAULT_STORAGE_ROOT: &str = "data";
pub const DEFAULT_RECORDS_PATH: &str = "consolidation/v1/master-records.json";
pub const DEFAULT_PATTERNS_PATH: &str = "learning/v1/patterns.json";
pub const DEFAULT_EFFECTIVENESS_PATH: &str = "learning/v1/effectiveness-records.json";

// Learning
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.5;
pub const DEFAULT_SCORE_SCALE: f64 = 10.0;
pub const DEFAULT_MAX_CASES_PER_PATTERN: usize = 20;
pub const DEFAULT_LOW_EFFECTIVENESS: f64 = 0.5;
pub const DEFAULT_HIGH_EFFECTIVENESS: f64 = 0.8;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
