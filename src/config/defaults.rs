//! Default configuration values

/// Maximum attempts for the post-export round-trip verification
pub const MAX_EXPORT_VERIFY_ATTEMPTS: u32 = 3;

/// Base delay for export-verification backoff (in milliseconds)
pub const EXPORT_VERIFY_BASE_DELAY_MS: u64 = 1000;

/// Retention policy: successful build records kept per component
pub const RECORD_RETENTION: usize = 5;

/// Manifest file name
pub const MANIFEST_FILE: &str = "buildwright.toml";

/// State store file name inside the project directory
pub const STATE_FILE: &str = "buildwright-state.json";

/// Tail length of the build log attached to execution failures
pub const LOG_TAIL_BYTES: usize = 2048;
