//! Size and timing limits for the ingest gateway.
//!
//! MEMORY SAFETY: body limits are checked before any parsing so an oversized
//! submission never gets buffered into a JSON tree.
//!
//! These are defaults. Every value can be overridden through configuration.

// === Body Limits ===

/// Maximum error submission size in bytes (25MB).
///
/// Error events may carry full stack traces with source snippets.
pub const MAX_ERROR_MESSAGE_BYTES: usize = 25_000_000;

/// Maximum performance submission size in bytes (25MB).
pub const MAX_PERFORMANCE_MESSAGE_BYTES: usize = 25_000_000;

/// Maximum release submission size in bytes (250MB).
///
/// Releases carry sourcemap files as multipart parts.
pub const MAX_RELEASE_MESSAGE_BYTES: usize = 250_000_000;

// === WebSocket ===

/// Idle read deadline for a WebSocket connection (seconds).
///
/// Refreshed on every inbound frame, including pongs.
pub const WS_IDLE_TIMEOUT_SECS: u64 = 60;

/// Keep-alive ping period (seconds). Must stay below the idle deadline.
pub const WS_PING_PERIOD_SECS: u64 = 54;

// === Abuse Detection ===

/// Requests per evaluation period after which an address is blacklisted.
pub const DEFAULT_BLACKLIST_THRESHOLD: u64 = 10_000;

// === Startup ===

/// Initial delay for warm-up retries (seconds).
pub const WARMUP_INITIAL_BACKOFF_SECS: u64 = 1;

/// Upper bound for a single warm-up retry delay (seconds).
pub const WARMUP_MAX_BACKOFF_SECS: u64 = 30;

/// Give up warming up after this long (seconds).
pub const WARMUP_MAX_ELAPSED_SECS: u64 = 180;
