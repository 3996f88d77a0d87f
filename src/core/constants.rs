//! Defaults and environment keys.

use std::time::Duration;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overlap policy: `fence` or `last-response-wins`.
pub const ENV_STALE_POLICY: &str = "FEEDSYNC_STALE_POLICY";

/// Per-request timeout in milliseconds (`0` disables).
pub const ENV_REQUEST_TIMEOUT_MS: &str = "FEEDSYNC_REQUEST_TIMEOUT_MS";

/// Log filter used by the demo binary.
pub const ENV_LOG: &str = "FEEDSYNC_LOG";

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default per-request timeout. `None`: delegated to the gateway transport.
pub const DEFAULT_REQUEST_TIMEOUT: Option<Duration> = None;

/// Default simulated latency of the in-memory authority.
pub const DEFAULT_MEMORY_LATENCY: Duration = Duration::ZERO;
