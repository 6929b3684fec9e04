//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default signing secret.
pub const SECRET: &str = "secret";

/// Default per-request timeout in seconds.
pub const TIMEOUT_SECS: u64 = 10;

/// Default root directory for extracted media.
pub const MEDIA_PATH: &str = "statics/media";

/// Default output path of `init`.
pub const CONFIG_FILE: &str = "wa-relay.toml";

/// Default maximum number of delivery attempts.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default initial retry delay in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = 1;

/// Default maximum retry delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 60;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Upper bound for any retry delay in seconds (one day).
pub const RETRY_DELAY_LIMIT_SECS: u64 = 86_400;

/// Default number of events forwarded concurrently.
pub const MAX_IN_FLIGHT: usize = 32;

/// Default per-request timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_secs(RETRY_INITIAL_DELAY_SECS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_secs(RETRY_MAX_DELAY_SECS)
}
