//! Retry policy for webhook deliveries.

use std::time::Duration;

/// Exponential backoff configuration for one delivery.
///
/// `max_attempts` counts the initial attempt. Between consecutive attempts
/// the client waits `initial_delay * multiplier^n`, capped at `max_delay`,
/// so the defaults produce five attempts separated by 1s, 2s, 4s and 8s.
///
/// # Example
///
/// ```
/// use wa_relay::webhook::RetryPolicy;
/// use std::time::Duration;
///
/// let delays: Vec<Duration> = RetryPolicy::default().backoff().collect();
/// assert_eq!(delays, [1, 2, 4, 8].map(Duration::from_secs));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

    /// Default maximum delay (60 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between attempts.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Computes the delay before retry number `retry` (0 = first retry).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        // Retry counts are tiny, the cast cannot wrap in practice
        #[allow(clippy::cast_possible_wrap)]
        let factor = self.multiplier.powi(retry as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * factor;
        // Near u64::MAX seconds the f64 rounds past what Duration can hold
        Duration::try_from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
            .unwrap_or(self.max_delay)
    }

    /// Returns the delays slept between attempts, in order.
    ///
    /// Yields `max_attempts - 1` values: there is no delay after the last attempt.
    #[must_use]
    pub const fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            next_retry: 0,
        }
    }

    /// Total time spent sleeping if every attempt fails.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        self.backoff().fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the inter-attempt delays of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    next_retry: u32,
}

impl Iterator for Backoff<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.next_retry + 1 >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.delay_for_retry(self.next_retry);
        self.next_retry += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .policy
            .max_attempts
            .saturating_sub(self.next_retry + 1) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Backoff<'_> {}
