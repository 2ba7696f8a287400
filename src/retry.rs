//! Retry policy for upstream page requests
//!
//! Backoff parameters live in a plain value passed to the pager rather than
//! in control flow, so tests can inject a zero-delay policy and production
//! can tune attempts without touching the pagination logic.

use std::time::Duration;

/// Server-provided rate-limit hints are clamped to this bound before use.
const MAX_HINT_SECS: u64 = 3600;

/// Retry/backoff configuration for one page request.
///
/// The computed delay grows exponentially from `base_delay`, is capped at
/// `max_delay`, and gets uniform jitter of `jitter_pct` percent applied in
/// both directions. A rate-limit reset hint from the server overrides the
/// computed delay for that attempt (still jittered, still clamped to a
/// sane upper bound).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per page, including the initial one. Invariant: >= 1
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Cap for the computed exponential delay.
    pub max_delay: Duration,

    /// Jitter as a percentage of the delay (0-100).
    pub jitter_pct: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_pct: 20,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_pct: 0,
        }
    }

    /// A policy with the given attempt count and no waiting, for tests.
    pub const fn zero_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_pct: 0,
        }
    }

    /// The default policy with a different attempt cap.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Computes the delay before retrying after a failed `attempt` (1-based).
    ///
    /// `server_hint` is a reset-time hint from a rate-limit response; when
    /// present it takes precedence over the computed backoff.
    pub fn delay_for(
        &self,
        attempt: u32,
        server_hint: Option<Duration>,
        rng: &mut XorShift64,
    ) -> Duration {
        let delay = match server_hint {
            Some(hint) => hint.min(Duration::from_secs(MAX_HINT_SECS)),
            None => {
                // base * 2^(attempt-1), saturating, capped at max_delay
                let exp = attempt.saturating_sub(1).min(30);
                self.base_delay
                    .saturating_mul(1u32 << exp)
                    .min(self.max_delay)
            }
        };

        self.apply_jitter(delay, rng.next_u64())
    }

    /// Uniform jitter in `[delay - jitter%, delay + jitter%]`.
    fn apply_jitter(&self, delay: Duration, rng_u64: u64) -> Duration {
        let jitter_pct = self.jitter_pct.min(100) as u64;
        if jitter_pct == 0 || delay.is_zero() {
            return delay;
        }

        let delay_ns = delay.as_nanos() as u64;
        let jitter_ns = delay_ns.saturating_mul(jitter_pct) / 100;
        if jitter_ns == 0 {
            return delay;
        }

        let span = jitter_ns.saturating_mul(2);
        let r = rng_u64 % (span.saturating_add(1));

        if r < jitter_ns {
            Duration::from_nanos(delay_ns.saturating_sub(jitter_ns - r))
        } else {
            Duration::from_nanos(delay_ns.saturating_add(r - jitter_ns))
        }
    }
}

/// Small deterministic generator for retry jitter.
///
/// Scheduling jitter does not need cryptographic randomness; a xorshift
/// keeps the crate free of an RNG dependency and makes jittered delays
/// reproducible under a fixed seed in tests.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Seed 0 is mapped to a fixed non-zero value to avoid the lockup state.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state: seed }
    }

    /// Seeds from the system clock.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}
