use std::time::Duration;

/// Decides how long to wait before the next connection attempt
///
/// `attempt` is 0 for the first retry after a drop and grows by one for
/// every consecutive failed attempt. A successful handshake resets it.
pub trait ReconnectionStrategy: Send + Sync {
    /// * `Some(duration)` - wait this long, then reconnect
    /// * `None` - stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;
}

impl<T: ReconnectionStrategy + ?Sized> ReconnectionStrategy for Box<T> {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        (**self).next_delay(attempt)
    }
}

fn within_limit(max_attempts: Option<usize>, attempt: usize) -> bool {
    max_attempts.map_or(true, |max| attempt < max)
}

/// Same delay before every attempt
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// `max_attempts = None` retries forever
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        within_limit(self.max_attempts, attempt).then_some(self.delay)
    }
}

/// `initial_delay * 2^attempt`, capped at `max_delay`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !within_limit(self.max_attempts, attempt) {
            return None;
        }

        let factor = 1u32.checked_shl(attempt.min(31) as u32).unwrap_or(u32::MAX);
        let delay = self
            .initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }
}

/// Never reconnect after a drop
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }
}
