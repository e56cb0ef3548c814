//! Rate-limited error reporting

use std::time::{Duration, Instant};

/// Default spacing between reports of the same error class
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(15);

/// Lets one report through per interval and counts the rest
#[derive(Debug)]
pub struct ErrorThrottle {
    interval: Duration,
    last_report: Option<Instant>,
    suppressed: u64,
}

impl ErrorThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: None,
            suppressed: 0,
        }
    }

    pub fn should_report(&mut self) -> bool {
        self.should_report_at(Instant::now())
    }

    pub fn should_report_at(&mut self, now: Instant) -> bool {
        match self.last_report {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.suppressed += 1;
                false
            }
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }

    /// Number of suppressed reports since the last call
    pub fn take_suppressed(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for ErrorThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}
