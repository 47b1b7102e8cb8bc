//! Reconnection backoff schedule.
//!
//! A fixed ascending list of delays instead of unbounded exponential growth.
//! The delay before reconnect attempt `n` (0-based, `n` = failed attempts so
//! far) is `schedule[min(n, len - 1)]`, so the final value repeats forever.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    schedule: Vec<Duration>,
}

impl ReconnectPolicy {
    /// Immediate, 2s, 10s, 30s
    pub const DEFAULT_SCHEDULE_MS: [u64; 4] = [0, 2_000, 10_000, 30_000];

    /// Build a policy from a list of delays.
    ///
    /// Each delay is raised to at least its predecessor so the schedule never
    /// decreases. An empty list means "retry immediately".
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        let mut schedule: Vec<Duration> = Vec::new();
        for delay in delays {
            let floor = schedule.last().copied().unwrap_or(Duration::ZERO);
            schedule.push(delay.max(floor));
        }
        if schedule.is_empty() {
            schedule.push(Duration::ZERO);
        }
        Self { schedule }
    }

    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self::new(delays_ms.iter().map(|ms| Duration::from_millis(*ms)))
    }

    /// Delay to wait before the next attempt, given the failed attempts so far.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let index = (failed_attempts as usize).min(self.schedule.len() - 1);
        self.schedule[index]
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_millis(&Self::DEFAULT_SCHEDULE_MS)
    }
}
