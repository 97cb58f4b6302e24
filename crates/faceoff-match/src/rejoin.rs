//! Fixed retry schedule for room membership announcements.
//!
//! After connecting, the host announces itself at every delay of the
//! schedule, measured from the moment of connection. The join message can
//! be dropped or reach the relay before the room is ready, and repeating it
//! a few times is cheaper than detecting either case.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Delays (from connect) at which membership is announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejoinSchedule {
    delays: Vec<Duration>,
}

impl Default for RejoinSchedule {
    /// Immediately, then after 500 ms, 1.5 s and 3 s.
    fn default() -> Self {
        Self::new(vec![
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1500),
            Duration::from_millis(3000),
        ])
    }
}

impl RejoinSchedule {
    /// Builds a schedule. Delays are sorted so attempts fire in order.
    pub fn new(mut delays: Vec<Duration>) -> Self {
        delays.sort();
        Self { delays }
    }

    /// A schedule that never announces.
    pub fn disabled() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// Calls `announce(attempt)` at each delay after `start`.
    ///
    /// Stops early if `announce` returns `false`.
    pub async fn run<F>(&self, start: Instant, mut announce: F)
    where
        F: FnMut(usize) -> bool,
    {
        for (attempt, delay) in self.delays.iter().enumerate() {
            sleep_until(start + *delay).await;
            if !announce(attempt) {
                break;
            }
        }
    }
}
