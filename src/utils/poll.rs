use std::time::Duration;

use tokio::time::sleep;
use tokio::time::Instant;

/// Fixed-interval attempt schedule bounded by an overall deadline.
///
/// The first attempt is immediate. Later attempts are spaced by `interval`,
/// and one last attempt is granted exactly at the deadline, so a state that
/// settles just before expiry is still observed.
#[derive(Debug)]
pub struct PollSchedule {
    interval: Duration,
    started: Instant,
    deadline: Instant,
    attempts: usize,
}

impl PollSchedule {
    pub fn new(
        interval: Duration,
        budget: Duration,
    ) -> Self {
        let started = Instant::now();
        Self {
            interval,
            started,
            deadline: started + budget,
            attempts: 0,
        }
    }

    /// Sleeps until the next attempt is due. Returns `false` once the budget
    /// is spent; never blocks past the deadline.
    pub async fn next_attempt(&mut self) -> bool {
        if self.attempts > 0 {
            let now = Instant::now();
            if now >= self.deadline {
                return false;
            }
            sleep(self.interval.min(self.deadline - now)).await;
        }
        self.attempts += 1;
        true
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
