use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// A named phase boundary that was reached, with its offset from the start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint<P> {
    pub phase: P,
    pub at: Duration,
}

/// Ordered record of the phase boundaries a scenario passed
#[derive(Debug, Clone)]
pub struct CheckpointLog<P> {
    started: Instant,
    entries: Vec<Checkpoint<P>>,
}

impl<P: Copy + fmt::Debug> CheckpointLog<P> {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        phase: P,
    ) {
        let at = self.started.elapsed();
        info!(?phase, ?at, "checkpoint");
        self.entries.push(Checkpoint { phase, at });
    }

    pub fn last(&self) -> Option<P> {
        self.entries.last().map(|c| c.phase)
    }

    pub fn phases(&self) -> Vec<P> {
        self.entries.iter().map(|c| c.phase).collect()
    }

    pub fn entries(&self) -> &[Checkpoint<P>] {
        &self.entries
    }
}

impl<P: Copy + fmt::Debug> Default for CheckpointLog<P> {
    fn default() -> Self {
        Self::new()
    }
}
