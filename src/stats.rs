use tracing::debug;

use std::time::{Duration, Instant};

/// Counters for one pass-through relay window.
#[derive(Debug, Clone)]
pub struct RelayStats {
    /// bytes read from the peripheral and shown
    pub shown: u64,
    /// bytes typed on the console and forwarded to the peripheral
    pub forwarded: u64,
    /// drain iterations that found at least one byte
    pub chunks: u64,
    pub elapsed: Duration,
    t0: Instant,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            shown: 0,
            forwarded: 0,
            chunks: 0,
            elapsed: Duration::ZERO,
            t0: Instant::now(),
        }
    }
    pub fn add_shown(&mut self, n: usize) {
        self.shown += n as u64;
        self.chunks += 1;
    }
    pub fn add_forwarded(&mut self, n: usize) {
        self.forwarded += n as u64;
    }

    pub fn finish(&mut self) {
        self.elapsed = self.t0.elapsed();
        if self.shown > 0 || self.forwarded > 0 {
            debug!(
                "relay shown={} forwarded={} chunks={} over {:.3}s",
                self.shown,
                self.forwarded,
                self.chunks,
                self.elapsed.as_secs_f64()
            );
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
