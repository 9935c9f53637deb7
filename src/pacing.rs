use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_PACE_RANGE_MS: (u64, u64) = (2_000, 5_000);

/// Randomized wait inserted between data-bearing requests
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
    rng: StdRng,
}

impl Pacer {
    pub fn new(range_ms: (u64, u64), rng: StdRng) -> Self {
        let (a, b) = range_ms;
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
            rng,
        }
    }

    pub fn range_ms(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }

    /// Draw the next delay, uniform over the inclusive range
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub async fn pace(&mut self) -> Duration {
        let delay = self.next_delay();
        log::debug!("Pacing for {}ms", delay.as_millis());
        sleep(delay).await;
        delay
    }
}
