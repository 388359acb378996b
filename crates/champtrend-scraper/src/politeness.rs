//! Randomized pause between requests to a rate-sensitive upstream.

use std::time::Duration;

use rand::Rng;

/// Uniformly random delay in `[min_ms, max_ms]` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PolitenessDelay {
    /// Bounds are reordered if given backwards.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_within_bounds() {
        let delay = PolitenessDelay::new(500, 1500);
        for _ in 0..200 {
            let d = delay.sample();
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn reversed_bounds_are_reordered() {
        assert_eq!(PolitenessDelay::new(900, 100), PolitenessDelay::new(100, 900));
    }

    #[test]
    fn none_is_zero() {
        assert_eq!(PolitenessDelay::none().sample(), Duration::ZERO);
    }
}
