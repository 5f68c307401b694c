// src/pipeline/budget.rs

//! Wall-clock budget shared by the phases of one run.
//!
//! Checked before each probe; an in-flight probe is never interrupted.

use std::time::Duration;

use tokio::time::Instant;

/// Stand-in deadline for limits the clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct Budget {
    started: Instant,
    deadline: Instant,
}

impl Budget {
    /// Start a budget of `limit` from now.
    pub fn new(limit: Duration) -> Self {
        let started = Instant::now();
        let deadline = started
            .checked_add(limit)
            .or_else(|| started.checked_add(FAR_FUTURE))
            .unwrap_or(started);
        Self { started, deadline }
    }

    /// A budget covering the first `fraction` of this one.
    ///
    /// The slice shares the start instant and never outlives its parent.
    pub fn slice(&self, fraction: f64) -> Self {
        let total = self.deadline - self.started;
        let share = total.mul_f64(fraction.clamp(0.0, 1.0));
        Self {
            started: self.started,
            deadline: (self.started + share).min(self.deadline),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_budget_expires() {
        let budget = Budget::new(Duration::from_secs(10));
        assert!(!budget.is_exhausted());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!budget.is_exhausted());
        assert_eq!(budget.remaining(), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(budget.is_exhausted());
        assert_eq!(budget.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slice_ends_early() {
        let budget = Budget::new(Duration::from_secs(10));
        let half = budget.slice(0.5);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(half.is_exhausted());
        assert!(!budget.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slice_is_clamped() {
        let budget = Budget::new(Duration::from_secs(10));
        let over = budget.slice(3.0);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(over.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_limit_saturates() {
        let budget = Budget::new(Duration::from_secs(u64::MAX));
        let half = budget.slice(0.5);

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(!budget.is_exhausted());
        assert!(!half.is_exhausted());
        assert!(budget.remaining() > Duration::from_secs(365 * 24 * 60 * 60));
    }

    #[tokio::test]
    async fn test_zero_budget_is_exhausted() {
        assert!(Budget::new(Duration::ZERO).is_exhausted());
    }
}
