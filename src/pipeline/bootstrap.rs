// src/pipeline/bootstrap.rs

//! Frontier discovery.
//!
//! Finds the greatest existing identifier when no checkpoint exists:
//!
//! 1. Exponential phase: double from `start_id` while the probe exists,
//!    within the share of the budget reserved for it.
//! 2. Low-range fallback: if nothing was found, try 1, 2, 4, ... below
//!    `start_id` (new or sparse boards). The greatest hit becomes the lower
//!    bound and the first miss above it the upper bound.
//! 3. Upper-bound extension: re-probe the upper bound and keep doubling
//!    while it exists, so `(low, high)` brackets the frontier.
//! 4. Binary search over `[low, high)`. Indeterminate midpoints count as
//!    missing, which may under-discover but never overshoots.
//!
//! Identifiers above `ceiling` are never probed.

use serde::Serialize;

use crate::models::BootstrapConfig;
use crate::pipeline::Budget;
use crate::services::Classify;

/// Result of a successful discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frontier {
    /// Greatest identifier confirmed to exist
    pub id: u64,
    /// Number of probes issued
    pub probes: usize,
    /// Whether the budget cut a phase short
    pub budget_exhausted: bool,
}

/// Counts probes and refuses to start one once its budget is gone.
struct Prober<'a> {
    classifier: &'a dyn Classify,
    probes: usize,
    budget_exhausted: bool,
}

impl Prober<'_> {
    /// `None` when the budget is exhausted before probing.
    async fn exists(&mut self, id: u64, budget: &Budget) -> Option<bool> {
        if budget.is_exhausted() {
            self.budget_exhausted = true;
            return None;
        }
        self.probes += 1;
        let exists = self.classifier.classify(id).await.exists();
        log::debug!("Bootstrap probe {}: {}", id, if exists { "exists" } else { "missing" });
        Some(exists)
    }
}

/// Discover the current frontier.
///
/// Returns `None` when no existing identifier was found within the budget.
pub async fn discover_frontier(
    classifier: &dyn Classify,
    config: &BootstrapConfig,
    budget: Budget,
) -> Option<Frontier> {
    let ceiling = config.ceiling.max(1);
    // Upper bound used once doubling passes the ceiling.
    let beyond = ceiling.saturating_add(1);
    let double = |id: u64| id.checked_mul(2).filter(|&n| n <= ceiling).unwrap_or(beyond);

    let mut prober = Prober {
        classifier,
        probes: 0,
        budget_exhausted: false,
    };
    let mut low = None;
    let mut high = config.start_id.clamp(1, ceiling);

    // Phase 1: exponential
    let exponential_budget = budget.slice(config.exponential_fraction);
    while high <= ceiling {
        match prober.exists(high, &exponential_budget).await {
            Some(true) => {
                low = Some(high);
                high = double(high);
            }
            _ => break,
        }
    }

    // Phase 2: low range
    if low.is_none() {
        // Smallest missing identifier above the current `low`
        let mut missing_above = None;
        let mut probe = 1;
        while probe < high {
            match prober.exists(probe, &budget).await {
                Some(true) => {
                    low = Some(probe);
                    missing_above = None;
                }
                Some(false) => {
                    missing_above = missing_above.or(Some(probe));
                }
                None => break,
            }
            probe = double(probe);
        }
        if let (Some(_), Some(missing)) = (low, missing_above) {
            high = missing;
        }
    }

    let Some(mut low) = low else {
        log::warn!(
            "Bootstrap found no existing identifier after {} probes",
            prober.probes
        );
        return None;
    };

    // Phase 3: make sure `high` is not an existing identifier
    while high <= ceiling {
        match prober.exists(high, &budget).await {
            Some(true) => {
                low = high;
                high = double(high);
            }
            _ => break,
        }
    }

    // Phase 4: bisection
    while low + 1 < high {
        let mid = low + (high - low) / 2;
        match prober.exists(mid, &budget).await {
            Some(true) => low = mid,
            Some(false) => high = mid,
            None => break,
        }
    }

    log::info!(
        "Bootstrap frontier {} after {} probes{}",
        low,
        prober.probes,
        if prober.budget_exhausted {
            " (budget exhausted)"
        } else {
            ""
        }
    );

    Some(Frontier {
        id: low,
        probes: prober.probes,
        budget_exhausted: prober.budget_exhausted,
    })
}
