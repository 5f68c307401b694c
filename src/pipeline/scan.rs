// src/pipeline/scan.rs

//! Incremental scanner.
//!
//! Walks forward from the checkpoint one identifier at a time and collects
//! every notice that exists, oldest first. Absent and indeterminate probes
//! both count as gaps; the walk ends once more than `gap_tolerance` gaps
//! occur in a row, when the batch is full, or when the budget runs out.

use serde::Serialize;

use crate::models::{BoardConfig, Notice, ScanConfig};
use crate::pipeline::Budget;
use crate::services::{Classification, Classify};

/// Why a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BatchLimit,
    GapTolerance,
    BudgetExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::BatchLimit => "batch limit reached",
            StopReason::GapTolerance => "gap tolerance exceeded",
            StopReason::BudgetExhausted => "budget exhausted",
        }
    }
}

/// Result of one incremental scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Notices found, in increasing identifier order
    pub notices: Vec<Notice>,
    pub probes: usize,
    pub stop_reason: StopReason,
}

/// Scan forward from `checkpoint + 1`.
pub async fn scan_from(
    classifier: &dyn Classify,
    board: &BoardConfig,
    checkpoint: u64,
    config: &ScanConfig,
    budget: &Budget,
) -> ScanOutcome {
    let mut notices = Vec::new();
    let mut probes = 0;
    let mut gaps = 0;
    let mut cursor = checkpoint;

    let stop_reason = loop {
        if notices.len() >= config.batch_limit {
            break StopReason::BatchLimit;
        }
        if budget.is_exhausted() {
            break StopReason::BudgetExhausted;
        }
        cursor = match cursor.checked_add(1) {
            Some(next) => next,
            None => break StopReason::GapTolerance,
        };

        probes += 1;
        match classifier.classify(cursor).await {
            Classification::Exists { title } => {
                log::info!("Found notice {}: {}", cursor, title);
                notices.push(Notice::new(cursor, title, board.item_url(cursor)));
                gaps = 0;
            }
            other => {
                gaps += 1;
                log::debug!(
                    "Gap at {} ({}), {} in a row",
                    cursor,
                    other.label(),
                    gaps
                );
                if gaps > config.gap_tolerance {
                    break StopReason::GapTolerance;
                }
            }
        }
    };

    log::debug!(
        "Scan from {} stopped: {} after {} probes",
        checkpoint,
        stop_reason.as_str(),
        probes
    );

    ScanOutcome {
        notices,
        probes,
        stop_reason,
    }
}
