// src/pipeline/run.rs

//! One polling pass.
//!
//! Without a checkpoint the pass discovers the frontier, stores it and ends
//! silently. With a checkpoint it scans forward and delivers every new
//! notice oldest first, advancing the checkpoint right after each delivery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::Config;
use crate::notify::Notifier;
use crate::pipeline::{Budget, StopReason, discover_frontier, scan_from};
use crate::services::Classify;
use crate::storage::CheckpointStore;

/// What a pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Bootstrap,
    Scan,
}

/// Summary of one pass, persisted as `stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mode: RunMode,
    pub checkpoint_before: Option<u64>,
    pub checkpoint_after: Option<u64>,
    pub probes: usize,
    pub discovered: usize,
    pub delivered: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn new(mode: RunMode, checkpoint: Option<u64>) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            mode,
            checkpoint_before: checkpoint,
            checkpoint_after: checkpoint,
            probes: 0,
            discovered: 0,
            delivered: Vec::new(),
            stop_reason: None,
            error: None,
        }
    }

    /// False after a bootstrap failure or a failed delivery.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// Runs polling passes against one board.
pub struct Watcher<'a> {
    config: &'a Config,
    classifier: &'a dyn Classify,
    store: &'a dyn CheckpointStore,
    notifier: &'a dyn Notifier,
}

impl<'a> Watcher<'a> {
    pub fn new(
        config: &'a Config,
        classifier: &'a dyn Classify,
        store: &'a dyn CheckpointStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            classifier,
            store,
            notifier,
        }
    }

    /// Run one pass with the configured budget.
    ///
    /// Storage failures are returned as errors. Bootstrap and delivery
    /// failures are recorded in the report instead.
    pub async fn run_once(&self) -> Result<RunReport> {
        let budget = Budget::new(Duration::from_secs(self.config.run.budget_secs));
        let checkpoint = self.store.load().await?;

        log::info!(
            "Checkpoint at {}: {}",
            self.store.location(),
            checkpoint.map_or_else(|| "none".to_string(), |id| id.to_string())
        );

        let report = match checkpoint {
            None => self.bootstrap(budget).await?,
            Some(checkpoint) => self.scan(checkpoint, budget).await?,
        };
        Ok(report.finish())
    }

    async fn bootstrap(&self, budget: Budget) -> Result<RunReport> {
        let mut report = RunReport::new(RunMode::Bootstrap, None);
        log::info!("No checkpoint; discovering frontier");

        match discover_frontier(self.classifier, &self.config.bootstrap, budget).await {
            Some(frontier) => {
                self.store.save(frontier.id).await?;
                report.probes = frontier.probes;
                report.checkpoint_after = Some(frontier.id);
                if frontier.budget_exhausted {
                    report.stop_reason = Some(StopReason::BudgetExhausted);
                }
                log::info!(
                    "Checkpoint initialized at {}; no notices sent on first activation",
                    frontier.id
                );
            }
            None => {
                let message = format!(
                    "no existing identifier found within {:?}",
                    budget.elapsed()
                );
                log::error!("Bootstrap failed: {}; checkpoint left unset", message);
                report.error = Some(message);
            }
        }

        Ok(report)
    }

    async fn scan(&self, checkpoint: u64, budget: Budget) -> Result<RunReport> {
        let mut report = RunReport::new(RunMode::Scan, Some(checkpoint));

        let outcome = scan_from(
            self.classifier,
            &self.config.board,
            checkpoint,
            &self.config.scan,
            &budget,
        )
        .await;

        report.probes = outcome.probes;
        report.discovered = outcome.notices.len();
        report.stop_reason = Some(outcome.stop_reason);

        if outcome.notices.is_empty() {
            log::info!("No new notices ({})", outcome.stop_reason.as_str());
            return Ok(report);
        }

        for notice in &outcome.notices {
            if let Err(e) = self.notifier.notify(notice).await {
                log::error!(
                    "Delivery of notice {} failed: {}; checkpoint stays at {:?}",
                    notice.id,
                    e,
                    report.checkpoint_after
                );
                report.error = Some(e.to_string());
                break;
            }

            if report.checkpoint_after.is_none_or(|current| notice.id > current) {
                self.store.save(notice.id).await?;
                report.checkpoint_after = Some(notice.id);
            }
            report.delivered.push(notice.id);
            log::info!("Delivered {} {}", notice.id, notice.title);
        }

        Ok(report)
    }
}
