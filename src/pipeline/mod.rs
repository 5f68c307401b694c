//! Pipeline entry points for watcher operations.
//!
//! - `discover_frontier`: find the newest identifier when no checkpoint exists
//! - `scan_from`: collect notices published after the checkpoint
//! - `Watcher::run_once`: one full polling pass

pub mod bootstrap;
pub mod budget;
pub mod run;
pub mod scan;

pub use bootstrap::{Frontier, discover_frontier};
pub use budget::Budget;
pub use run::{RunMode, RunReport, Watcher};
pub use scan::{ScanOutcome, StopReason, scan_from};
