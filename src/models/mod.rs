// src/models/mod.rs

//! Domain models for the notice watcher.
//!
//! This module contains the configuration tree, transport routes and the
//! notice item produced by a successful probe.

mod config;
mod notice;
mod route;

// Re-export all public types
pub use config::{
    BoardConfig, BootstrapConfig, ClassifyConfig, Config, FetchConfig, MAX_BUDGET_SECS,
    NotifierConfig, RELAY_ENV, RunConfig, ScanConfig, WEBHOOK_ENV,
};
pub use notice::Notice;
pub use route::{ResponseMode, Route, RouteConfig, RouteKind};
