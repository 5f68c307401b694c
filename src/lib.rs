// src/lib.rs

//! noticewatch library
//!
//! Watches a notice board whose items carry increasing numeric identifiers.
//! Instead of scraping the list page, it probes item pages directly through
//! a chain of fetch routes, discovers the newest identifier on first run and
//! then scans forward from a persisted checkpoint.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
