//! Service layer for the notice watcher.
//!
//! This module contains the network-facing logic:
//! - Multi-route fetching with retries (`RouteFetcher`)
//! - Existence classification of item pages (`ExistenceClassifier`)

mod classifier;
mod fetcher;

pub use classifier::{Classification, Classify, ExistenceClassifier, TitleExtractor};
pub use fetcher::{Fetched, HttpResponse, HttpTransport, RouteFetcher, Transport};
