// src/services/fetcher.rs

//! Route fetcher.
//!
//! Retrieves one target URL through an ordered list of transport routes.
//! Each route gets a fixed number of attempts with a fixed delay between
//! them; the first attempt that returns a success status with a non-empty
//! body wins and no later route is tried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, FetchConfig, ResponseMode, Route};

const ACCEPT_MARKUP: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Raw response of a single transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Success status with something other than whitespace in the body.
    pub fn is_usable(&self) -> bool {
        self.status == 200 && !self.body.trim().is_empty()
    }
}

/// Network seam used by the fetcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET for `url` using the settings of `route`.
    async fn get(&self, route: &Route, url: &str) -> Result<HttpResponse>;
}

/// reqwest-backed transport with one client per route.
///
/// Every client carries the route's own connect and read timeouts.
pub struct HttpTransport {
    clients: HashMap<String, Client>,
}

impl HttpTransport {
    pub fn new(fetch: &FetchConfig, routes: &[Route]) -> Result<Self> {
        let headers = default_headers(fetch)?;
        let mut clients = HashMap::with_capacity(routes.len());

        for route in routes {
            let client = Client::builder()
                .user_agent(&fetch.user_agent)
                .default_headers(headers.clone())
                .connect_timeout(route.connect_timeout)
                .read_timeout(route.read_timeout)
                .build()?;
            if clients.insert(route.name.clone(), client).is_some() {
                return Err(AppError::config(format!(
                    "duplicate route name '{}'",
                    route.name
                )));
            }
        }

        Ok(Self { clients })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, route: &Route, url: &str) -> Result<HttpResponse> {
        let client = self
            .clients
            .get(&route.name)
            .ok_or_else(|| AppError::config(format!("no client for route '{}'", route.name)))?;

        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

fn default_headers(fetch: &FetchConfig) -> Result<HeaderMap> {
    let header = |value: &str| {
        HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid header value '{}': {}", value, e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header(ACCEPT_MARKUP)?);
    headers.insert(ACCEPT_LANGUAGE, header(fetch.accept_language.as_str())?);
    if let Some(referer) = &fetch.referer {
        headers.insert(REFERER, header(referer.as_str())?);
    }
    Ok(headers)
}

/// Content retrieved through one of the routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub content: String,
    pub mode: ResponseMode,
    /// Name of the route that succeeded
    pub route: String,
}

/// Fetches a target through routes in priority order.
pub struct RouteFetcher {
    routes: Vec<Route>,
    transport: Arc<dyn Transport>,
    retry_count: usize,
    retry_delay: Duration,
}

impl RouteFetcher {
    pub fn new(routes: Vec<Route>, transport: Arc<dyn Transport>, fetch: &FetchConfig) -> Self {
        Self {
            routes,
            transport,
            retry_count: fetch.retry_count.max(1),
            retry_delay: Duration::from_millis(fetch.retry_delay_ms),
        }
    }

    /// Build a fetcher with the configured routes over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let routes = Route::resolve_all(&config.routes, &config.fetch)?;
        if routes.is_empty() {
            return Err(AppError::config("no usable routes configured"));
        }
        let transport = HttpTransport::new(&config.fetch, &routes)?;
        log::debug!(
            "Routes in priority order: {}",
            routes
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        Ok(Self::new(routes, Arc::new(transport), &config.fetch))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Fetch a canonical https target.
    ///
    /// Fails with [`AppError::Fetch`] only after every route and retry
    /// has been used up.
    pub async fn fetch(&self, target: &str) -> Result<Fetched> {
        let target_url = Url::parse(target)?;
        let mut attempts = 0;

        for route in &self.routes {
            let request_url = match route.request_url(&target_url) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Route '{}' cannot reach {}: {}", route.name, target, e);
                    continue;
                }
            };

            for attempt in 1..=self.retry_count {
                if attempts > 0 && !self.retry_delay.is_zero() {
                    tokio::time::sleep(self.retry_delay).await;
                }
                attempts += 1;

                match self.transport.get(route, &request_url).await {
                    Ok(response) if response.is_usable() => {
                        log::debug!(
                            "Fetched {} via {} (attempt {})",
                            target,
                            route.name,
                            attempt
                        );
                        return Ok(Fetched {
                            content: response.body,
                            mode: route.mode,
                            route: route.name.clone(),
                        });
                    }
                    Ok(response) => log::debug!(
                        "Route {} attempt {}: status {}, {} bytes",
                        route.name,
                        attempt,
                        response.status,
                        response.body.len()
                    ),
                    Err(e) => log::debug!("Route {} attempt {}: {}", route.name, attempt, e),
                }
            }
        }

        Err(AppError::Fetch {
            url: target.to_string(),
            attempts,
        })
    }
}
