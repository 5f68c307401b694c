//! Transport routes used to reach an item page.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// How a route reaches the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Request the canonical https URL as-is
    DirectHttps,
    /// Same URL downgraded to plain http
    DirectHttp,
    /// Proxy relay taking the target in a `url` query parameter
    Relay,
    /// Text-extraction relay taking the target appended to its base path
    TextRelay,
}

/// Shape of the content a route returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Raw HTML markup
    Markup,
    /// Text/markdown extracted by a relay
    Text,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Markup => "markup",
            ResponseMode::Text => "text",
        }
    }
}

/// One entry of the `[[routes]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Label used in logs
    pub name: String,

    pub kind: RouteKind,

    /// Relay base URL; relays without one are skipped
    #[serde(default)]
    pub base: Option<String>,

    /// Response mode override (text relays default to `text`, others to `markup`)
    #[serde(default)]
    pub mode: Option<ResponseMode>,

    /// Scheme the text relay should request the target with
    #[serde(default)]
    pub target_scheme: Option<String>,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, kind: RouteKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            mode: None,
            target_scheme: None,
            connect_timeout_secs: None,
            read_timeout_secs: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_target_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.target_scheme = Some(scheme.into());
        self
    }

    fn needs_base(&self) -> bool {
        matches!(self.kind, RouteKind::Relay | RouteKind::TextRelay)
    }

    fn configured_base(&self) -> Option<&str> {
        self.base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
    }
}

/// A resolved, ready-to-use route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub kind: RouteKind,
    pub mode: ResponseMode,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    base: Option<String>,
    target_scheme: Option<String>,
}

impl Route {
    /// Resolve a configured route against fetch defaults.
    ///
    /// Returns `Ok(None)` for relays whose base is not configured.
    pub fn resolve(config: &RouteConfig, fetch: &FetchConfig) -> Result<Option<Self>> {
        let base = match (config.needs_base(), config.configured_base()) {
            (true, None) => return Ok(None),
            (true, Some(base)) => {
                Url::parse(base)?;
                Some(base.trim_end_matches('/').to_string())
            }
            (false, _) => None,
        };

        let default_mode = match config.kind {
            RouteKind::TextRelay => ResponseMode::Text,
            _ => ResponseMode::Markup,
        };

        if let Some(scheme) = &config.target_scheme {
            if scheme != "http" && scheme != "https" {
                return Err(AppError::config(format!(
                    "route '{}': target_scheme must be http or https, got '{}'",
                    config.name, scheme
                )));
            }
        }

        Ok(Some(Self {
            name: config.name.clone(),
            kind: config.kind,
            mode: config.mode.unwrap_or(default_mode),
            connect_timeout: Duration::from_secs(
                config
                    .connect_timeout_secs
                    .unwrap_or(fetch.connect_timeout_secs),
            ),
            read_timeout: Duration::from_secs(
                config.read_timeout_secs.unwrap_or(fetch.read_timeout_secs),
            ),
            base,
            target_scheme: config.target_scheme.clone(),
        }))
    }

    /// Resolve every configured route, dropping relays that have no base.
    pub fn resolve_all(configs: &[RouteConfig], fetch: &FetchConfig) -> Result<Vec<Self>> {
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            match Self::resolve(config, fetch)? {
                Some(route) => routes.push(route),
                None => log::debug!("Route '{}' skipped: no base configured", config.name),
            }
        }
        Ok(routes)
    }

    /// Build the concrete request URL for a canonical https target.
    pub fn request_url(&self, target: &Url) -> Result<String> {
        match self.kind {
            RouteKind::DirectHttps => Ok(with_scheme(target, "https")?.to_string()),
            RouteKind::DirectHttp => Ok(with_scheme(target, "http")?.to_string()),
            RouteKind::Relay => {
                let base = self.base()?;
                let mut relay = Url::parse(base)?;
                relay.query_pairs_mut().append_pair("url", target.as_str());
                Ok(relay.to_string())
            }
            RouteKind::TextRelay => {
                let base = self.base()?;
                let inner = match &self.target_scheme {
                    Some(scheme) => with_scheme(target, scheme)?,
                    None => target.clone(),
                };
                Ok(format!("{}/{}", base, inner))
            }
        }
    }

    fn base(&self) -> Result<&str> {
        self.base
            .as_deref()
            .ok_or_else(|| AppError::config(format!("route '{}' has no base URL", self.name)))
    }
}

/// Swap the scheme of an http(s) URL.
fn with_scheme(target: &Url, scheme: &str) -> Result<Url> {
    let mut url = target.clone();
    url.set_scheme(scheme).map_err(|_| {
        AppError::validation(format!("cannot switch {} to scheme {}", target, scheme))
    })?;
    Ok(url)
}
