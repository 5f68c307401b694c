//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{RouteConfig, RouteKind};

/// Environment variable overriding `notifier.webhook_url`.
pub const WEBHOOK_ENV: &str = "NOTICEWATCH_WEBHOOK_URL";

/// Environment variable providing the base of relay routes without one.
pub const RELAY_ENV: &str = "NOTICEWATCH_RELAY_URL";

/// Upper bound accepted for `run.budget_secs` (one day).
pub const MAX_BUDGET_SECS: u64 = 24 * 60 * 60;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Board being watched
    #[serde(default)]
    pub board: BoardConfig,

    /// HTTP behavior shared by all routes
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Transport routes in priority order
    #[serde(default = "defaults::routes")]
    pub routes: Vec<RouteConfig>,

    /// Existence and title extraction rules
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Incremental scan limits
    #[serde(default)]
    pub scan: ScanConfig,

    /// Frontier discovery parameters
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Per-run limits
    #[serde(default)]
    pub run: RunConfig,

    /// Outbound notification settings
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply the webhook and relay overrides.
    ///
    /// Empty values are ignored. A relay override only fills relay routes
    /// that have no base of their own.
    pub fn with_overrides(mut self, webhook: Option<String>, relay: Option<String>) -> Self {
        if let Some(webhook) = webhook.filter(|w| !w.trim().is_empty()) {
            self.notifier.webhook_url = Some(webhook.trim().to_string());
        }
        if let Some(relay) = relay.filter(|r| !r.trim().is_empty()) {
            for route in &mut self.routes {
                if route.kind == RouteKind::Relay && route.base.is_none() {
                    route.base = Some(relay.trim().to_string());
                }
            }
        }
        self
    }

    /// Apply overrides from `NOTICEWATCH_WEBHOOK_URL` and `NOTICEWATCH_RELAY_URL`.
    pub fn with_env_overrides(self) -> Self {
        let webhook = std::env::var(WEBHOOK_ENV).ok();
        let relay = std::env::var(RELAY_ENV).ok();
        self.with_overrides(webhook, relay)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.board.name.trim().is_empty() {
            return Err(AppError::validation("board.name is empty"));
        }
        if !self.board.item_url_template.contains("{id}") {
            return Err(AppError::validation(
                "board.item_url_template must contain {id}",
            ));
        }
        if !self.board.item_url_template.starts_with("https://") {
            return Err(AppError::validation(
                "board.item_url_template must be an https URL",
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.retry_count == 0 {
            return Err(AppError::validation("fetch.retry_count must be > 0"));
        }
        if self.fetch.connect_timeout_secs == 0 || self.fetch.read_timeout_secs == 0 {
            return Err(AppError::validation("fetch timeouts must be > 0"));
        }
        if self.routes.is_empty() {
            return Err(AppError::validation("No routes defined"));
        }
        let mut names = HashSet::new();
        for route in &self.routes {
            if !names.insert(route.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate route name '{}'",
                    route.name
                )));
            }
            if route.connect_timeout_secs == Some(0) || route.read_timeout_secs == Some(0) {
                return Err(AppError::validation(format!(
                    "route '{}': timeouts must be > 0",
                    route.name
                )));
            }
        }
        if self.scan.batch_limit == 0 {
            return Err(AppError::validation("scan.batch_limit must be > 0"));
        }
        if self.run.budget_secs == 0 || self.run.budget_secs > MAX_BUDGET_SECS {
            return Err(AppError::validation(format!(
                "run.budget_secs must be in 1..={}",
                MAX_BUDGET_SECS
            )));
        }
        if self.bootstrap.start_id == 0 {
            return Err(AppError::validation("bootstrap.start_id must be > 0"));
        }
        if self.bootstrap.ceiling < self.bootstrap.start_id {
            return Err(AppError::validation(
                "bootstrap.ceiling must be >= bootstrap.start_id",
            ));
        }
        let fraction = self.bootstrap.exponential_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(AppError::validation(
                "bootstrap.exponential_fraction must be in (0, 1]",
            ));
        }
        if self.classify.max_title_len == 0 {
            return Err(AppError::validation("classify.max_title_len must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            fetch: FetchConfig::default(),
            routes: defaults::routes(),
            classify: ClassifyConfig::default(),
            scan: ScanConfig::default(),
            bootstrap: BootstrapConfig::default(),
            run: RunConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

/// The watched board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Display name used in notifications
    #[serde(default = "defaults::board_name")]
    pub name: String,

    /// Canonical https item URL with an `{id}` placeholder
    #[serde(default = "defaults::item_url_template")]
    pub item_url_template: String,
}

impl BoardConfig {
    /// Canonical URL of one item.
    pub fn item_url(&self, id: u64) -> String {
        self.item_url_template.replace("{id}", &id.to_string())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: defaults::board_name(),
            item_url_template: defaults::item_url_template(),
        }
    }
}

/// HTTP client settings shared by every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    #[serde(default)]
    pub referer: Option<String>,

    /// Attempts per route
    #[serde(default = "defaults::retry_count")]
    pub retry_count: usize,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "defaults::read_timeout")]
    pub read_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            referer: None,
            retry_count: defaults::retry_count(),
            retry_delay_ms: defaults::retry_delay(),
            connect_timeout_secs: defaults::connect_timeout(),
            read_timeout_secs: defaults::read_timeout(),
        }
    }
}

/// Rules for deciding whether an item page holds a real item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Substrings marking a missing item in raw markup
    #[serde(default = "defaults::absent_markers")]
    pub absent_markers_markup: Vec<String>,

    /// Substrings marking a missing item in relay-extracted text
    #[serde(default = "defaults::absent_markers")]
    pub absent_markers_text: Vec<String>,

    /// CSS selectors tried in order for the title region
    #[serde(default = "defaults::title_selectors")]
    pub title_selectors: Vec<String>,

    /// Separator between a page title and the trailing site name
    #[serde(default = "defaults::site_name_separator")]
    pub site_name_separator: String,

    /// Maximum title length in graphemes for line fallbacks
    #[serde(default = "defaults::max_title_len")]
    pub max_title_len: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            absent_markers_markup: defaults::absent_markers(),
            absent_markers_text: defaults::absent_markers(),
            title_selectors: defaults::title_selectors(),
            site_name_separator: defaults::site_name_separator(),
            max_title_len: defaults::max_title_len(),
        }
    }
}

/// Incremental scan limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum items collected per run
    #[serde(default = "defaults::batch_limit")]
    pub batch_limit: usize,

    /// Consecutive non-existing probes bridged before stopping
    #[serde(default = "defaults::gap_tolerance")]
    pub gap_tolerance: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_limit: defaults::batch_limit(),
            gap_tolerance: defaults::gap_tolerance(),
        }
    }
}

/// Frontier discovery parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// First identifier probed by the exponential phase
    #[serde(default = "defaults::start_id")]
    pub start_id: u64,

    /// Largest identifier ever probed
    #[serde(default = "defaults::ceiling")]
    pub ceiling: u64,

    /// Share of the run budget available to the exponential phase
    #[serde(default = "defaults::exponential_fraction")]
    pub exponential_fraction: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            start_id: defaults::start_id(),
            ceiling: defaults::ceiling(),
            exponential_fraction: defaults::exponential_fraction(),
        }
    }
}

/// Per-run limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wall-clock budget for one run in seconds
    #[serde(default = "defaults::budget")]
    pub budget_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget_secs: defaults::budget(),
        }
    }
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Discord-compatible webhook; notifications are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Message template (`{board}`, `{id}`, `{title}`, `{link}`)
    #[serde(default = "defaults::message_template")]
    pub message_template: String,

    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            message_template: defaults::message_template(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

mod defaults {
    use crate::models::{RouteConfig, RouteKind};

    // Board defaults
    pub fn board_name() -> String {
        "전자정보공학부".into()
    }
    pub fn item_url_template() -> String {
        "https://infocom.ssu.ac.kr/kor/notice/undergraduate.php?idx={id}&m=v".into()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; noticewatch/0.1)".into()
    }
    pub fn accept_language() -> String {
        "ko-KR,ko;q=0.9,en-US;q=0.8".into()
    }
    pub fn retry_count() -> usize {
        2
    }
    pub fn retry_delay() -> u64 {
        1200
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn read_timeout() -> u64 {
        20
    }

    pub fn routes() -> Vec<RouteConfig> {
        vec![
            RouteConfig::new("relay", RouteKind::Relay),
            RouteConfig::new("text_relay_http", RouteKind::TextRelay)
                .with_base("https://r.jina.ai")
                .with_target_scheme("http"),
            RouteConfig::new("text_relay_https", RouteKind::TextRelay)
                .with_base("https://r.jina.ai")
                .with_target_scheme("https"),
            RouteConfig::new("direct_https", RouteKind::DirectHttps),
            RouteConfig::new("direct_http", RouteKind::DirectHttp),
        ]
    }

    // Classify defaults
    pub fn absent_markers() -> Vec<String> {
        vec!["없는 게시물".into(), "잘못된 접근".into()]
    }
    pub fn title_selectors() -> Vec<String> {
        vec![
            ".board_view .title".into(),
            ".view .title".into(),
            "h1".into(),
            "h2".into(),
            "h3".into(),
        ]
    }
    pub fn site_name_separator() -> String {
        "|".into()
    }
    pub fn max_title_len() -> usize {
        120
    }

    // Scan defaults
    pub fn batch_limit() -> usize {
        30
    }
    pub fn gap_tolerance() -> usize {
        3
    }

    // Bootstrap defaults
    pub fn start_id() -> u64 {
        64
    }
    pub fn ceiling() -> u64 {
        10_000_000
    }
    pub fn exponential_fraction() -> f64 {
        0.5
    }

    pub fn budget() -> u64 {
        120
    }

    // Notifier defaults
    pub fn message_template() -> String {
        "{board} 새 공지\n{title}\n{link}".into()
    }
    pub fn notify_timeout() -> u64 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.board.item_url_template = "https://example.com/view".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_plain_http_template() {
        let mut config = Config::default();
        config.board.item_url_template = "http://example.com/view?id={id}".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retry_count() {
        let mut config = Config::default();
        config.fetch.retry_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_fraction() {
        let mut config = Config::default();
        config.bootstrap.exponential_fraction = 0.0;
        assert!(config.validate().is_err());
        config.bootstrap.exponential_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_ceiling_below_start() {
        let mut config = Config::default();
        config.bootstrap.start_id = 100;
        config.bootstrap.ceiling = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unbounded_budget() {
        let mut config = Config::default();
        config.run.budget_secs = u64::MAX;
        assert!(config.validate().is_err());
        config.run.budget_secs = MAX_BUDGET_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_route_names() {
        let mut config = Config::default();
        let mut slow = RouteConfig::new("direct_https", RouteKind::DirectHttps);
        slow.connect_timeout_secs = Some(30);
        config.routes.push(slow);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("direct_https"));
    }

    #[test]
    fn validate_rejects_zero_route_timeouts() {
        let mut config = Config::default();
        config.routes[0].connect_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routes[0].read_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routes[0].read_timeout_secs = Some(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn item_url_substitutes_id() {
        let board = BoardConfig::default();
        assert_eq!(
            board.item_url(1234),
            "https://infocom.ssu.ac.kr/kor/notice/undergraduate.php?idx=1234&m=v"
        );
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [board]
            name = "Test"

            [scan]
            gap_tolerance = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.board.name, "Test");
        assert_eq!(config.board.item_url_template, defaults::item_url_template());
        assert_eq!(config.scan.gap_tolerance, 5);
        assert_eq!(config.scan.batch_limit, 30);
        assert_eq!(config.routes.len(), 5);
    }

    #[test]
    fn example_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.routes.len(), 5);
        assert_eq!(config.routes[4].connect_timeout_secs, Some(5));
    }

    #[test]
    fn routes_table_parses_in_order() {
        let config: Config = toml::from_str(
            r#"
            [[routes]]
            name = "direct"
            kind = "direct_https"

            [[routes]]
            name = "jina"
            kind = "text_relay"
            base = "https://r.jina.ai"
            read_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].kind, RouteKind::DirectHttps);
        assert_eq!(config.routes[1].read_timeout_secs, Some(30));
    }

    #[test]
    fn overrides_fill_webhook_and_unset_relays() {
        let config = Config::default().with_overrides(
            Some("https://discord.test/hook".to_string()),
            Some("https://relay.test".to_string()),
        );

        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://discord.test/hook")
        );
        assert_eq!(config.routes[0].base.as_deref(), Some("https://relay.test"));
        // text relays keep their own base
        assert_eq!(config.routes[1].base.as_deref(), Some("https://r.jina.ai"));
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let config = Config::default().with_overrides(Some("  ".to_string()), None);
        assert!(config.notifier.webhook_url.is_none());
        assert!(config.routes[0].base.is_none());
    }
}
