// src/services/classifier.rs

//! Existence classifier.
//!
//! Decides whether an identifier names a real notice by fetching its page
//! and extracting a title. Existence is only confirmed by positive content:
//! an error shell that returns HTTP 200 without a usable title is
//! `Indeterminate`, never `Exists`.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{BoardConfig, ClassifyConfig, Config, ResponseMode};
use crate::services::fetcher::{Fetched, RouteFetcher};

/// Outcome of probing one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The page holds a notice with this title
    Exists { title: String },
    /// The origin explicitly reported the notice as missing
    Absent,
    /// Existence could not be confirmed or denied
    Indeterminate,
}

impl Classification {
    pub fn exists(&self) -> bool {
        matches!(self, Classification::Exists { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Exists { .. } => "exists",
            Classification::Absent => "absent",
            Classification::Indeterminate => "indeterminate",
        }
    }
}

/// Anything that can tell whether an identifier exists.
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, id: u64) -> Classification;
}

/// Elements whose text is never page content.
const NON_CONTENT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Classifies identifiers by fetching their canonical item page.
pub struct ExistenceClassifier {
    fetcher: RouteFetcher,
    board: BoardConfig,
    extractor: TitleExtractor,
}

impl ExistenceClassifier {
    pub fn new(fetcher: RouteFetcher, board: BoardConfig, extractor: TitleExtractor) -> Self {
        Self {
            fetcher,
            board,
            extractor,
        }
    }

    /// Build a classifier over HTTP from the full configuration.
    ///
    /// Fails on a configuration that does not pass [`Config::validate`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            RouteFetcher::from_config(config)?,
            config.board.clone(),
            TitleExtractor::new(&config.classify)?,
        ))
    }
}

#[async_trait]
impl Classify for ExistenceClassifier {
    async fn classify(&self, id: u64) -> Classification {
        let url = self.board.item_url(id);
        match self.fetcher.fetch(&url).await {
            Ok(fetched) => {
                let classification = self.extractor.evaluate(&fetched);
                log::debug!(
                    "Probe {} via {}: {}",
                    id,
                    fetched.route,
                    classification.label()
                );
                classification
            }
            Err(e) => {
                log::debug!("Probe {}: indeterminate ({})", id, e);
                Classification::Indeterminate
            }
        }
    }
}

/// Absence detection and title extraction for fetched item pages.
pub struct TitleExtractor {
    selectors: Vec<Selector>,
    page_title: Selector,
    absent_markup: Vec<String>,
    absent_text: Vec<String>,
    site_name_separator: String,
    max_title_len: usize,
    heading: Regex,
    title_line: Regex,
}

impl TitleExtractor {
    pub fn new(config: &ClassifyConfig) -> Result<Self> {
        let selectors = config
            .title_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            selectors,
            page_title: parse_selector("title")?,
            absent_markup: config.absent_markers_markup.clone(),
            absent_text: config.absent_markers_text.clone(),
            site_name_separator: config.site_name_separator.clone(),
            max_title_len: config.max_title_len,
            heading: Regex::new(r"(?m)^\s*#{1,6}\s+(.+)$")
                .map_err(|e| AppError::config(e.to_string()))?,
            title_line: Regex::new(r"(?m)^Title:\s*(.+)$")
                .map_err(|e| AppError::config(e.to_string()))?,
        })
    }

    /// Classify fetched content.
    pub fn evaluate(&self, fetched: &Fetched) -> Classification {
        let markers = match fetched.mode {
            ResponseMode::Markup => &self.absent_markup,
            ResponseMode::Text => &self.absent_text,
        };
        if markers
            .iter()
            .any(|marker| fetched.content.contains(marker.as_str()))
        {
            return Classification::Absent;
        }

        let title = match fetched.mode {
            ResponseMode::Markup => self.markup_title(&fetched.content),
            ResponseMode::Text => self.text_title(&fetched.content),
        };

        match title {
            Some(title) => Classification::Exists { title },
            None => Classification::Indeterminate,
        }
    }

    fn markup_title(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for selector in &self.selectors {
            if let Some(element) = document.select(selector).next() {
                let title = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }

        if let Some(element) = document.select(&self.page_title).next() {
            let raw: String = element.text().collect();
            let title = self.strip_site_name(&normalize_whitespace(&raw));
            if !title.is_empty() {
                return Some(title);
            }
        }

        document
            .root_element()
            .descendants()
            .filter(|node| {
                !node.ancestors().any(|parent| {
                    parent
                        .value()
                        .as_element()
                        .is_some_and(|element| NON_CONTENT_ELEMENTS.contains(&element.name()))
                })
            })
            .filter_map(|node| node.value().as_text())
            .flat_map(|text| text.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| self.truncate(line))
    }

    fn text_title(&self, text: &str) -> Option<String> {
        let heading = self
            .heading
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .find(|t| !t.is_empty());
        if let Some(heading) = heading {
            return Some(heading.to_string());
        }

        if let Some(caps) = self.title_line.captures(text) {
            let title = self.strip_site_name(caps[1].trim());
            if !title.is_empty() {
                return Some(title);
            }
        }

        text.lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with("http"))
            .map(|line| self.truncate(line))
    }

    fn strip_site_name(&self, title: &str) -> String {
        if self.site_name_separator.is_empty() {
            return title.trim().to_string();
        }
        title
            .split(self.site_name_separator.as_str())
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn truncate(&self, line: &str) -> String {
        line.graphemes(true).take(self.max_title_len).collect()
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{FetchConfig, Route, RouteConfig, RouteKind};
    use crate::services::fetcher::HttpResponse;
    use crate::services::fetcher::testing::ScriptedTransport;

    fn extractor() -> TitleExtractor {
        TitleExtractor::new(&ClassifyConfig::default()).unwrap()
    }

    fn markup(content: &str) -> Fetched {
        Fetched {
            content: content.to_string(),
            mode: ResponseMode::Markup,
            route: "direct_https".to_string(),
        }
    }

    fn text(content: &str) -> Fetched {
        Fetched {
            content: content.to_string(),
            mode: ResponseMode::Text,
            route: "text_relay".to_string(),
        }
    }

    fn exists(title: &str) -> Classification {
        Classification::Exists {
            title: title.to_string(),
        }
    }

    #[test]
    fn test_structured_title_region_wins() {
        let html = r#"<html><head><title>Page | Site</title></head><body>
            <h1>학부 공지</h1>
            <div class="board_view"><div class="title">  2024 장학금
              신청 안내 </div></div></body></html>"#;
        assert_eq!(extractor().evaluate(&markup(html)), exists("2024 장학금 신청 안내"));
    }

    #[test]
    fn test_heading_before_page_title() {
        let html = "<html><head><title>Page | Site</title></head><body><h2>Heading</h2></body></html>";
        assert_eq!(extractor().evaluate(&markup(html)), exists("Heading"));
    }

    #[test]
    fn test_page_title_strips_site_name() {
        let html = "<html><head><title>졸업요건 변경 | 전자정보공학부</title></head><body></body></html>";
        assert_eq!(extractor().evaluate(&markup(html)), exists("졸업요건 변경"));
    }

    #[test]
    fn test_first_text_line_is_truncated() {
        let long = "가".repeat(300);
        let html = format!("<html><body><p>\n\n{}</p></body></html>", long);
        let title = match extractor().evaluate(&markup(&html)) {
            Classification::Exists { title } => title,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(title.chars().count(), 120);
    }

    #[test]
    fn test_markup_absent_marker() {
        let html = "<html><body><script>alert('없는 게시물입니다.');</script></body></html>";
        assert_eq!(extractor().evaluate(&markup(html)), Classification::Absent);
    }

    #[test]
    fn test_empty_shell_is_indeterminate() {
        let html = "<html><head></head><body>   </body></html>";
        assert_eq!(
            extractor().evaluate(&markup(html)),
            Classification::Indeterminate
        );
    }

    #[test]
    fn test_script_only_shell_is_indeterminate() {
        let html = "<html><head><script>location.href='/login.php';</script></head><body></body></html>";
        assert_eq!(
            extractor().evaluate(&markup(html)),
            Classification::Indeterminate
        );

        let html = "<html><head><style>body { color: red; }</style></head>\
                    <body><noscript>Enable JavaScript</noscript>\
                    <template><p>row</p></template></body></html>";
        assert_eq!(
            extractor().evaluate(&markup(html)),
            Classification::Indeterminate
        );
    }

    #[test]
    fn test_first_text_line_ignores_scripts() {
        let html = "<html><body><script>var x = 1;</script><p>학사 일정 변경</p></body></html>";
        assert_eq!(extractor().evaluate(&markup(html)), exists("학사 일정 변경"));
    }

    #[test]
    fn test_text_heading() {
        let md = "Title: ignored\n\nURL Source: http://x\n\n## 기말고사 일정 안내\nbody";
        assert_eq!(extractor().evaluate(&text(md)), exists("기말고사 일정 안내"));
    }

    #[test]
    fn test_text_title_line_strips_site_name() {
        let md = "Title: 캡스톤 설명회 | 전자정보공학부\n\nURL Source: http://x\n";
        assert_eq!(extractor().evaluate(&text(md)), exists("캡스톤 설명회"));
    }

    #[test]
    fn test_text_first_line_skips_urls() {
        let md = "http://infocom.ssu.ac.kr/\n\n  첫 줄 제목  \n다음";
        assert_eq!(extractor().evaluate(&text(md)), exists("첫 줄 제목"));
    }

    #[test]
    fn test_text_absent_marker() {
        let md = "Title: 오류\n\n잘못된 접근입니다.";
        assert_eq!(extractor().evaluate(&text(md)), Classification::Absent);
    }

    #[test]
    fn test_markers_are_mode_specific() {
        let config = ClassifyConfig {
            absent_markers_text: vec!["404 Not Found".to_string()],
            ..ClassifyConfig::default()
        };
        let extractor = TitleExtractor::new(&config).unwrap();

        assert_eq!(
            extractor.evaluate(&text("# 404 Not Found")),
            Classification::Absent
        );
        assert_eq!(
            extractor.evaluate(&markup("<h1>404 Not Found</h1>")),
            exists("404 Not Found")
        );
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ClassifyConfig {
            title_selectors: vec!["[[invalid".to_string()],
            ..ClassifyConfig::default()
        };
        assert!(matches!(
            TitleExtractor::new(&config),
            Err(AppError::Selector { .. })
        ));
    }

    fn classifier(transport: ScriptedTransport) -> ExistenceClassifier {
        let fetch = FetchConfig {
            retry_count: 1,
            retry_delay_ms: 0,
            ..FetchConfig::default()
        };
        let routes = Route::resolve_all(
            &[RouteConfig::new("direct_https", RouteKind::DirectHttps)],
            &fetch,
        )
        .unwrap();
        ExistenceClassifier::new(
            RouteFetcher::new(routes, Arc::new(transport), &fetch),
            BoardConfig::default(),
            extractor(),
        )
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = Config::default();
        config.fetch.retry_count = 0;
        assert!(matches!(
            ExistenceClassifier::from_config(&config),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_exists() {
        let transport = ScriptedTransport::default().reply(
            "direct_https",
            Ok(HttpResponse::ok("<div class='view'><p class='title'>T101</p></div>")),
        );
        assert_eq!(classifier(transport).classify(101).await, exists("T101"));
    }

    #[tokio::test]
    async fn test_classify_fetch_failure_is_indeterminate() {
        let classifier = classifier(ScriptedTransport::default());
        assert_eq!(classifier.classify(101).await, Classification::Indeterminate);
    }

    #[tokio::test]
    async fn test_classify_requests_item_url() {
        let transport = Arc::new(ScriptedTransport::default());
        let fetch = FetchConfig {
            retry_count: 1,
            retry_delay_ms: 0,
            ..FetchConfig::default()
        };
        let routes = Route::resolve_all(
            &[RouteConfig::new("direct_https", RouteKind::DirectHttps)],
            &fetch,
        )
        .unwrap();
        let classifier = ExistenceClassifier::new(
            RouteFetcher::new(routes, transport.clone(), &fetch),
            BoardConfig::default(),
            extractor(),
        );

        classifier.classify(55).await;

        let calls = transport.calls.lock().unwrap();
        assert_eq!(
            calls[0].1,
            "https://infocom.ssu.ac.kr/kor/notice/undergraduate.php?idx=55&m=v"
        );
    }
}
