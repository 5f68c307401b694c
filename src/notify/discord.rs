//! Discord webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Notice;
use crate::notify::Notifier;

/// Discord rejects message content above this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": ...}` to a webhook.
pub struct DiscordNotifier {
    client: Client,
    webhook: Url,
    board: String,
    template: String,
}

impl DiscordNotifier {
    pub fn new(
        webhook: &str,
        board: impl Into<String>,
        template: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            webhook: Url::parse(webhook)?,
            board: board.into(),
            template: template.into(),
        })
    }

    fn message(&self, notice: &Notice) -> String {
        let message = notice.format(&self.template, &self.board);
        if message.chars().count() <= MAX_CONTENT_CHARS {
            return message;
        }
        message.chars().take(MAX_CONTENT_CHARS).collect()
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notice: &Notice) -> Result<()> {
        let content = self.message(notice);
        let response = self
            .client
            .post(self.webhook.clone())
            .json(&WebhookPayload { content: &content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "webhook returned {} for notice {}: {}",
                status, notice.id, body
            )));
        }

        log::debug!("Delivered notice {} ({})", notice.id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(template: &str) -> DiscordNotifier {
        DiscordNotifier::new("https://discord.com/api/webhooks/1/abc", "학부", template, 10).unwrap()
    }

    #[test]
    fn test_message_uses_template() {
        let notice = Notice::new(7, "제목", "https://example.com/7");
        assert_eq!(
            notifier("{board} 새 공지\n{title}\n{link}").message(&notice),
            "학부 새 공지\n제목\nhttps://example.com/7"
        );
    }

    #[test]
    fn test_message_is_capped() {
        let notice = Notice::new(7, "가".repeat(5000), "https://example.com/7");
        assert_eq!(notifier("{title}").message(&notice).chars().count(), 2000);
    }

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_value(WebhookPayload { content: "hi" }).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hi" }));
    }
}
