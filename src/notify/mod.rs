//! Outbound notification of discovered notices.
//!
//! - `DiscordNotifier`: posts to a Discord-compatible webhook
//! - `LogNotifier`: only logs the message (dry runs, no webhook configured)

mod discord;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, Notice};

pub use discord::DiscordNotifier;

/// Delivers one notice downstream.
///
/// Implementations either deliver or fail; retrying is left to the next run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<()>;
}

/// Notifier that writes the formatted message to the log.
pub struct LogNotifier {
    board: String,
    template: String,
}

impl LogNotifier {
    pub fn new(board: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            template: template.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> Result<()> {
        log::info!(
            "[dry-run] {}",
            notice.format(&self.template, &self.board).replace('\n', " | ")
        );
        Ok(())
    }
}

/// Pick the notifier for a run: the webhook when configured, the log otherwise.
pub fn from_config(config: &Config, dry_run: bool) -> Result<Box<dyn Notifier>> {
    let board = config.board.name.clone();
    let template = config.notifier.message_template.clone();

    match (&config.notifier.webhook_url, dry_run) {
        (Some(webhook), false) => Ok(Box::new(DiscordNotifier::new(
            webhook,
            board,
            template,
            config.notifier.timeout_secs,
        )?)),
        (None, false) => {
            log::warn!("No webhook configured; notices will only be logged");
            Ok(Box::new(LogNotifier::new(board, template)))
        }
        (_, true) => Ok(Box::new(LogNotifier::new(board, template))),
    }
}
