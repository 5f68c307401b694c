//! Notice data structure.

use serde::{Deserialize, Serialize};

/// A notice confirmed to exist on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    /// Board-assigned identifier
    pub id: u64,

    /// Notice title
    pub title: String,

    /// Canonical URL of the notice
    pub link: String,
}

impl Notice {
    pub fn new(id: u64, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            link: link.into(),
        }
    }

    /// Format notice for display using a template.
    ///
    /// Supported placeholders: `{board}`, `{id}`, `{title}`, `{link}`
    pub fn format(&self, template: &str, board: &str) -> String {
        template
            .replace("{board}", board)
            .replace("{id}", &self.id.to_string())
            .replace("{title}", &self.title)
            .replace("{link}", &self.link)
    }
}
