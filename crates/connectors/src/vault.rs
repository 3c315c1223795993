use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use relay_core::ActionOutcome;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::LocalNotes;

const MAX_FILENAME_CHARS: usize = 80;
const FALLBACK_FILENAME: &str = "New Note";

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\-_\s]").expect("valid filename filter"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace"));

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Obsidian write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes notes as timestamped markdown files into a vault directory.
#[derive(Debug, Clone)]
pub struct MarkdownVault {
    root: PathBuf,
}

impl MarkdownVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn write_note_at(
        &self,
        title: &str,
        content: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, VaultError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let filename = format!(
            "{} - {}.md",
            now.format("%Y-%m-%d_%H-%M"),
            sanitize_filename(title)
        );
        let path = self.root.join(filename);
        let body = format!("# {title}\n\n{content}\n");

        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

impl LocalNotes for MarkdownVault {
    fn is_configured(&self) -> bool {
        true
    }

    async fn write_note(&self, title: &str, content: &str) -> ActionOutcome {
        match self
            .write_note_at(title, content, Local::now().naive_local())
            .await
        {
            Ok(path) => {
                info!(path = %path.display(), "vault note written");
                ActionOutcome::success(format!("Saved to Obsidian: {}", path.display()))
                    .with_data(json!({ "path": path.display().to_string() }))
            }
            Err(err) => {
                warn!(error = %err, root = %self.root.display(), "vault write failed");
                ActionOutcome::failure(err.to_string())
            }
        }
    }
}

/// Reduces a note title to a portable file name stem.
pub fn sanitize_filename(name: &str) -> String {
    let trimmed = match name.trim() {
        "" => FALLBACK_FILENAME,
        value => value,
    };
    let filtered = DISALLOWED.replace_all(trimmed, "");
    let collapsed = WHITESPACE_RUN.replace_all(&filtered, " ");

    collapsed.chars().take(MAX_FILENAME_CHARS).collect()
}
