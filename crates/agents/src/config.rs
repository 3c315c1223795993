use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relay_connectors::{CalendarConfig, NotionConfig};
use tracing::info;

/// Settings for one assistant process, resolved once at startup and handed
/// to the dispatcher and surfaces.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub app_name: String,
    pub default_timezone: String,
    pub notion: NotionConfig,
    pub vault_path: PathBuf,
    pub calendar: CalendarConfig,
    /// Raw `credentials.json` / `token.json` contents for deployments that
    /// ship secrets through the environment instead of files.
    pub google_credentials_json: Option<String>,
    pub google_token_json: Option<String>,
    pub voice_feedback_enabled: bool,
    pub history_log_file: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            app_name: "Cloud-Synced AI Assistant".to_string(),
            default_timezone: "UTC".to_string(),
            notion: NotionConfig::default(),
            vault_path: PathBuf::from("obsidian_vault"),
            calendar: CalendarConfig::default(),
            google_credentials_json: None,
            google_token_json: None,
            voice_feedback_enabled: true,
            history_log_file: PathBuf::from("history.txt"),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            app_name: value("APP_NAME").unwrap_or(defaults.app_name),
            default_timezone: value("DEFAULT_TIMEZONE").unwrap_or(defaults.default_timezone),
            notion: NotionConfig {
                api_key: value("NOTION_API_KEY"),
                database_id: value("NOTION_DATABASE_ID"),
                ..defaults.notion
            },
            vault_path: value("OBSIDIAN_VAULT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.vault_path),
            calendar: CalendarConfig {
                credentials_file: value("GOOGLE_CREDENTIALS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.calendar.credentials_file),
                token_file: value("GOOGLE_TOKEN_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.calendar.token_file),
                calendar_id: value("GOOGLE_CALENDAR_ID").unwrap_or(defaults.calendar.calendar_id),
                ..defaults.calendar
            },
            google_credentials_json: value("GOOGLE_CREDENTIALS_JSON"),
            google_token_json: value("GOOGLE_TOKEN_JSON"),
            voice_feedback_enabled: value("VOICE_FEEDBACK_ENABLED")
                .map(|flag| flag.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.voice_feedback_enabled),
            history_log_file: value("HISTORY_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_log_file),
        }
    }

    /// Writes Google OAuth secrets provided inline to the files the calendar
    /// collaborator reads. Existing files are overwritten.
    pub async fn write_google_secrets(&self) -> Result<()> {
        if let Some(raw) = self.google_credentials_json.as_deref() {
            write_secret(&self.calendar.credentials_file, raw).await?;
        }
        if let Some(raw) = self.google_token_json.as_deref() {
            write_secret(&self.calendar.token_file, raw).await?;
        }
        Ok(())
    }
}

async fn write_secret(path: &Path, raw: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("failed writing {}", path.display()))?;
    info!(path = %path.display(), "google secret written from environment");
    Ok(())
}
