use relay_core::ActionOutcome;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::RemoteNotes;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_base: NOTION_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("NOTION_DATABASE_ID not configured")]
    MissingDatabaseId,
    #[error("NOTION_API_KEY not configured")]
    MissingApiKey,
    #[error("Notion error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Notion error: status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(http: Client, config: NotionConfig) -> Self {
        Self { http, config }
    }

    async fn create_page(&self, title: &str, content: &str) -> Result<Value, NotionError> {
        let database_id = non_empty(self.config.database_id.as_deref())
            .ok_or(NotionError::MissingDatabaseId)?;
        let api_key =
            non_empty(self.config.api_key.as_deref()).ok_or(NotionError::MissingApiKey)?;

        let payload = json!({
            "parent": { "database_id": database_id },
            "properties": {
                "Name": { "title": [{ "text": { "content": title } }] }
            },
            "children": [
                {
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {
                        "rich_text": [{ "type": "text", "text": { "content": content } }]
                    }
                }
            ]
        });

        let response = self
            .http
            .post(format!("{}/pages", self.config.api_base.trim_end_matches('/')))
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

impl RemoteNotes for NotionClient {
    fn is_configured(&self) -> bool {
        non_empty(self.config.api_key.as_deref()).is_some()
            && non_empty(self.config.database_id.as_deref()).is_some()
    }

    async fn create_note(&self, title: &str, content: &str) -> ActionOutcome {
        match self.create_page(title, content).await {
            Ok(page) => {
                let page_id = page.get("id").and_then(|id| id.as_str());
                info!(page_id, "notion page created");
                ActionOutcome::success("Note added to Notion").with_data(page)
            }
            Err(err) => {
                warn!(error = %err, "notion page creation failed");
                ActionOutcome::failure(err.to_string())
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
