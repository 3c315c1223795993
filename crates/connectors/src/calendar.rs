use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use relay_core::ActionOutcome;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::CalendarSink;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const MAX_SUMMARY_CHARS: usize = 200;
const EXPIRY_SKEW_SECONDS: i64 = 30;

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub calendar_id: String,
    pub api_base: String,
    pub token_endpoint: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            calendar_id: "primary".to_string(),
            api_base: CALENDAR_API_BASE.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Google credentials.json not found. See README for setup.")]
    MissingCredentials,
    #[error("Google Calendar is not authorized yet; place an authorized token at {0}")]
    AuthorizationRequired(String),
    #[error("Google token file error: {0}")]
    TokenFile(#[from] std::io::Error),
    #[error("Google token file is malformed: {0}")]
    TokenFormat(#[from] serde_json::Error),
    #[error("Google Calendar error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Google Calendar error: status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Google Calendar error: invalid endpoint {0}")]
    Endpoint(String),
}

/// Stored OAuth user credentials, in the layout Google's client libraries
/// write to `token.json`. Unknown fields are preserved on rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizedUser {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl AuthorizedUser {
    fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref().filter(|token| !token.is_empty())?;
        let expired = self
            .expiry
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .is_some_and(|expiry| {
                expiry.with_timezone(&Utc) <= now + Duration::seconds(EXPIRY_SKEW_SECONDS)
            });

        (!expired).then_some(token)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: Client,
    config: CalendarConfig,
}

impl GoogleCalendar {
    pub fn new(http: Client, config: CalendarConfig) -> Self {
        Self { http, config }
    }

    async fn insert_event(
        &self,
        summary: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timezone: &str,
    ) -> Result<Value, CalendarError> {
        let access_token = self.access_token().await?;
        let summary: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();
        let event = json!({
            "summary": summary,
            "start": { "dateTime": iso_datetime(start), "timeZone": timezone },
            "end": { "dateTime": iso_datetime(end), "timeZone": timezone },
        });

        let response = self
            .http
            .post(self.events_url()?)
            .bearer_auth(access_token)
            .json(&event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    fn events_url(&self) -> Result<Url, CalendarError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|_| CalendarError::Endpoint(self.config.api_base.clone()))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Endpoint(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend(["calendars", self.config.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, CalendarError> {
        let stored = self.load_authorized_user().await?;

        if let Some(user) = stored.as_ref() {
            if let Some(token) = user.valid_token(Utc::now()) {
                return Ok(token.to_string());
            }
        }

        let Some(user) = stored.filter(|user| user.refresh_token.is_some()) else {
            if !tokio::fs::try_exists(&self.config.credentials_file).await? {
                return Err(CalendarError::MissingCredentials);
            }
            return Err(CalendarError::AuthorizationRequired(
                self.config.token_file.display().to_string(),
            ));
        };

        self.refresh(user).await
    }

    async fn load_authorized_user(&self) -> Result<Option<AuthorizedUser>, CalendarError> {
        if !tokio::fs::try_exists(&self.config.token_file).await? {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&self.config.token_file).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable google token file");
                Ok(None)
            }
        }
    }

    async fn refresh(&self, mut user: AuthorizedUser) -> Result<String, CalendarError> {
        let refresh_token = user.refresh_token.clone().unwrap_or_default();
        let client_id = user.client_id.clone().unwrap_or_default();
        let client_secret = user.client_secret.clone().unwrap_or_default();

        let response = self
            .http
            .post(self.config.token_endpoint.as_str())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let refreshed: GoogleTokenResponse = response.json().await?;
        user.token = Some(refreshed.access_token.clone());
        user.expiry = refreshed
            .expires_in
            .map(|seconds| (Utc::now() + Duration::seconds(seconds)).to_rfc3339());

        tokio::fs::write(&self.config.token_file, serde_json::to_string_pretty(&user)?).await?;
        info!(token_file = %self.config.token_file.display(), "google token refreshed");

        Ok(refreshed.access_token)
    }
}

impl CalendarSink for GoogleCalendar {
    fn is_configured(&self) -> bool {
        self.config.token_file.exists() || self.config.credentials_file.exists()
    }

    async fn create_event(
        &self,
        summary: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timezone: &str,
    ) -> ActionOutcome {
        match self.insert_event(summary, start, end, timezone).await {
            Ok(created) => {
                let link = created
                    .get("htmlLink")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                info!(link = %link, "calendar event created");
                ActionOutcome::success(format!("Event created: {link}")).with_data(created)
            }
            Err(err) => {
                warn!(error = %err, "calendar event creation failed");
                ActionOutcome::failure(err.to_string())
            }
        }
    }
}

fn iso_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}
