mod config;
mod history;
mod voice;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use relay_connectors::{
    CalendarSink, GoogleCalendar, LocalNotes, MarkdownVault, NotionClient, RemoteNotes,
};
use relay_core::{classify, matched_trigger, ActionOutcome, ClassificationResult, Intent};
use relay_observability::AppMetrics;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub use config::AssistantConfig;
pub use history::HistoryLog;
pub use voice::{ConsoleSpeaker, Speaker};

pub const UNKNOWN_COMMAND_REPLY: &str =
    "Sorry, I didn't understand. Try mentioning Notion, Obsidian, or Calendar.";

pub type LiveAgent = CommandAgent<NotionClient, MarkdownVault, GoogleCalendar>;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReply {
    pub command_id: Uuid,
    pub classification: ClassificationResult,
    pub outcome: ActionOutcome,
}

impl CommandReply {
    pub fn reply_text(&self) -> &str {
        &self.outcome.message
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConnectorStatus {
    pub remote_notes: bool,
    pub local_notes: bool,
    pub calendar: bool,
}

/// Classifies commands and routes each one to the matching collaborator.
#[derive(Clone)]
pub struct CommandAgent<R, L, C>
where
    R: RemoteNotes,
    L: LocalNotes,
    C: CalendarSink,
{
    remote_notes: Arc<R>,
    local_notes: Arc<L>,
    calendar: Arc<C>,
    timezone: String,
    history: HistoryLog,
    speaker: Option<Arc<dyn Speaker>>,
    metrics: Arc<AppMetrics>,
}

impl LiveAgent {
    pub fn from_config(config: &AssistantConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build HTTP client")?;

        let agent = Self::new(
            Arc::new(NotionClient::new(http.clone(), config.notion.clone())),
            Arc::new(MarkdownVault::new(config.vault_path.clone())),
            Arc::new(GoogleCalendar::new(http, config.calendar.clone())),
            config.default_timezone.clone(),
            HistoryLog::new(config.history_log_file.clone()),
            metrics,
        );

        Ok(if config.voice_feedback_enabled {
            agent.with_speaker(Arc::new(ConsoleSpeaker))
        } else {
            agent
        })
    }
}

impl<R, L, C> CommandAgent<R, L, C>
where
    R: RemoteNotes,
    L: LocalNotes,
    C: CalendarSink,
{
    pub fn new(
        remote_notes: Arc<R>,
        local_notes: Arc<L>,
        calendar: Arc<C>,
        timezone: impl Into<String>,
        history: HistoryLog,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            remote_notes,
            local_notes,
            calendar,
            timezone: timezone.into(),
            history,
            speaker: None,
            metrics,
        }
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn without_speaker(mut self) -> Self {
        self.speaker = None;
        self
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn connector_status(&self) -> ConnectorStatus {
        ConnectorStatus {
            remote_notes: self.remote_notes.is_configured(),
            local_notes: self.local_notes.is_configured(),
            calendar: self.calendar.is_configured(),
        }
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        classify(text)
    }

    #[instrument(skip(self, text))]
    pub async fn handle_text(&self, text: &str) -> CommandReply {
        let started = Instant::now();
        let command_id = Uuid::new_v4();

        let classification = classify(text);
        let intent = classification.intent();
        self.metrics.record_command(intent);
        let trigger = matched_trigger(text).map(|(_, trigger)| trigger);
        debug!(%command_id, trigger, "command classified");

        let outcome = self.dispatch(&classification).await;
        if !outcome.success && intent != Intent::Unknown {
            self.metrics.inc_action_failure(intent);
            warn!(%command_id, intent = intent.as_code(), detail = %outcome.message, "action failed");
        }

        if let Err(err) = self
            .history
            .append(&format!("Command: {} -> {}", text, outcome.message))
            .await
        {
            warn!(%command_id, error = ?err, "history log append failed");
        }

        if let Some(speaker) = self.speaker.as_ref() {
            speaker.speak(&outcome.message);
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            %command_id,
            intent = intent.as_code(),
            success = outcome.success,
            "command handled"
        );

        CommandReply {
            command_id,
            classification,
            outcome,
        }
    }

    async fn dispatch(&self, classification: &ClassificationResult) -> ActionOutcome {
        match classification {
            ClassificationResult::NoteRemote(note) => {
                self.remote_notes.create_note(&note.title, &note.content).await
            }
            ClassificationResult::NoteLocal(note) => {
                self.local_notes.write_note(&note.title, &note.content).await
            }
            ClassificationResult::CalendarEvent(event) => {
                self.calendar
                    .create_event(&event.summary, event.start, event.end, &self.timezone)
                    .await
            }
            ClassificationResult::Unknown(_) => ActionOutcome::failure(UNKNOWN_COMMAND_REPLY),
        }
    }
}
