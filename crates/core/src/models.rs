use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NoteRemote,
    NoteLocal,
    CalendarEvent,
    Unknown,
}

impl Intent {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::NoteRemote => "note_remote",
            Self::NoteLocal => "note_local",
            Self::CalendarEvent => "calendar_event",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPayload {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownPayload {
    pub text: String,
}

/// Outcome of classifying one command. Serializes as
/// `{"intent": "<tag>", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "payload", rename_all = "snake_case")]
pub enum ClassificationResult {
    NoteRemote(NotePayload),
    NoteLocal(NotePayload),
    CalendarEvent(CalendarPayload),
    Unknown(UnknownPayload),
}

impl ClassificationResult {
    pub fn intent(&self) -> Intent {
        match self {
            Self::NoteRemote(_) => Intent::NoteRemote,
            Self::NoteLocal(_) => Intent::NoteLocal,
            Self::CalendarEvent(_) => Intent::CalendarEvent,
            Self::Unknown(_) => Intent::Unknown,
        }
    }
}

/// Result contract shared by every downstream collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
