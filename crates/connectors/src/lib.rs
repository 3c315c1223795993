mod calendar;
mod notion;
mod vault;

#[cfg(test)]
mod test_support;

use chrono::NaiveDateTime;
use relay_core::ActionOutcome;

pub use calendar::{CalendarConfig, CalendarError, GoogleCalendar};
pub use notion::{NotionClient, NotionConfig, NotionError};
pub use vault::{sanitize_filename, MarkdownVault, VaultError};

/// Remote note service (a Notion database).
pub trait RemoteNotes: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn create_note(&self, title: &str, content: &str) -> ActionOutcome;
}

/// Local markdown vault on disk.
pub trait LocalNotes: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn write_note(&self, title: &str, content: &str) -> ActionOutcome;
}

pub trait CalendarSink: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn create_event(
        &self,
        summary: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        timezone: &str,
    ) -> ActionOutcome;
}
