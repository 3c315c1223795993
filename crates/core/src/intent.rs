use std::collections::HashMap;

use chrono::{Duration, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CalendarPayload, ClassificationResult, Intent, NotePayload, UnknownPayload};
use crate::temporal::extract_datetime_at;

pub const REMOTE_NOTE_TRIGGERS: &[&str] = &["notion", "note to notion", "add a note"];
pub const LOCAL_NOTE_TRIGGERS: &[&str] = &["obsidian", "write this", "save note"];
pub const CALENDAR_TRIGGERS: &[&str] = &["calendar", "meeting", "event", "schedule", "add meeting"];

// Checked top to bottom; the first set with a hit wins.
const TRIGGER_PRIORITY: [(Intent, &[&str]); 3] = [
    (Intent::NoteRemote, REMOTE_NOTE_TRIGGERS),
    (Intent::NoteLocal, LOCAL_NOTE_TRIGGERS),
    (Intent::CalendarEvent, CALENDAR_TRIGGERS),
];

const TITLE_MAX_CHARS: usize = 60;
const DEFAULT_REMOTE_TITLE: &str = "New Note";
const DEFAULT_LOCAL_TITLE: &str = "New Obsidian Note";

static TRIGGER_PREFIXES: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    REMOTE_NOTE_TRIGGERS
        .iter()
        .chain(LOCAL_NOTE_TRIGGERS)
        .map(|trigger| {
            let pattern = format!(r"(?i)^.*?{}\s*", regex::escape(trigger));
            (*trigger, Regex::new(&pattern).expect("valid trigger prefix pattern"))
        })
        .collect()
});

/// Classifies a command against the local wall clock.
pub fn classify(text: &str) -> ClassificationResult {
    classify_at(text, Local::now().naive_local())
}

/// Classifies a command, using `now` for relative days and the calendar
/// fallback start.
pub fn classify_at(text: &str, now: NaiveDateTime) -> ClassificationResult {
    let trimmed = text.trim();

    match matched_trigger(trimmed) {
        Some((Intent::NoteRemote, trigger)) => {
            ClassificationResult::NoteRemote(note_payload(trimmed, trigger, DEFAULT_REMOTE_TITLE))
        }
        Some((Intent::NoteLocal, trigger)) => {
            ClassificationResult::NoteLocal(note_payload(trimmed, trigger, DEFAULT_LOCAL_TITLE))
        }
        Some((Intent::CalendarEvent, _)) => {
            ClassificationResult::CalendarEvent(calendar_payload(trimmed, now))
        }
        _ => ClassificationResult::Unknown(UnknownPayload {
            text: trimmed.to_string(),
        }),
    }
}

/// Returns the winning intent together with the first phrase of its trigger
/// set found in `text`.
pub fn matched_trigger(text: &str) -> Option<(Intent, &'static str)> {
    let lower = text.to_lowercase();

    TRIGGER_PRIORITY.iter().find_map(|(intent, triggers)| {
        triggers
            .iter()
            .find(|trigger| lower.contains(*trigger))
            .map(|trigger| (*intent, *trigger))
    })
}

fn note_payload(text: &str, trigger: &str, default_title: &str) -> NotePayload {
    let content = strip_through_trigger(text, trigger);
    let title = if content.is_empty() {
        default_title.to_string()
    } else {
        content.chars().take(TITLE_MAX_CHARS).collect()
    };

    NotePayload { title, content }
}

fn strip_through_trigger(text: &str, trigger: &str) -> String {
    match TRIGGER_PREFIXES.get(trigger) {
        Some(prefix) => prefix.replace(text, "").into_owned(),
        None => text.to_string(),
    }
}

fn calendar_payload(text: &str, now: NaiveDateTime) -> CalendarPayload {
    let start = extract_datetime_at(text, now).unwrap_or_else(|| now + Duration::hours(1));

    CalendarPayload {
        summary: text.to_string(),
        start,
        end: start + Duration::hours(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 14)
            .and_then(|day| day.and_hms_opt(9, 41, 27))
            .unwrap()
    }

    fn note(result: ClassificationResult) -> NotePayload {
        match result {
            ClassificationResult::NoteRemote(note) | ClassificationResult::NoteLocal(note) => note,
            other => panic!("expected a note, got {other:?}"),
        }
    }

    fn event(result: ClassificationResult) -> CalendarPayload {
        match result {
            ClassificationResult::CalendarEvent(event) => event,
            other => panic!("expected a calendar event, got {other:?}"),
        }
    }

    #[test]
    fn routes_notion_notes_and_strips_prefix() {
        let result = classify_at("Add a note to Notion about meeting ideas", reference());
        assert_eq!(result.intent(), Intent::NoteRemote);

        let payload = note(result);
        assert_eq!(payload.content, "about meeting ideas");
        assert_eq!(payload.title, payload.content);
    }

    #[test]
    fn routes_obsidian_notes() {
        let result = classify_at("Write this in Obsidian: brain dump", reference());
        assert_eq!(result.intent(), Intent::NoteLocal);
        assert!(note(result).content.contains("brain dump"));
    }

    #[test]
    fn long_note_titles_are_capped() {
        let body = "x".repeat(90);
        let payload = note(classify_at(&format!("save note {body}"), reference()));
        assert_eq!(payload.content, body);
        assert_eq!(payload.title.chars().count(), 60);
    }

    #[test]
    fn empty_note_content_gets_default_title() {
        assert_eq!(note(classify_at("Notion", reference())).title, "New Note");
        assert_eq!(
            note(classify_at("  obsidian  ", reference())).title,
            "New Obsidian Note"
        );
    }

    #[test]
    fn calendar_event_with_time_tomorrow() {
        let now = reference();
        let payload = event(classify_at("Add meeting at 5 pm tomorrow", now));

        assert_eq!(payload.summary, "Add meeting at 5 pm tomorrow");
        assert_eq!(payload.start.date(), now.date() + Duration::days(1));
        assert_eq!((payload.start.hour(), payload.start.minute()), (17, 0));
        assert_eq!(payload.end, payload.start + Duration::hours(1));
    }

    #[test]
    fn calendar_event_without_time_starts_in_an_hour() {
        let now = reference();
        let payload = event(classify_at("schedule something", now));

        assert_eq!(payload.start, now + Duration::hours(1));
        assert_eq!(payload.end, payload.start + Duration::hours(1));
    }

    #[test]
    fn wall_clock_fallback_is_close_to_now() {
        let before = Local::now().naive_local();
        let payload = event(classify("schedule something"));

        let drift = payload.start - (before + Duration::hours(1));
        assert!(drift >= Duration::zero() && drift < Duration::seconds(5));
    }

    #[test]
    fn remote_note_wins_over_calendar() {
        assert_eq!(
            classify_at("notion meeting", reference()).intent(),
            Intent::NoteRemote
        );
        assert_eq!(
            classify_at("obsidian event recap", reference()).intent(),
            Intent::NoteLocal
        );
    }

    #[test]
    fn untriggered_text_is_unknown_and_trimmed() {
        for input in ["  what's the weather?  ", "", "   "] {
            assert_eq!(
                classify_at(input, reference()),
                ClassificationResult::Unknown(UnknownPayload {
                    text: input.trim().to_string()
                })
            );
        }
    }

    #[test]
    fn same_instant_gives_same_result() {
        let now = reference();
        for input in ["schedule something", "Add a note to Notion", "hello"] {
            assert_eq!(classify_at(input, now), classify_at(input, now));
        }
    }

    #[test]
    fn reports_matched_trigger() {
        assert_eq!(
            matched_trigger("Put it on my CALENDAR"),
            Some((Intent::CalendarEvent, "calendar"))
        );
        assert_eq!(matched_trigger("nothing here"), None);
    }
}
