use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use relay_core::Intent;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    commands_total: AtomicU64,
    note_remote_total: AtomicU64,
    note_local_total: AtomicU64,
    calendar_event_total: AtomicU64,
    unknown_total: AtomicU64,
    action_failures_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub commands_total: u64,
    pub note_remote_total: u64,
    pub note_local_total: u64,
    pub calendar_event_total: u64,
    pub unknown_total: u64,
    pub action_failures_total: u64,
    pub avg_latency_micros: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_command(&self, intent: Intent) {
        self.commands_total.fetch_add(1, Ordering::Relaxed);
        self.intent_counter(intent).fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_commands_total", "intent" => intent.as_code()).increment(1);
    }

    pub fn inc_action_failure(&self, intent: Intent) {
        self.action_failures_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_action_failures_total", "intent" => intent.as_code())
            .increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        metrics::histogram!("relay_command_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let commands = self.commands_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            commands_total: commands,
            note_remote_total: self.note_remote_total.load(Ordering::Relaxed),
            note_local_total: self.note_local_total.load(Ordering::Relaxed),
            calendar_event_total: self.calendar_event_total.load(Ordering::Relaxed),
            unknown_total: self.unknown_total.load(Ordering::Relaxed),
            action_failures_total: self.action_failures_total.load(Ordering::Relaxed),
            avg_latency_micros: if commands == 0 {
                0.0
            } else {
                latency as f64 / commands as f64
            },
        }
    }

    fn intent_counter(&self, intent: Intent) -> &AtomicU64 {
        match intent {
            Intent::NoteRemote => &self.note_remote_total,
            Intent::NoteLocal => &self.note_local_total,
            Intent::CalendarEvent => &self.calendar_event_total,
            Intent::Unknown => &self.unknown_total,
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,relay_agents=info,relay_connectors=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
