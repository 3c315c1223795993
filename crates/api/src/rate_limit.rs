use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window limiter keyed by the authenticated client key. Clients
/// with no hit inside the window are dropped on the next sweep.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    state: Arc<Mutex<Windows>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug, Default)]
struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(Windows::default())),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut state = self.state.lock();
        self.sweep(&mut state, now);

        let hits = state.clients.entry(client.to_string()).or_default();
        expire(hits, now, self.window);

        if hits.len() >= self.max_requests {
            return false;
        }

        hits.push_back(now);
        true
    }

    fn sweep(&self, state: &mut Windows, now: Instant) {
        let due = state
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= self.window);
        if !due {
            return;
        }

        let window = self.window;
        state.clients.retain(|_, hits| {
            expire(hits, now, window);
            !hits.is_empty()
        });
        state.last_sweep = Some(now);
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.state.lock().clients.len()
    }
}

fn expire(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while hits
        .front()
        .is_some_and(|first| now.duration_since(*first) > window)
    {
        hits.pop_front();
    }
}
