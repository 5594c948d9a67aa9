use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Extract,
    Generate,
    Summarize,
    Clear,
}

#[derive(Default)]
struct ActionCounters {
    calls: AtomicUsize,
    // Gateway failures rendered as fallback text
    fallbacks: AtomicUsize,
    // Input rejected before any remote call
    rejected: AtomicUsize,
    total_time_us: AtomicU64,
}

impl ActionCounters {
    fn snapshot(&self) -> ActionSnapshot {
        let calls = self.calls.load(Ordering::Relaxed);
        let total = self.total_time_us.load(Ordering::Relaxed) as f64;
        ActionSnapshot {
            calls,
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            avg_time_ms: if calls > 0 {
                total / calls as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
        }
    }
}

#[derive(Default)]
pub struct Metrics {
    sessions_created: AtomicUsize,
    extract: ActionCounters,
    generate: ActionCounters,
    summarize: ActionCounters,
    clear: ActionCounters,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn counters(&self, action: Action) -> &ActionCounters {
        match action {
            Action::Extract => &self.extract,
            Action::Generate => &self.generate,
            Action::Summarize => &self.summarize,
            Action::Clear => &self.clear,
        }
    }

    pub fn record_session(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed action. `fallback` is true when the remote call
    /// failed and the fallback text was served instead.
    pub fn record_action(&self, action: Action, duration: Duration, fallback: bool) {
        let counters = self.counters(action);
        counters.calls.fetch_add(1, Ordering::Relaxed);
        counters
            .total_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if fallback {
            counters.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self, action: Action) {
        self.counters(action).rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            extract: self.extract.snapshot(),
            generate: self.generate.snapshot(),
            summarize: self.summarize.snapshot(),
            clear: self.clear.snapshot(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionSnapshot {
    pub calls: usize,
    pub fallbacks: usize,
    pub rejected: usize,
    pub avg_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub sessions_created: usize,
    pub extract: ActionSnapshot,
    pub generate: ActionSnapshot,
    pub summarize: ActionSnapshot,
    pub clear: ActionSnapshot,
}
