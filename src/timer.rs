use chrono::prelude::*;
use tracing::{debug, info};

/// One completed start/stop interval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerRecord {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    /// whole seconds between start and end, zero if the clock stepped backwards
    pub duration_secs: u64,
}

impl TimerRecord {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        let duration_secs: u64 = end
            .signed_duration_since(start)
            .num_seconds()
            .try_into()
            .unwrap_or(0);
        Self {
            start,
            end,
            duration_secs,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        started_at: DateTime<Local>,
    },
}

/// Stopwatch style session toggled by the user
#[derive(Debug, Default)]
pub struct TimerSession {
    state: TimerState,
}

impl TimerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        match self.state {
            TimerState::Running { started_at } => Some(started_at),
            TimerState::Idle => None,
        }
    }

    /// Returns false without touching the start time if already running.
    pub fn start(&mut self, now: DateTime<Local>) -> bool {
        if self.is_running() {
            debug!("timer start ignored, already running");
            return false;
        }
        self.state = TimerState::Running { started_at: now };
        info!(started_at = %now, "timer started");
        true
    }

    pub fn stop(&mut self, now: DateTime<Local>) -> Option<TimerRecord> {
        let TimerState::Running { started_at } = self.state else {
            debug!("timer stop ignored, not running");
            return None;
        };
        self.state = TimerState::Idle;
        let record = TimerRecord::new(started_at, now);
        info!(duration_secs = record.duration_secs, "timer stopped");
        Some(record)
    }

    /// Seconds since start, for the live display
    pub fn elapsed_secs(&self, now: DateTime<Local>) -> Option<u64> {
        self.started_at()
            .map(|started_at| TimerRecord::new(started_at, now).duration_secs)
    }
}
