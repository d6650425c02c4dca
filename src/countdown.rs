use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::scheduler::{Scheduler, Task, TaskHandle};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const INVALID_INPUT_MESSAGE: &str = "Please enter a valid time";
pub const FINISHED_MESSAGE: &str = "Countdown stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no minutes or seconds given")]
    Empty,
    #[error("time must not be negative")]
    Negative,
    #[error("time must be greater than zero")]
    Zero,
    #[error("time is too large")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CountdownError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error("countdown is already running")]
    AlreadyRunning,
}

/// Time left on the countdown, seconds kept below 60
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Remaining {
    pub minutes: u64,
    pub seconds: u8,
}

impl Remaining {
    pub fn new(minutes: u64, seconds: u8) -> Self {
        Self { minutes, seconds }
    }

    pub fn from_parts(minutes: i128, seconds: i128) -> Result<Self, InputError> {
        if minutes < 0 || seconds < 0 {
            return Err(InputError::Negative);
        }
        if minutes == 0 && seconds == 0 {
            return Err(InputError::Zero);
        }
        let minutes = minutes
            .checked_add(seconds / 60)
            .and_then(|m| u64::try_from(m).ok())
            .ok_or(InputError::Overflow)?;
        Ok(Self {
            minutes,
            seconds: (seconds % 60) as u8,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    pub fn total_secs(&self) -> Option<u64> {
        self.minutes
            .checked_mul(60)?
            .checked_add(u64::from(self.seconds))
    }

    /// One second less. Zero stays zero.
    pub fn decremented(self) -> Self {
        match (self.minutes, self.seconds) {
            (0, 0) => self,
            (m, 0) => Self::new(m - 1, 59),
            (m, s) => Self::new(m, s - 1),
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

// non-empty and all decimal digits, anything else counts as zero
fn field_value(text: &str) -> Result<i128, InputError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(0);
    }
    text.parse::<i128>().map_err(|_| InputError::Overflow)
}

/// Validates the two free-form countdown fields.
pub fn parse_countdown_input(minutes: &str, seconds: &str) -> Result<Remaining, InputError> {
    if minutes.is_empty() && seconds.is_empty() {
        return Err(InputError::Empty);
    }
    Remaining::from_parts(field_value(minutes)?, field_value(seconds)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownState {
    #[default]
    Idle,
    Running {
        remaining: Remaining,
        pending: TaskHandle,
    },
}

/// Outcome of delivering one tick to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running(Remaining),
    Finished,
    /// stale or unexpected tick, nothing changed
    Ignored,
}

#[derive(Debug, Default)]
pub struct CountdownSession {
    state: CountdownState,
}

impl CountdownSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, CountdownState::Running { .. })
    }

    pub fn remaining(&self) -> Option<Remaining> {
        match self.state {
            CountdownState::Running { remaining, .. } => Some(remaining),
            CountdownState::Idle => None,
        }
    }

    pub fn start(
        &mut self,
        minutes: &str,
        seconds: &str,
        scheduler: &mut dyn Scheduler,
    ) -> Result<Remaining, CountdownError> {
        if self.is_running() {
            return Err(CountdownError::AlreadyRunning);
        }
        let remaining = parse_countdown_input(minutes, seconds)?;
        let pending = scheduler.schedule(TICK_INTERVAL, Task::CountdownTick);
        self.state = CountdownState::Running { remaining, pending };
        info!(%remaining, total_secs = remaining.total_secs(), "countdown started");
        Ok(remaining)
    }

    pub fn on_tick(
        &mut self,
        handle: TaskHandle,
        scheduler: &mut dyn Scheduler,
    ) -> CountdownTick {
        let CountdownState::Running { remaining, pending } = self.state else {
            return CountdownTick::Ignored;
        };
        if pending != handle {
            debug!(?handle, ?pending, "stale countdown tick ignored");
            return CountdownTick::Ignored;
        }

        let remaining = remaining.decremented();
        if remaining.is_zero() {
            self.state = CountdownState::Idle;
            info!("countdown finished");
            return CountdownTick::Finished;
        }

        let pending = scheduler.schedule(TICK_INTERVAL, Task::CountdownTick);
        self.state = CountdownState::Running { remaining, pending };
        debug!(%remaining, "countdown tick");
        CountdownTick::Running(remaining)
    }

    /// Cancels a running countdown without finishing it.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) -> Option<Remaining> {
        let CountdownState::Running { remaining, pending } = self.state else {
            return None;
        };
        scheduler.cancel(pending);
        self.state = CountdownState::Idle;
        info!(%remaining, "countdown cancelled");
        Some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskQueue;
    use assert_matches::assert_matches;

    fn tick(session: &mut CountdownSession, queue: &mut TaskQueue) -> CountdownTick {
        let until = queue.now() + TICK_INTERVAL;
        let (handle, task) = queue.pop_due(until).expect("a tick should be armed");
        assert_eq!(task, Task::CountdownTick);
        session.on_tick(handle, queue)
    }

    #[test]
    fn field_parsing_policy() {
        assert_eq!(parse_countdown_input("2", "30"), Ok(Remaining::new(2, 30)));
        assert_eq!(parse_countdown_input("", "45"), Ok(Remaining::new(0, 45)));
        assert_eq!(parse_countdown_input("3", ""), Ok(Remaining::new(3, 0)));
        assert_eq!(parse_countdown_input("abc", "5"), Ok(Remaining::new(0, 5)));
        assert_eq!(parse_countdown_input("4", "x"), Ok(Remaining::new(4, 0)));
    }

    #[test]
    fn rejects_empty_zero_and_non_numeric() {
        assert_eq!(parse_countdown_input("", ""), Err(InputError::Empty));
        assert_eq!(parse_countdown_input("  ", ""), Err(InputError::Zero));
        assert_eq!(parse_countdown_input("0", "0"), Err(InputError::Zero));
        assert_eq!(parse_countdown_input("-1", "0"), Err(InputError::Zero));
        assert_eq!(parse_countdown_input("abc", "def"), Err(InputError::Zero));
    }

    #[test]
    fn padded_digits_are_not_a_number() {
        assert_eq!(parse_countdown_input(" 4 ", ""), Err(InputError::Zero));
        assert_eq!(parse_countdown_input("1", " 30"), Ok(Remaining::new(1, 0)));
        assert_eq!(parse_countdown_input("+5", ""), Err(InputError::Zero));
    }

    #[test]
    fn negative_parts_are_rejected() {
        assert_eq!(Remaining::from_parts(-1, 30), Err(InputError::Negative));
        assert_eq!(Remaining::from_parts(1, -30), Err(InputError::Negative));
    }

    #[test]
    fn huge_values_overflow() {
        let digits = "9".repeat(60);
        assert_eq!(parse_countdown_input(&digits, "0"), Err(InputError::Overflow));
    }

    #[test]
    fn seconds_above_a_minute_are_normalised() {
        assert_eq!(parse_countdown_input("0", "90"), Ok(Remaining::new(1, 30)));
        assert_eq!(parse_countdown_input("1", "120"), Ok(Remaining::new(3, 0)));
    }

    #[test]
    fn decrement_borrows_from_minutes() {
        assert_eq!(Remaining::new(1, 0).decremented(), Remaining::new(0, 59));
        assert_eq!(Remaining::new(1, 10).decremented(), Remaining::new(1, 9));
        assert_eq!(Remaining::new(0, 0).decremented(), Remaining::new(0, 0));
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(Remaining::new(2, 5).to_string(), "02:05");
    }

    #[test]
    fn start_arms_one_tick() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        assert_eq!(session.start("0", "5", &mut queue), Ok(Remaining::new(0, 5)));
        assert!(session.is_running());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(TICK_INTERVAL));
    }

    #[test]
    fn invalid_start_leaves_session_idle() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        assert_matches!(
            session.start("", "", &mut queue),
            Err(CountdownError::InvalidInput(InputError::Empty))
        );
        assert_eq!(session.state(), CountdownState::Idle);
        assert!(queue.is_empty());
    }

    #[test]
    fn second_start_is_rejected() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        session.start("1", "0", &mut queue).unwrap();
        assert_eq!(
            session.start("5", "0", &mut queue),
            Err(CountdownError::AlreadyRunning)
        );
        assert_eq!(session.remaining(), Some(Remaining::new(1, 0)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn runs_down_to_finished() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        session.start("0", "3", &mut queue).unwrap();

        assert_eq!(
            tick(&mut session, &mut queue),
            CountdownTick::Running(Remaining::new(0, 2))
        );
        assert_eq!(
            tick(&mut session, &mut queue),
            CountdownTick::Running(Remaining::new(0, 1))
        );
        assert_eq!(tick(&mut session, &mut queue), CountdownTick::Finished);
        assert!(!session.is_running());
        assert!(queue.is_empty());
    }

    #[test]
    fn stop_cancels_the_armed_tick() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        session.start("0", "5", &mut queue).unwrap();
        tick(&mut session, &mut queue);
        tick(&mut session, &mut queue);

        assert_eq!(session.stop(&mut queue), Some(Remaining::new(0, 3)));
        assert!(!session.is_running());
        assert!(queue.is_empty());
        assert_eq!(session.stop(&mut queue), None);
    }

    #[test]
    fn stale_handle_does_not_mutate_a_new_run() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        session.start("0", "5", &mut queue).unwrap();
        let CountdownState::Running { pending: old, .. } = session.state() else {
            panic!("expected running");
        };
        session.stop(&mut queue);
        session.start("1", "0", &mut queue).unwrap();

        assert_eq!(session.on_tick(old, &mut queue), CountdownTick::Ignored);
        assert_eq!(session.remaining(), Some(Remaining::new(1, 0)));
    }

    #[test]
    fn tick_while_idle_is_ignored() {
        let mut queue = TaskQueue::new();
        let mut session = CountdownSession::new();
        let handle = queue.schedule(TICK_INTERVAL, Task::CountdownTick);
        assert_eq!(session.on_tick(handle, &mut queue), CountdownTick::Ignored);
        assert_eq!(session.state(), CountdownState::Idle);
    }
}
