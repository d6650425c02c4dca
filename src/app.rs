use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    clock::{Clock, ClockReading},
    countdown::{
        CountdownError, CountdownSession, CountdownTick, Remaining, FINISHED_MESSAGE,
        INVALID_INPUT_MESSAGE,
    },
    notice::{NoticeBoard, NoticeKind},
    scheduler::{Scheduler, Task, TaskHandle, TaskQueue},
    timer::{TimerRecord, TimerSession},
    timer_log,
};

pub const CLOCK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_NOTICE_SECS: u64 = 5;

/// Settings resolved from the command line and config file
#[derive(Debug, Clone, PartialEq)]
pub struct AppOptions {
    pub timer_file: Option<PathBuf>,
    /// 0 keeps notices up until dismissed
    pub notice_secs: u64,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            timer_file: None,
            notice_secs: DEFAULT_NOTICE_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Focus {
    #[strum(serialize = "timer")]
    TimerButton,
    #[strum(serialize = "timer file")]
    TimerPath,
    #[strum(serialize = "minutes")]
    Minutes,
    #[strum(serialize = "seconds")]
    Seconds,
    #[strum(serialize = "countdown")]
    CountdownButton,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::TimerButton,
        Focus::TimerPath,
        Focus::Minutes,
        Focus::Seconds,
        Focus::CountdownButton,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text_field(self) -> bool {
        matches!(self, Focus::TimerPath | Focus::Minutes | Focus::Seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Application context: owns the scheduler, both sessions and what the
/// screen shows. Every state change runs through here on one thread.
pub struct App {
    clock: Box<dyn Clock>,
    scheduler: TaskQueue,
    pub reading: ClockReading,
    pub timer: TimerSession,
    pub countdown: CountdownSession,
    pub notices: NoticeBoard,
    default_timer_path: PathBuf,
    timer_path: PathBuf,
    pub path_input: String,
    pub minutes_input: String,
    pub seconds_input: String,
    pub focus: Focus,
    pub last_record: Option<TimerRecord>,
    notice_ttl: Option<Duration>,
}

impl App {
    pub fn new(clock: Box<dyn Clock>, options: AppOptions) -> Self {
        let default_timer_path = timer_log::default_path();
        let timer_path = options
            .timer_file
            .clone()
            .unwrap_or_else(|| default_timer_path.clone());
        let path_input = if timer_path == default_timer_path {
            String::new()
        } else {
            timer_path.display().to_string()
        };
        let reading = ClockReading::from_time(&clock.now());

        let mut app = Self {
            clock,
            scheduler: TaskQueue::new(),
            reading,
            timer: TimerSession::new(),
            countdown: CountdownSession::new(),
            notices: NoticeBoard::new(),
            default_timer_path,
            timer_path,
            path_input,
            minutes_input: String::new(),
            seconds_input: String::new(),
            focus: Focus::TimerButton,
            last_record: None,
            notice_ttl: (options.notice_secs > 0)
                .then(|| Duration::from_secs(options.notice_secs)),
        };
        app.on_clock_tick();
        app
    }

    pub fn scheduler(&self) -> &TaskQueue {
        &self.scheduler
    }

    pub fn timer_path(&self) -> &Path {
        &self.timer_path
    }

    pub fn default_timer_path(&self) -> &Path {
        &self.default_timer_path
    }

    /// Runs every task that falls due within the next `elapsed`, in order.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now().saturating_add(elapsed);
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            self.run_task(handle, task);
        }
        self.scheduler.advance_to(until);
    }

    fn run_task(&mut self, handle: TaskHandle, task: Task) {
        match task {
            Task::ClockTick => self.on_clock_tick(),
            Task::CountdownTick => self.on_countdown_tick(handle),
            Task::ExpireNotice(id) => {
                self.notices.expire(id);
            }
        }
    }

    fn on_clock_tick(&mut self) {
        self.reading = ClockReading::from_time(&self.clock.now());
        self.scheduler.schedule(CLOCK_INTERVAL, Task::ClockTick);
    }

    fn on_countdown_tick(&mut self, handle: TaskHandle) {
        match self.countdown.on_tick(handle, &mut self.scheduler) {
            CountdownTick::Running(remaining) => self.project_remaining(remaining),
            CountdownTick::Finished => {
                self.project_remaining(Remaining::default());
                self.raise_notice(NoticeKind::CountdownFinished, FINISHED_MESSAGE);
            }
            CountdownTick::Ignored => {}
        }
    }

    // the fields mirror the session, never the other way round
    fn project_remaining(&mut self, remaining: Remaining) {
        self.minutes_input = remaining.minutes.to_string();
        self.seconds_input = remaining.seconds.to_string();
    }

    fn raise_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let id = self.notices.raise(kind, message);
        if let Some(ttl) = self.notice_ttl {
            self.scheduler.schedule(ttl, Task::ExpireNotice(id));
        }
    }

    pub fn toggle_timer(&mut self) {
        if self.timer.is_running() {
            self.stop_timer();
        } else {
            self.start_timer();
        }
    }

    pub fn start_timer(&mut self) -> bool {
        self.timer.start(self.clock.now())
    }

    /// Stops the timer and logs the record. A failed write raises a notice;
    /// the timer is idle either way.
    pub fn stop_timer(&mut self) -> Option<TimerRecord> {
        let record = self.timer.stop(self.clock.now())?;
        if let Err(e) = timer_log::append(&self.timer_path, &record) {
            warn!(error = %e, "failed to write timer record");
            self.raise_notice(NoticeKind::WriteFailed, e.to_string());
        }
        self.last_record = Some(record.clone());
        Some(record)
    }

    /// Live timer seconds, if running
    pub fn timer_elapsed(&self) -> Option<u64> {
        self.timer.elapsed_secs(self.clock.now())
    }

    pub fn toggle_countdown(&mut self) {
        if self.countdown.is_running() {
            self.stop_countdown();
        } else {
            self.start_countdown();
        }
    }

    pub fn start_countdown(&mut self) -> bool {
        match self
            .countdown
            .start(&self.minutes_input, &self.seconds_input, &mut self.scheduler)
        {
            Ok(remaining) => {
                self.project_remaining(remaining);
                true
            }
            Err(CountdownError::InvalidInput(e)) => {
                debug!(error = %e, "countdown input rejected");
                self.raise_notice(NoticeKind::InvalidInput, INVALID_INPUT_MESSAGE);
                false
            }
            Err(CountdownError::AlreadyRunning) => false,
        }
    }

    pub fn stop_countdown(&mut self) -> Option<Remaining> {
        let remaining = self.countdown.stop(&mut self.scheduler)?;
        self.project_remaining(remaining);
        Some(remaining)
    }

    /// Result of the external file chooser. Empty means cancelled.
    pub fn choose_timer_file(&mut self, chosen: &str) {
        let chosen = chosen.trim();
        if chosen.is_empty() {
            return;
        }
        self.path_input = chosen.to_string();
        self.sync_timer_path();
    }

    // an empty field falls back to the default path shown as placeholder
    fn sync_timer_path(&mut self) {
        self.timer_path = if self.path_input.trim().is_empty() {
            self.default_timer_path.clone()
        } else {
            PathBuf::from(self.path_input.trim())
        };
        debug!(path = %self.timer_path.display(), "timer file changed");
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::TimerPath => Some(&mut self.path_input),
            Focus::Minutes | Focus::Seconds if self.countdown.is_running() => None,
            Focus::Minutes => Some(&mut self.minutes_input),
            Focus::Seconds => Some(&mut self.seconds_input),
            Focus::TimerButton | Focus::CountdownButton => None,
        }
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(input) = self.focused_input() else {
            return;
        };
        edit(input);
        if self.focus == Focus::TimerPath {
            self.sync_timer_path();
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::TimerButton => self.toggle_timer(),
            Focus::Minutes | Focus::Seconds | Focus::CountdownButton => self.toggle_countdown(),
            Focus::TimerPath => {}
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
            KeyCode::Char('t') if ctrl => self.toggle_timer(),
            KeyCode::Char('d') if ctrl => self.toggle_countdown(),
            KeyCode::Char('u') if ctrl => self.edit_focused(|s| s.clear()),
            KeyCode::Esc => {
                if self.notices.dismiss_front().is_none() {
                    return KeyOutcome::Quit;
                }
            }
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => self.activate(),
            KeyCode::Char(' ') if !self.focus.is_text_field() => self.activate(),
            KeyCode::Backspace => self.edit_focused(|s| {
                s.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit_focused(|s| s.push(c)),
            _ => {}
        }
        KeyOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Local, TimeZone};
    use tempfile::tempdir;

    fn clock() -> FixedClock {
        FixedClock::new(Local.with_ymd_and_hms(2023, 5, 11, 9, 0, 0).unwrap())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::TimerButton.next(), Focus::TimerPath);
        assert_eq!(Focus::CountdownButton.next(), Focus::TimerButton);
        assert_eq!(Focus::TimerButton.prev(), Focus::CountdownButton);
    }

    #[test]
    fn clock_reading_refreshes_every_second() {
        let clock = clock();
        let mut app = App::new(Box::new(clock.clone()), AppOptions::default());
        assert_eq!(app.reading.time, "9:0:0");
        assert_eq!(app.reading.weekday, "Thursday");

        clock.advance(chrono::Duration::seconds(1));
        app.advance(Duration::from_millis(999));
        assert_eq!(app.reading.time, "9:0:0");
        app.advance(Duration::from_millis(1));
        assert_eq!(app.reading.time, "9:0:1");
    }

    #[test]
    fn typing_into_path_field_changes_timer_path() {
        let mut app = App::new(Box::new(clock()), AppOptions::default());
        app.focus = Focus::TimerPath;
        for c in "/tmp/x.txt".chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.timer_path(), Path::new("/tmp/x.txt"));

        app.on_key(ctrl('u'));
        assert_eq!(app.timer_path(), app.default_timer_path());
    }

    #[test]
    fn cancelled_chooser_keeps_path() {
        let options = AppOptions {
            timer_file: Some(PathBuf::from("/tmp/a.txt")),
            ..AppOptions::default()
        };
        let mut app = App::new(Box::new(clock()), options);
        app.choose_timer_file("");
        assert_eq!(app.timer_path(), Path::new("/tmp/a.txt"));
        app.choose_timer_file("/tmp/b.txt");
        assert_eq!(app.timer_path(), Path::new("/tmp/b.txt"));
        assert_eq!(app.path_input, "/tmp/b.txt");
    }

    #[test]
    fn countdown_fields_are_locked_while_running() {
        let mut app = App::new(Box::new(clock()), AppOptions::default());
        app.focus = Focus::Seconds;
        app.on_key(key(KeyCode::Char('9')));
        app.on_key(key(KeyCode::Enter));
        assert!(app.countdown.is_running());

        app.on_key(key(KeyCode::Char('5')));
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.seconds_input, "9");
    }

    #[test]
    fn esc_dismisses_notice_before_quitting() {
        let mut app = App::new(Box::new(clock()), AppOptions::default());
        app.on_key(ctrl('d'));
        assert!(app.notices.has_visible());

        assert_eq!(app.on_key(key(KeyCode::Esc)), KeyOutcome::Continue);
        assert!(!app.notices.has_visible());
        assert_eq!(app.on_key(key(KeyCode::Esc)), KeyOutcome::Quit);
    }

    #[test]
    fn notices_expire_after_ttl() {
        let options = AppOptions {
            notice_secs: 3,
            ..AppOptions::default()
        };
        let mut app = App::new(Box::new(clock()), options);
        app.start_countdown();
        assert!(app.notices.has_visible());
        app.advance(Duration::from_secs(3));
        assert!(!app.notices.has_visible());
    }

    #[test]
    fn zero_ttl_keeps_notices() {
        let options = AppOptions {
            notice_secs: 0,
            ..AppOptions::default()
        };
        let mut app = App::new(Box::new(clock()), options);
        app.start_countdown();
        app.advance(Duration::from_secs(600));
        assert!(app.notices.has_visible());
    }

    #[test]
    fn enormous_ttl_does_not_overflow_the_schedule() {
        let options = AppOptions {
            notice_secs: u64::MAX,
            ..AppOptions::default()
        };
        let mut app = App::new(Box::new(clock()), options);
        app.advance(Duration::from_secs(1));
        app.focus = Focus::CountdownButton;
        app.on_key(key(KeyCode::Enter));

        assert!(app.notices.has_visible());
        app.advance(Duration::from_secs(3600));
        assert!(app.notices.has_visible());
    }

    #[test]
    fn ctrl_t_toggles_timer_and_writes_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let clock = clock();
        let options = AppOptions {
            timer_file: Some(path.clone()),
            ..AppOptions::default()
        };
        let mut app = App::new(Box::new(clock.clone()), options);

        app.on_key(ctrl('t'));
        assert!(app.timer.is_running());
        clock.advance(chrono::Duration::seconds(12));
        assert_eq!(app.timer_elapsed(), Some(12));
        app.on_key(ctrl('t'));
        assert!(!app.timer.is_running());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Start time - End time - Duration\n9:0:0 - 9:0:12 - 12\n"
        );
        assert_eq!(app.last_record.as_ref().unwrap().duration_secs, 12);
    }

    #[test]
    fn space_activates_buttons_but_types_in_fields() {
        let mut app = App::new(Box::new(clock()), AppOptions::default());
        app.focus = Focus::TimerPath;
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.path_input, " ");
        assert!(!app.timer.is_running());

        app.focus = Focus::TimerButton;
        app.on_key(key(KeyCode::Char(' ')));
        assert!(app.timer.is_running());
    }
}
