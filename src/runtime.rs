use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tracing::{debug, warn};

use crate::app::{App, KeyOutcome};

/// How long one step waits for input before letting time catch up
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Input the loop cares about. Anything else is dropped at the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
}

pub trait EventSource {
    /// Waits up to `timeout`. `None` means nothing arrived in time.
    fn next_event(&self, timeout: Duration) -> Option<AppEvent>;
}

/// Events delivered over a channel, either from the terminal reader thread
/// or straight from a test.
pub struct ChannelEvents {
    rx: Receiver<AppEvent>,
}

impl ChannelEvents {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// Spawns the thread that blocks on crossterm and forwards key presses
    /// and resizes. The thread ends once the receiving side is gone.
    pub fn from_terminal() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let forwarded = match event::read() {
                // windows reports releases as well
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(Event::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    warn!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self::new(rx)
    }
}

impl EventSource for ChannelEvents {
    fn next_event(&self, timeout: Duration) -> Option<AppEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            // no more input, but the clock and countdown keep going
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                None
            }
        }
    }
}

/// Reports how much time passed since the previous lap
pub trait Stopwatch {
    fn lap(&mut self) -> Duration;
}

#[derive(Debug)]
pub struct MonotonicStopwatch {
    last: Instant,
}

impl MonotonicStopwatch {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for MonotonicStopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch for MonotonicStopwatch {
    fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }
}

/// Every lap is exactly `step` long, whatever the wall clock says.
#[derive(Clone, Copy, Debug)]
pub struct SteppedStopwatch {
    step: Duration,
}

impl SteppedStopwatch {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Stopwatch for SteppedStopwatch {
    fn lap(&mut self) -> Duration {
        self.step
    }
}

/// Drives an [`App`]: waits for input, feeds the elapsed time to the app's
/// scheduler, then applies the input.
pub struct Runner<E: EventSource, S: Stopwatch> {
    events: E,
    stopwatch: S,
    poll: Duration,
}

impl<E: EventSource, S: Stopwatch> Runner<E, S> {
    pub fn new(events: E, stopwatch: S, poll: Duration) -> Self {
        Self {
            events,
            stopwatch,
            poll,
        }
    }

    /// One turn of the loop. Due tasks run before the key is handled, so a
    /// key always sees the countdown as of the moment it arrived.
    pub fn step(&mut self, app: &mut App) -> KeyOutcome {
        let event = self.events.next_event(self.poll);
        app.advance(self.stopwatch.lap());

        match event {
            Some(AppEvent::Key(key)) => {
                debug!(code = ?key.code, modifiers = ?key.modifiers, "key");
                app.on_key(key)
            }
            Some(AppEvent::Resize) | None => KeyOutcome::Continue,
        }
    }
}

impl Runner<ChannelEvents, MonotonicStopwatch> {
    pub fn for_terminal() -> Self {
        Self::new(
            ChannelEvents::from_terminal(),
            MonotonicStopwatch::new(),
            POLL_INTERVAL,
        )
    }
}
