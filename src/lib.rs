// Everything except terminal setup, logging and argument parsing lives here,
// so the app can be driven without a tty.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod history;
pub mod notice;
pub mod runtime;
pub mod scheduler;
pub mod timer;
pub mod timer_log;
pub mod ui;
