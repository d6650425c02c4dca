use chrono::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::timer::TimerRecord;

pub const HEADER: &str = "Start time - End time - Duration";
pub const SEPARATOR: &str = " - ";
pub const DEFAULT_FILE_NAME: &str = "time.txt";

#[derive(Debug, Error)]
pub enum TimerLogError {
    #[error("could not access timer file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: malformed timer record {text:?}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        text: String,
    },
}

impl TimerLogError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `<cwd>/time.txt`, falling back to a relative path if the cwd is gone
pub fn default_path() -> PathBuf {
    std::env::current_dir()
        .map(|dir| dir.join(DEFAULT_FILE_NAME))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FILE_NAME))
}

pub fn format_record(record: &TimerRecord) -> String {
    format!(
        "{}:{}:{}{SEPARATOR}{}:{}:{}{SEPARATOR}{}",
        record.start.hour(),
        record.start.minute(),
        record.start.second(),
        record.end.hour(),
        record.end.minute(),
        record.end.second(),
        record.duration_secs,
    )
}

/// Appends `record` to the log at `path`, creating it with a header first.
pub fn append(path: &Path, record: &TimerRecord) -> Result<(), TimerLogError> {
    // If the log doesn't exist yet, we need to emit a header
    let needs_header = !path.exists();

    let mut log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| TimerLogError::io(path, e))?;

    let mut text = String::new();
    if needs_header {
        text.push_str(HEADER);
        text.push('\n');
    }
    text.push_str(&format_record(record));
    text.push('\n');

    log_file
        .write_all(text.as_bytes())
        .and_then(|_| log_file.flush())
        .map_err(|e| TimerLogError::io(path, e))?;

    if needs_header {
        info!(path = %path.display(), "timer file created");
    }
    debug!(path = %path.display(), line = %format_record(record), "timer record appended");
    Ok(())
}

/// A record line read back from a log file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration_secs: u64,
}

pub fn parse_line(line: &str) -> Option<LoggedInterval> {
    let mut parts = line.trim().split(SEPARATOR);
    let start = parse_time(parts.next()?)?;
    let end = parse_time(parts.next()?)?;
    let duration_secs = parse_duration(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(LoggedInterval {
        start,
        end,
        duration_secs,
    })
}

// H:M:S without padding, so chrono's strict formats don't apply
fn parse_time(text: &str) -> Option<NaiveTime> {
    let mut fields = text.trim().split(':').map(|f| f.parse::<u32>().ok());
    let (h, m, s) = (fields.next()??, fields.next()??, fields.next()??);
    if fields.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(h, m, s)
}

// older logs carry float seconds such as `65.0`
fn parse_duration(text: &str) -> Option<u64> {
    let text = text.trim();
    text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| secs.round() as u64)
    })
}

/// Reads every record of the log at `path`, skipping the header and blank lines.
pub fn read_log(path: &Path) -> Result<Vec<LoggedInterval>, TimerLogError> {
    let contents = fs::read_to_string(path).map_err(|e| TimerLogError::io(path, e))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && line.trim() != HEADER)
        .map(|(idx, line)| {
            parse_line(line).ok_or_else(|| TimerLogError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                text: line.to_string(),
            })
        })
        .collect()
}
