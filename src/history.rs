use itertools::Itertools;
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::timer_log::{LoggedInterval, SEPARATOR};

/// Totals over a parsed timer log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub total_secs: u64,
    pub longest_secs: u64,
}

impl HistorySummary {
    pub fn from_entries(entries: &[LoggedInterval]) -> Self {
        Self {
            sessions: entries.len(),
            total_secs: entries.iter().map(|e| e.duration_secs).sum(),
            longest_secs: entries.iter().map(|e| e.duration_secs).max().unwrap_or(0),
        }
    }
}

pub fn humanize_secs(secs: u64) -> String {
    if secs == 0 {
        return "0 seconds".to_string();
    }
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Precise, Tense::Present)
}

/// Plain-text report printed by the `history` subcommand
pub fn render_report(entries: &[LoggedInterval]) -> String {
    let summary = HistorySummary::from_entries(entries);
    let lines = entries
        .iter()
        .map(|e| {
            format!(
                "{}{SEPARATOR}{}{SEPARATOR}{}",
                e.start.format("%H:%M:%S"),
                e.end.format("%H:%M:%S"),
                e.duration_secs
            )
        })
        .join("\n");

    let mut report = String::new();
    if !lines.is_empty() {
        report.push_str(&lines);
        report.push_str("\n\n");
    }
    report.push_str(&format!(
        "{} session(s), total {}, longest {}",
        summary.sessions,
        humanize_secs(summary.total_secs),
        humanize_secs(summary.longest_secs),
    ));
    report
}
