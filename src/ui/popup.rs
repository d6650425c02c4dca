use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::notice::{Notice, NoticeKind};

const POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 5;

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}

pub fn render_notice(notice: &Notice, area: Rect, buf: &mut Buffer) {
    let color = match notice.kind {
        NoticeKind::CountdownFinished => Color::Green,
        NoticeKind::InvalidInput | NoticeKind::WriteFailed => Color::Red,
    };
    let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);

    Clear.render(popup, buf);
    Paragraph::new(notice.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(notice.kind.to_string())
                .title_bottom("(esc) dismiss")
                .border_style(Style::default().fg(color)),
        )
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}
