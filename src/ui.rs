pub mod field;
pub mod popup;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{
    app::{App, Focus},
    timer_log,
};

use self::field::{button, text_field};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // time
                Constraint::Length(1), // weekday
                Constraint::Length(1), // date
                Constraint::Length(1), // padding
                Constraint::Length(5), // timer panel
                Constraint::Length(5), // countdown panel
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            self.reading.time.clone(),
            bold_style.fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(self.reading.weekday.clone())
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(self.reading.date.clone(), dim_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        render_timer_panel(self, chunks[4], buf);
        render_countdown_panel(self, chunks[5], buf);

        Paragraph::new(Span::styled(
            format!(
                "[{}] (tab) focus / (enter) toggle / (ctrl+t) timer / (ctrl+d) countdown / (esc)ape",
                self.focus
            ),
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

        if let Some(notice) = self.notices.front() {
            popup::render_notice(notice, area, buf);
        }
    }
}

fn render_timer_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Timer");
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 3])
        .split(inner);

    let running = app.timer.is_running();
    let label = if running { "Stop timer" } else { "Start timer" };
    let mut spans = vec![button(label, running, app.focus == Focus::TimerButton)];
    if let Some(secs) = app.timer_elapsed() {
        spans.push(Span::raw(format!("  {secs}s")));
    }
    Paragraph::new(Line::from(spans)).render(rows[0], buf);

    let placeholder = app.default_timer_path().display().to_string();
    let path_width = rows[1].width.saturating_sub(6) as usize;
    Paragraph::new(Line::from(vec![
        Span::raw("file "),
        text_field(
            &app.path_input,
            &placeholder,
            path_width,
            app.focus == Focus::TimerPath,
        ),
    ]))
    .render(rows[1], buf);

    if let Some(record) = &app.last_record {
        Paragraph::new(Span::styled(
            format!("last: {}", timer_log::format_record(record)),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .render(rows[2], buf);
    }
}

fn render_countdown_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Countdown");
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 3])
        .split(inner);

    let locked = app.countdown.is_running();
    let field = |text: &str, placeholder: &str, focus: Focus| {
        let span = text_field(text, placeholder, 4, app.focus == focus && !locked);
        if locked {
            span.patch_style(Style::default().fg(Color::Yellow))
        } else {
            span
        }
    };

    Paragraph::new(Line::from(vec![
        field(&app.minutes_input, "Min", Focus::Minutes),
        Span::raw(" : "),
        field(&app.seconds_input, "Sec", Focus::Seconds),
    ]))
    .alignment(Alignment::Center)
    .render(rows[0], buf);

    Paragraph::new(Span::styled(
        "min    sec",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(rows[1], buf);

    let label = if locked {
        "Stop countdown"
    } else {
        "Start countdown"
    };
    Paragraph::new(button(label, locked, app.focus == Focus::CountdownButton))
        .alignment(Alignment::Center)
        .render(rows[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::clock::FixedClock;
    use chrono::{Local, TimeZone};
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;
    use std::time::Duration;

    fn create_test_app() -> App {
        let clock = FixedClock::new(Local.with_ymd_and_hms(2023, 5, 11, 14, 3, 9).unwrap());
        let options = AppOptions {
            timer_file: Some(PathBuf::from("/tmp/tickclock-ui-test.txt")),
            notice_secs: 0,
        };
        App::new(Box::new(clock), options)
    }

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn shows_clock_face() {
        let content = rendered(&create_test_app());
        assert!(content.contains("14:3:9"));
        assert!(content.contains("Thursday"));
        assert!(content.contains("11.5.2023"));
    }

    #[test]
    fn button_labels_follow_state() {
        let mut app = create_test_app();
        let content = rendered(&app);
        assert!(content.contains("Start timer"));
        assert!(content.contains("Start countdown"));

        app.start_timer();
        app.minutes_input = "1".into();
        app.start_countdown();
        let content = rendered(&app);
        assert!(content.contains("Stop timer"));
        assert!(content.contains("Stop countdown"));
    }

    #[test]
    fn countdown_fields_show_live_values() {
        let mut app = create_test_app();
        app.minutes_input = "1".into();
        app.start_countdown();
        app.advance(Duration::from_secs(1));
        let content = rendered(&app);
        assert!(content.contains("0 : 59"));
    }

    #[test]
    fn notice_popup_is_drawn_over_the_ui() {
        let mut app = create_test_app();
        app.start_countdown();
        let content = rendered(&app);
        assert!(content.contains("Please enter a valid time"));
    }

    #[test]
    fn draws_through_a_terminal() {
        let mut app = create_test_app();
        app.choose_timer_file("/tmp/hours.txt");

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("/tmp/hours.txt"));
    }

    #[test]
    fn survives_tiny_terminals() {
        let app = create_test_app();
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
    }
}
