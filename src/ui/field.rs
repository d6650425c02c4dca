use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CURSOR: char = '▏';

/// Keeps the tail of `text` so it fits in `width` columns
pub fn fit_tail(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut used = 1; // for the ellipsis
    let mut tail: Vec<char> = Vec::new();
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        tail.push(c);
    }
    std::iter::once('…').chain(tail.into_iter().rev()).collect()
}

/// Editable field, falls back to a dim placeholder when empty
pub fn text_field(text: &str, placeholder: &str, width: usize, focused: bool) -> Span<'static> {
    let mut style = Style::default();
    let mut shown = if text.is_empty() {
        style = style.add_modifier(Modifier::DIM);
        placeholder.to_string()
    } else {
        text.to_string()
    };
    if focused {
        style = style.add_modifier(Modifier::UNDERLINED);
        if !text.is_empty() {
            shown.push(CURSOR);
        }
    }
    Span::styled(fit_tail(&shown, width.max(1)), style)
}

pub fn button(label: &str, active: bool, focused: bool) -> Span<'static> {
    let mut style = if active {
        Style::default().fg(Color::White).bg(Color::Red)
    } else {
        Style::default().fg(Color::White).bg(Color::Blue)
    };
    if focused {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    Span::styled(format!(" {label} "), style)
}
