// Tab renderers and the form widgets they share.
// - Each tab module draws one `Tab` from `App` state only.
// - Form lines are fixed label column + value; the active field is inverted.
pub mod download;
pub mod history;
pub mod settings;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Theme;

const LABEL_COL_WIDTH: usize = 16;

fn section(theme: &Theme, title: &str) -> Line<'static> {
    Line::styled(
        title.to_string(),
        Style::default()
            .fg(theme.section)
            .add_modifier(Modifier::BOLD),
    )
}

fn warning(theme: &Theme, message: &str) -> Line<'static> {
    Line::styled(
        message.to_string(),
        Style::default()
            .fg(theme.danger)
            .add_modifier(Modifier::BOLD),
    )
}

fn hint(theme: &Theme, message: &str) -> Line<'static> {
    Line::styled(message.to_string(), Style::default().fg(theme.muted))
}

fn row(theme: &Theme, label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            label_cell(label),
            Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(value, Style::default().fg(theme.text)),
    ])
}

fn input_line(theme: &Theme, label: &str, value: &str, active_cursor: Option<usize>) -> Line<'static> {
    let active = active_cursor.is_some();
    let value_style = input_value_style(theme, active);
    let cursor_style = Style::default()
        .fg(theme.selection_fg)
        .bg(theme.text)
        .add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(label_cell(label), input_label_style(theme, active)),
        Span::raw("  "),
    ];

    let chars = value.chars().collect::<Vec<_>>();
    let cursor = active_cursor.unwrap_or(0).min(chars.len());

    for (index, ch) in chars.iter().enumerate() {
        let style = if active && index == cursor {
            cursor_style
        } else {
            value_style
        };
        spans.push(Span::styled(ch.to_string(), style));
    }

    if active && cursor == chars.len() {
        spans.push(Span::styled(" ".to_string(), cursor_style));
    }

    Line::from(spans)
}

fn choice_line(theme: &Theme, label: &str, value: &str, active: bool) -> Line<'static> {
    let value = if active {
        format!("< {value} >")
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(label_cell(label), input_label_style(theme, active)),
        Span::raw("  "),
        Span::styled(value, input_value_style(theme, active)),
    ])
}

fn checkbox_line(theme: &Theme, label: &str, checked: bool, active: bool) -> Line<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    Line::from(vec![
        Span::styled(mark.to_string(), input_value_style(theme, active)),
        Span::raw(" "),
        Span::styled(label.to_string(), input_label_style(theme, active)),
    ])
}

fn label_cell(label: &str) -> String {
    let padding = LABEL_COL_WIDTH.saturating_sub(display_width(label));
    format!("{label}{}", " ".repeat(padding))
}

fn input_label_style(theme: &Theme, active: bool) -> Style {
    if active {
        Style::default()
            .fg(theme.selection_fg)
            .bg(theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    }
}

fn input_value_style(theme: &Theme, active: bool) -> Style {
    if active {
        Style::default()
            .fg(theme.selection_fg)
            .bg(theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    }
}

fn display_width(value: &str) -> usize {
    UnicodeWidthStr::width(value)
}

/// Cuts `value` to at most `max_width` terminal cells, marking the cut with `…`.
fn truncate_to_width(value: &str, max_width: usize) -> String {
    if display_width(value) <= max_width {
        return value.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut width = 0;
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if ch_width > 0 && width + ch_width > max_width - 1 {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_wide_characters() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
        // Each CJK character takes two cells.
        assert_eq!(truncate_to_width("日本語の動画", 7), "日本語…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn label_cells_pad_by_display_width() {
        assert_eq!(display_width(&label_cell("URL")), LABEL_COL_WIDTH);
        assert_eq!(label_cell("日本"), format!("日本{}", " ".repeat(LABEL_COL_WIDTH - 4)));
        let long = "a".repeat(LABEL_COL_WIDTH + 3);
        assert_eq!(label_cell(&long), long);
    }
}
