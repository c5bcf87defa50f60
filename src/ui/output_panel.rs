// Scrollable tool-output panel.
// - Sizes the scroll window to the panel before drawing; tail-follow stays pinned.
// - stderr and failure lines use the danger color.
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{app::OutputLog, theme::Theme};

use super::pane_border_style;

pub struct LogPanelStateView<'a> {
    pub title: &'a str,
    pub log: &'a OutputLog,
    pub focused: bool,
    pub accent_color: Color,
}

pub fn render_log_panel(frame: &mut Frame, area: Rect, theme: &Theme, panel: LogPanelStateView<'_>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(pane_border_style(panel.focused, panel.accent_color, theme))
        .title(panel.title);
    let visible_lines = block.inner(area).height as usize;
    let scroll = panel.log.scroll_for_viewport(visible_lines);

    let lines = panel
        .log
        .lines()
        .iter()
        .map(|line| {
            if line.starts_with("stderr:") || line.starts_with("failed") {
                Line::styled(line.as_str(), Style::default().fg(theme.danger))
            } else {
                Line::from(line.as_str())
            }
        })
        .collect::<Vec<_>>();

    let widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));

    frame.render_widget(widget, area);
}
