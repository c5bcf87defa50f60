// History tab rendering.
// - Filter bar and title search above the entry list.
// - Rows are width-aware so wide titles do not push the path off screen.
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{app::App, model::HistoryFilter, store::HistoryEntry, theme::Theme};

use super::{super::pane_border_style, hint, input_line, row, truncate_to_width};

pub fn render_history_tab(frame: &mut Frame, app: &App, area: Rect) {
    let [filters, list, details] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(3),
        Constraint::Length(5),
    ])
    .areas(area);

    render_filter_bar(frame, app, filters);
    render_history_list(frame, app, list);
    render_history_details(frame, app, details);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut filter_spans = vec![Span::raw("Filter (f): ")];
    for filter in HistoryFilter::ALL {
        let label = format!(" {} ", app.t(filter.label_key()));
        let style = if filter == app.history_filter {
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        filter_spans.push(Span::styled(label, style));
        filter_spans.push(Span::raw(" "));
    }

    let cursor = app
        .history_searching
        .then_some(app.history_search.cursor());
    let lines = vec![
        Line::from(filter_spans),
        input_line(
            theme,
            &format!("{} (/)", app.t("search")),
            app.history_search.value(),
            cursor,
        ),
    ];

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border_style(app.history_searching, theme.accent, theme))
                .title(app.t("download_history")),
        )
        .alignment(Alignment::Left);

    frame.render_widget(panel, area);
}

fn render_history_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let entries = app.visible_history();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(pane_border_style(!app.history_searching, theme.accent, theme))
        .title(format!("{} entries", entries.len()));

    if entries.is_empty() {
        let empty = Paragraph::new(hint(theme, app.t("no_history"))).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let row_width = block.inner(area).width as usize;
    let items = entries
        .iter()
        .map(|entry| ListItem::new(history_row(theme, entry, row_width)))
        .collect::<Vec<_>>();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.history_selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn history_row(theme: &Theme, entry: &HistoryEntry, width: usize) -> Line<'static> {
    let kind = format!("[{:<5}] ", entry.kind.label());
    let profile = entry
        .profile
        .as_ref()
        .map(|handle| format!("  @{handle}"))
        .unwrap_or_default();
    let fixed = kind.len() + entry.date.len() + 2 + profile.len() + 2;
    let title = truncate_to_width(&entry.title, width.saturating_sub(fixed));

    Line::from(vec![
        Span::styled(kind, Style::default().fg(theme.accent)),
        Span::styled(entry.date.clone(), Style::default().fg(theme.muted)),
        Span::raw("  "),
        Span::styled(title, Style::default().fg(theme.text)),
        Span::styled(profile, Style::default().fg(theme.secondary)),
    ])
}

fn render_history_details(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let lines = match app.selected_history_entry() {
        Some(entry) => vec![
            row(theme, "URL", entry.url.clone()),
            row(theme, "Path", entry.path.clone()),
            hint(
                theme,
                "Enter/o: open  O: folder  r: download again  d: delete  C: clear all",
            ),
        ],
        None => vec![hint(theme, "Press / to search, f to change the filter.")],
    };

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted))
                .title("Details"),
        )
        .alignment(Alignment::Left);

    frame.render_widget(panel, area);
}
