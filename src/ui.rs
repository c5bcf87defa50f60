// Root UI composition and shared visual components.
// - Builds the global layout (tab bar + active tab + status line + footer).
// - Renders shared chrome: keybind popup and confirm modals.
// - Delegates tab-specific rendering to ui::tabs submodules.
mod output_panel;
mod tabs;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};

use crate::{
    app::{App, PendingConfirm},
    model::Tab,
    theme::Theme,
};

pub fn render(frame: &mut Frame, app: &App) {
    let [tabs_area, content, status, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_tab_bar(frame, app, tabs_area);

    match app.tab {
        Tab::Download => tabs::download::render_download_tab(frame, app, content),
        Tab::History => tabs::history::render_history_tab(frame, app, content),
        Tab::Settings => tabs::settings::render_settings_tab(frame, app, content),
    }

    render_status_line(frame, app, status);
    render_footer_hint(frame, app, footer);
    if app.show_keybinds {
        render_keybinds_popup(frame, app);
    }
    if let Some(pending) = app.pending_confirm() {
        render_confirm_modal(frame, app, pending);
    }
}

fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme;
    let selected = Tab::ALL
        .iter()
        .position(|tab| *tab == app.tab)
        .unwrap_or(0);
    let labels = Tab::ALL
        .iter()
        .map(|tab| Line::from(format!(" {} {} ", tab.number(), app.t(tab.label_key()))))
        .collect::<Vec<_>>();

    let tabs = Tabs::new(labels)
        .select(selected)
        .divider(Span::styled("|", Style::default().fg(theme.muted)))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title_top(Line::from(app.t("app_title")).left_aligned())
                .title_top(Line::styled("(ctrl+n)", Style::default().fg(theme.muted)).right_aligned())
                .border_style(Style::default().fg(theme.accent)),
        );

    frame.render_widget(tabs, area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if app.is_busy() {
        spans.push(Span::styled(
            format!("{} ", app.spinner_glyph()),
            Style::default().fg(app.theme.accent),
        ));
    }
    spans.push(Span::styled(
        app.status_message.clone(),
        Style::default().fg(app.theme.text),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer_hint(frame: &mut Frame, app: &App, area: Rect) {
    let hint = Paragraph::new(Line::styled(
        "Press F1 (or ? outside text fields) to see keyboard shortcuts",
        Style::default().fg(app.theme.muted),
    ))
    .alignment(Alignment::Left);
    frame.render_widget(hint, area);
}

fn render_keybinds_popup(frame: &mut Frame, app: &App) {
    let popup = centered(frame.area(), 70, 70);
    frame.render_widget(Clear, popup);

    let theme = &app.theme;
    let lines = vec![
        Line::from("Press F1, ? or Esc to close this window."),
        Line::from(""),
        keybind_section(theme, "GLOBAL"),
        keybind_row(theme, "F1 / ?", "toggle keybinds popup"),
        keybind_row(theme, "Ctrl+c / q", "quit app (q outside text fields)"),
        keybind_row(theme, "Ctrl+n", "next tab"),
        keybind_row(theme, "Ctrl+Left/Right", "previous / next tab"),
        keybind_row(theme, "paste", "bracketed paste goes into the focused text field"),
        keybind_row(theme, "1 / 2 / 3", "jump to tab (outside text fields)"),
        keybind_row(theme, "Up/Down or j/k", "scroll keybinds"),
        Line::from(""),
        keybind_section(theme, "DOWNLOAD"),
        keybind_row(theme, "Enter", "start download (URL, profile, or staged batch)"),
        keybind_row(theme, "Tab / Shift+Tab", "URL, output folder, file name"),
        keybind_row(theme, "Ctrl+b", "import the link file named in the URL field"),
        keybind_row(theme, "Ctrl+f", "fetch profile info for a profile URL"),
        keybind_row(theme, "Ctrl+t", "toggle convert to MP3"),
        keybind_row(theme, "Ctrl+p", "pause / resume"),
        keybind_row(theme, "Ctrl+x", "stop (confirm modal)"),
        keybind_row(theme, "Ctrl+w", "clear the focused field"),
        keybind_row(theme, "Ctrl+g", "open the download folder"),
        keybind_row(theme, "Ctrl+o", "toggle focus on tool output"),
        Line::from(""),
        keybind_section(theme, "TOOL OUTPUT"),
        keybind_row(theme, "j/k or Up/Down", "scroll output"),
        keybind_row(theme, "Ctrl+u / Ctrl+d", "page up / page down"),
        keybind_row(theme, "Esc", "back to the URL field"),
        Line::from(""),
        keybind_section(theme, "HISTORY"),
        keybind_row(theme, "j/k or Up/Down", "move selection"),
        keybind_row(theme, "f", "cycle filter (all/video/mp3/profile)"),
        keybind_row(theme, "/", "search titles (Enter or Esc to finish)"),
        keybind_row(theme, "Enter / o", "open file"),
        keybind_row(theme, "O", "open containing folder"),
        keybind_row(theme, "r", "download again"),
        keybind_row(theme, "d", "delete entry (confirm modal)"),
        keybind_row(theme, "C", "clear all history (confirm modal)"),
        Line::from(""),
        keybind_section(theme, "SETTINGS"),
        keybind_row(theme, "Tab / Shift+Tab", "move between fields"),
        keybind_row(theme, "Left/Right", "change choice or move cursor"),
        keybind_row(theme, "Space", "toggle checkbox"),
        keybind_row(theme, "Ctrl+s", "save settings"),
        keybind_row(theme, "Ctrl+r", "reset to defaults (confirm modal)"),
        keybind_row(theme, "Ctrl+u", "update yt-dlp now"),
        keybind_row(theme, "Ctrl+e / Ctrl+l", "export / import settings file"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Keybinds")
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(popup);
    let visible_line_count = inner.height.max(1) as usize;
    let max_scroll_top = lines.len().saturating_sub(visible_line_count);
    let scroll_top = app.clamp_keybinds_scroll(max_scroll_top);
    let popup_widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .scroll((scroll_top.min(u16::MAX as usize) as u16, 0));

    frame.render_widget(popup_widget, popup);
}

fn render_confirm_modal(frame: &mut Frame, app: &App, pending: &PendingConfirm) {
    let (title, question, details) = match pending {
        PendingConfirm::StopDownload => (
            "Confirm Stop",
            "Stop the running download?",
            vec!["Files already saved are kept.".to_string()],
        ),
        PendingConfirm::DeleteHistory(entry) => (
            "Confirm Delete",
            "Remove this entry from history?",
            vec![
                format!("Title: {}", entry.title),
                format!("Path: {}", entry.path),
                "The downloaded file is not deleted.".to_string(),
            ],
        ),
        PendingConfirm::ClearHistory => (
            "Confirm Clear",
            "Clear the whole download history?",
            vec!["This cannot be undone.".to_string()],
        ),
        PendingConfirm::ResetSettings => (
            "Confirm Reset",
            "Reset all settings to their defaults?",
            vec!["Download history is kept.".to_string()],
        ),
    };

    let popup = centered(frame.area(), 60, 40);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::styled(
            question,
            Style::default()
                .fg(app.theme.danger)
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ];
    lines.extend(details.into_iter().map(Line::from));
    lines.extend([
        Line::from(""),
        Line::from("Press y or Enter to confirm."),
        Line::from("Press n or Esc to cancel."),
    ]);

    let popup_widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(pane_border_style(true, app.theme.danger, &app.theme)),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    frame.render_widget(popup_widget, popup);
}

fn centered(outer: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let [vertical] = Layout::vertical([Constraint::Percentage(height_percent)])
        .flex(Flex::Center)
        .areas(outer);
    let [popup] = Layout::horizontal([Constraint::Percentage(width_percent)])
        .flex(Flex::Center)
        .areas(vertical);
    popup
}

fn keybind_section(theme: &Theme, title: &str) -> Line<'static> {
    Line::styled(
        title.to_string(),
        Style::default()
            .fg(theme.section)
            .add_modifier(Modifier::BOLD),
    )
}

fn keybind_row(theme: &Theme, keys: &str, action: &str) -> Line<'static> {
    const KEY_COL_WIDTH: usize = 20;
    let keys_padded = format!("{keys:<KEY_COL_WIDTH$}");
    Line::from(vec![
        Span::styled(
            keys_padded,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(action.to_string()),
    ])
}

pub(super) fn pane_border_style(is_focused: bool, focused_color: Color, theme: &Theme) -> Style {
    if is_focused {
        Style::default()
            .fg(focused_color)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    }
}
