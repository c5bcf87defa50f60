// Download tab rendering.
// - URL form with the live banner, profile info line, and MP3 toggle.
// - Batch panel for staged, running, and finished link-file imports.
// - Progress gauge above the shared tool-output panel.
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::{
    app::App,
    model::{DownloadField, Focus},
    orchestrator::{BatchState, BatchSummary},
};

use super::{
    super::{
        output_panel::{LogPanelStateView, render_log_panel},
        pane_border_style,
    },
    checkbox_line, hint, input_line, row, section, warning,
};

pub fn render_download_tab(frame: &mut Frame, app: &App, area: Rect) {
    let batch_height = batch_panel_height(&app.batch);
    let output_constraint = if app.focus == Focus::Output {
        Constraint::Percentage(70)
    } else {
        Constraint::Min(6)
    };
    let [form, batch, gauge, output] = Layout::vertical([
        Constraint::Length(13),
        Constraint::Length(batch_height),
        Constraint::Length(3),
        output_constraint,
    ])
    .areas(area);

    render_download_form(frame, app, form);
    if batch_height > 0 {
        render_batch_panel(frame, app, batch);
    }
    render_progress_gauge(frame, app, gauge);
    render_download_output(frame, app, output);
}

fn render_download_form(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let form_focused = app.focus == Focus::Main;
    let cursor = |field: DownloadField, position: usize| {
        (form_focused && app.download_field == field).then_some(position)
    };

    let mut lines = vec![
        input_line(
            theme,
            app.t("url_label"),
            app.url_input.value(),
            cursor(DownloadField::Url, app.url_input.cursor()),
        ),
        banner_line(app),
    ];
    if let Some(profile) = &app.profile_banner {
        lines.push(Line::styled(
            profile.clone(),
            Style::default().fg(theme.secondary),
        ));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(checkbox_line(
        theme,
        &format!("{} (ctrl+t)", app.t("convert_mp3")),
        app.convert_mp3,
        false,
    ));
    if app.convert_mp3 && !app.ffmpeg_available() {
        lines.push(warning(theme, app.t("ffmpeg_missing")));
    }
    lines.push(row(
        theme,
        app.t("download_location"),
        app.settings.download_path.display().to_string(),
    ));
    lines.push(input_line(
        theme,
        "Output folder",
        app.output_dir_input.value(),
        cursor(DownloadField::OutputDir, app.output_dir_input.cursor()),
    ));
    lines.push(input_line(
        theme,
        "File name",
        app.filename_input.value(),
        cursor(DownloadField::FileName, app.filename_input.cursor()),
    ));
    lines.push(hint(
        theme,
        "Enter: download   Tab: next field   Ctrl+b: import link file   Ctrl+f: profile info",
    ));
    lines.push(hint(
        theme,
        "Ctrl+p: pause/resume   Ctrl+x: stop   Ctrl+g: open download folder",
    ));

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border_style(form_focused, theme.accent, theme))
                .title(app.t("tab_download")),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(panel, area);
}

fn banner_line(app: &App) -> Line<'static> {
    let Some(banner) = app.url_banner() else {
        return Line::from("");
    };
    let color = if banner.is_ok() {
        app.theme.success
    } else {
        app.theme.danger
    };
    Line::styled(app.t(banner.message_key()).to_string(), Style::default().fg(color))
}

fn batch_panel_height(batch: &BatchState) -> u16 {
    match batch {
        BatchState::Idle => 0,
        BatchState::Running => 3,
        BatchState::Loaded(_) | BatchState::Completed(_) | BatchState::StoppedByUser(_) => 6,
    }
}

fn render_batch_panel(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let lines = match &app.batch {
        BatchState::Idle => Vec::new(),
        BatchState::Loaded(report) => vec![
            section(theme, "BATCH STAGED"),
            row(
                theme,
                "Links",
                format!(
                    "{} ({} profiles, {} videos)",
                    report.tasks.len(),
                    report.profile_count(),
                    report.video_count()
                ),
            ),
            row(
                theme,
                "Ignored",
                format!(
                    "{} duplicates, {} invalid",
                    report.duplicates.len(),
                    report.invalid.len()
                ),
            ),
            hint(theme, app.t("batch_staged")),
        ],
        BatchState::Running => vec![section(theme, "BATCH RUNNING")],
        BatchState::Completed(summary) => summary_lines(app, "BATCH COMPLETED", summary),
        BatchState::StoppedByUser(summary) => summary_lines(app, "BATCH STOPPED", summary),
    };

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted))
                .title("Batch"),
        )
        .alignment(Alignment::Left);

    frame.render_widget(panel, area);
}

fn summary_lines(app: &App, title: &str, summary: &BatchSummary) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let mut lines = vec![
        section(theme, title),
        row(theme, "Total", summary.total.to_string()),
        row(
            theme,
            "Result",
            format!(
                "{} ok, {} failed, {} skipped",
                summary.succeeded, summary.failed, summary.skipped
            ),
        ),
    ];
    if let Some((url, error)) = summary.failures.first() {
        lines.push(warning(theme, &format!("first failure: {url}: {error}")));
    }
    lines
}

fn render_progress_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let percent = app
        .progress
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    let mut label = match app.unit_progress {
        Some((index, total)) => format!("{index}/{total} · {percent:.1}%"),
        None => format!("{percent:.1}%"),
    };
    if app.job_is_paused() {
        label.push_str(" (paused)");
    }

    let gauge_color = if app.job_is_paused() {
        theme.muted
    } else {
        theme.success
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted))
                .title("Progress"),
        )
        .gauge_style(Style::default().fg(gauge_color).add_modifier(Modifier::BOLD))
        .ratio(percent / 100.0)
        .label(Span::styled(label, Style::default().fg(theme.text)));

    frame.render_widget(gauge, area);
}

fn render_download_output(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.job_is_running() {
        format!("TOOL OUTPUT {} running (ctrl+o)", app.spinner_glyph())
    } else {
        "TOOL OUTPUT (ctrl+o)".to_string()
    };

    render_log_panel(
        frame,
        area,
        &app.theme,
        LogPanelStateView {
            title: &title,
            log: &app.output,
            focused: app.focus == Focus::Output,
            accent_color: app.theme.secondary,
        },
    );
}
