// Settings tab rendering.
// - One line per `SettingsField`; the active field is inverted.
// - The yt-dlp version row reflects the background probe and updater.
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{app::App, i18n::language_name, model::SettingsField};

use super::{
    super::pane_border_style, checkbox_line, choice_line, hint, input_line, row, section,
};

pub fn render_settings_tab(frame: &mut Frame, app: &App, area: Rect) {
    let [form, tools] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(6)]).areas(area);

    render_settings_form(frame, app, form);
    render_tools_panel(frame, app, tools);
}

fn render_settings_form(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut lines = vec![section(theme, "GENERAL"), Line::from("")];
    for field in SettingsField::ALL {
        if field == SettingsField::ConvertMp3 {
            lines.push(Line::from(""));
            lines.push(section(theme, "DOWNLOADS"));
            lines.push(Line::from(""));
        } else if field == SettingsField::YtDlpPath {
            lines.push(Line::from(""));
            lines.push(section(theme, "TOOLS"));
            lines.push(Line::from(""));
        }
        lines.push(field_line(app, field));
    }
    lines.push(Line::from(""));
    lines.push(hint(
        theme,
        "Tab: next field  Left/Right: change  Space: toggle  Ctrl+s: save  Ctrl+r: reset",
    ));

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border_style(true, theme.accent, theme))
                .title(app.t("tab_settings")),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(panel, area);
}

fn field_line(app: &App, field: SettingsField) -> Line<'static> {
    let theme = &app.theme;
    let form = &app.settings_form;
    let active = form.field == field;
    let cursor = |position: usize| active.then_some(position);

    match field {
        SettingsField::DownloadPath => input_line(
            theme,
            app.t("download_location"),
            form.download_path.value(),
            cursor(form.download_path.cursor()),
        ),
        SettingsField::Language => choice_line(
            theme,
            app.t("language"),
            language_name(&form.language),
            active,
        ),
        SettingsField::Theme => choice_line(theme, app.t("theme"), &form.theme, active),
        SettingsField::VideoQuality => {
            choice_line(theme, app.t("video_quality"), form.quality.key(), active)
        }
        SettingsField::ProfileLimit => input_line(
            theme,
            app.t("profile_limit"),
            form.profile_limit.value(),
            cursor(form.profile_limit.cursor()),
        ),
        SettingsField::ConvertMp3 => {
            checkbox_line(theme, app.t("convert_mp3"), form.convert_mp3, active)
        }
        SettingsField::ProfileFolders => checkbox_line(
            theme,
            app.t("profile_folders"),
            form.profile_folders,
            active,
        ),
        SettingsField::SaveHistory => {
            checkbox_line(theme, app.t("save_history"), form.save_history, active)
        }
        SettingsField::AutoUpdate => {
            checkbox_line(theme, app.t("auto_update"), form.auto_update, active)
        }
        SettingsField::YtDlpPath => input_line(
            theme,
            app.t("ytdlp_path"),
            form.ytdlp_path.value(),
            cursor(form.ytdlp_path.cursor()),
        ),
        SettingsField::FfmpegPath => input_line(
            theme,
            app.t("ffmpeg_path"),
            form.ffmpeg_path.value(),
            cursor(form.ffmpeg_path.cursor()),
        ),
        SettingsField::TransferPath => input_line(
            theme,
            "Settings file",
            form.transfer_path.value(),
            cursor(form.transfer_path.cursor()),
        ),
    }
}

fn render_tools_panel(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut version = app.version_label();
    if app.is_updating() {
        version = format!("{version}  {} {}", app.spinner_glyph(), app.t("updating"));
    }

    let lines = vec![
        row(theme, app.t("ytdlp_version"), version),
        row(
            theme,
            "ffmpeg",
            match &app.tools {
                None => "...".to_string(),
                Some(_) if app.ffmpeg_available() => "available".to_string(),
                Some(_) => app.t("not_installed").to_string(),
            },
        ),
        Line::styled(
            format!(
                "Ctrl+u: {}   Ctrl+e / Ctrl+l: export / import the settings file",
                app.t("update_now")
            ),
            Style::default().fg(theme.muted),
        ),
    ];

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted))
                .title("yt-dlp"),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    frame.render_widget(panel, area);
}
