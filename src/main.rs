mod app;
mod cancel;
mod dispatcher;
mod error;
mod events;
mod i18n;
mod logging;
mod model;
mod orchestrator;
mod paths;
mod resolver;
mod store;
mod theme;
mod tool;
mod ui;
mod updater;
mod validators;

use std::{
    io::{self, stdout},
    path::PathBuf,
    time::Duration,
};

use app::App;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
};
use model::{Focus, Tab};
use paths::AppPaths;
use store::Store;

const KEYBINDS_SCROLL_STEP: usize = 1;

/// Terminal front-end for downloading TikTok videos, profiles, and link lists with yt-dlp.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding settings.json, history.json, and app.log
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Overrides the saved download location and persists it
    #[arg(long = "download-dir")]
    download_dir: Option<PathBuf>,

    /// off, error, warn, info, debug, or trace
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let paths = cli
        .data_dir
        .map(AppPaths::new)
        .unwrap_or_else(AppPaths::platform_default);
    logging::init(&paths.log_path(), logging::parse_level(&cli.log_level));
    log::info!("starting ttdl {} with data dir {}", env!("CARGO_PKG_VERSION"), paths.base_dir.display());

    let store = Store::shared(&paths);
    if let Some(download_dir) = cli.download_dir
        && let Err(err) = store.set("download_path", &download_dir)
    {
        log::warn!("could not apply --download-dir {}: {err}", download_dir.display());
    }

    let mut app = App::new(store);
    app.start_background_checks();

    let mut terminal = ratatui::init();
    if let Err(err) = execute!(stdout(), EnableBracketedPaste) {
        log::debug!("bracketed paste unavailable: {err}");
    }
    let result = run(&mut terminal, &mut app);
    app.shutdown();
    let _ = execute!(stdout(), DisableBracketedPaste);
    ratatui::restore();

    if let Err(err) = &result {
        log::error!("terminal error: {err}");
    }
    log::info!("exiting");
    result
}

fn run(terminal: &mut ratatui::DefaultTerminal, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, key) {
                        break Ok(());
                    }
                }
                Event::Paste(text) => app.paste(&text),
                _ => {}
            }
        }

        app.tick();
    }
}

/// Routes one key press; returns true when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.pending_confirm().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_pending(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_pending_confirm(),
            _ => {}
        }
        return false;
    }

    if app.show_keybinds {
        match key.code {
            KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Esc => app.hide_keybinds(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_keybinds_down(KEYBINDS_SCROLL_STEP),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_keybinds_up(KEYBINDS_SCROLL_STEP),
            KeyCode::Char('q') => return true,
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::F(1) => {
            app.toggle_keybinds();
            return false;
        }
        KeyCode::Char('n') if ctrl => {
            app.select_next_tab();
            return false;
        }
        KeyCode::Right if ctrl => {
            app.select_next_tab();
            return false;
        }
        KeyCode::Left if ctrl => {
            app.select_previous_tab();
            return false;
        }
        _ => {}
    }

    if !app.accepts_text_input() && !ctrl {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => {
                app.toggle_keybinds();
                return false;
            }
            KeyCode::Char(digit @ '1'..='9') => {
                if app.select_tab_by_number(digit as usize - '0' as usize) {
                    return false;
                }
            }
            _ => {}
        }
    }

    match app.tab {
        Tab::Download => handle_download_key(app, key, ctrl),
        Tab::History => handle_history_key(app, key),
        Tab::Settings => handle_settings_key(app, key, ctrl),
    }
    false
}

fn handle_download_key(app: &mut App, key: KeyEvent, ctrl: bool) {
    if ctrl {
        match key.code {
            KeyCode::Char('b') => app.import_batch_file(),
            KeyCode::Char('f') => app.fetch_profile_info(),
            KeyCode::Char('t') => app.toggle_convert_mp3(),
            KeyCode::Char('p') => app.toggle_pause(),
            KeyCode::Char('x') => app.request_stop(),
            KeyCode::Char('w') => app.clear_url(),
            KeyCode::Char('o') => app.toggle_output_focus(),
            KeyCode::Char('g') => app.open_download_folder(),
            KeyCode::Char('d') if app.focus == Focus::Output => app.page_output_down(),
            KeyCode::Char('u') if app.focus == Focus::Output => app.page_output_up(),
            _ => {}
        }
        return;
    }

    if app.focus == Focus::Output {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => app.scroll_output_down(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_output_up(),
            KeyCode::PageDown => app.page_output_down(),
            KeyCode::PageUp => app.page_output_up(),
            KeyCode::Esc => app.toggle_output_focus(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Enter => app.start_download(),
        KeyCode::Tab | KeyCode::Down => app.next_download_field(),
        KeyCode::BackTab | KeyCode::Up => app.previous_download_field(),
        KeyCode::Backspace => app.backspace_download(),
        KeyCode::Delete => app.delete_download_char(),
        KeyCode::Left => app.download_input_mut().move_left(),
        KeyCode::Right => app.download_input_mut().move_right(),
        KeyCode::Home => app.download_input_mut().move_home(),
        KeyCode::End => app.download_input_mut().move_end(),
        KeyCode::Char(ch) => app.push_download_char(ch),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    if app.history_searching {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => app.stop_history_search(),
            KeyCode::Backspace => app.backspace_history_search(),
            KeyCode::Left => app.history_search.move_left(),
            KeyCode::Right => app.history_search.move_right(),
            KeyCode::Char(ch) => app.push_history_search_char(ch),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.next_history_entry(),
        KeyCode::Up | KeyCode::Char('k') => app.previous_history_entry(),
        KeyCode::Char('f') => app.cycle_history_filter(),
        KeyCode::Char('/') => app.start_history_search(),
        KeyCode::Enter | KeyCode::Char('o') => app.open_selected_file(),
        KeyCode::Char('O') => app.open_selected_folder(),
        KeyCode::Char('r') => app.redownload_selected(),
        KeyCode::Char('d') => app.request_delete_selected(),
        KeyCode::Char('C') => app.request_clear_history(),
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent, ctrl: bool) {
    if ctrl {
        match key.code {
            KeyCode::Char('s') => app.save_settings(),
            KeyCode::Char('r') => app.request_reset_settings(),
            KeyCode::Char('u') => app.start_update(),
            KeyCode::Char('e') => app.export_settings(),
            KeyCode::Char('l') => app.import_settings(),
            _ => {}
        }
        return;
    }

    let field = app.settings_form.field;
    match key.code {
        KeyCode::Tab | KeyCode::Down => app.next_settings_field(),
        KeyCode::BackTab | KeyCode::Up => app.previous_settings_field(),
        KeyCode::Left => app.settings_left(),
        KeyCode::Right => app.settings_right(),
        KeyCode::Backspace => app.backspace_settings_field(),
        KeyCode::Enter if field.is_toggle() => app.toggle_settings_field(),
        KeyCode::Enter => app.save_settings(),
        KeyCode::Char(' ') if field.is_toggle() => app.toggle_settings_field(),
        KeyCode::Char(' ') if !field.is_text() => app.settings_right(),
        KeyCode::Char(ch) if field.is_text() => app.push_settings_char(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::test_support, model::SettingsField};

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press_ctrl(app: &mut App, ch: char) -> bool {
        handle_key(app, KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    #[test]
    fn typing_in_the_url_field_does_not_trigger_shortcuts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        for ch in "q2?".chars() {
            assert!(!press(&mut app, KeyCode::Char(ch)));
        }
        assert_eq!(app.url_input.value(), "q2?");
        assert_eq!(app.tab, Tab::Download);
        assert!(!app.show_keybinds);

        assert!(press_ctrl(&mut app, 'c'));
    }

    #[test]
    fn tab_moves_between_download_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for ch in "clip".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.filename_input.value(), "clip");
        assert_eq!(app.output_dir_input.value(), "d");
        assert_eq!(app.url_input.value(), "");

        assert!(!press_ctrl(&mut app, 'g'));
        assert_eq!(app.status_message, "File not found");
    }

    #[test]
    fn shortcuts_work_outside_text_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        assert!(!press_ctrl(&mut app, 'n'));
        assert_eq!(app.tab, Tab::History);
        assert!(!press(&mut app, KeyCode::Char('3')));
        assert_eq!(app.tab, Tab::Settings);

        // Download location is a text field; move to a choice field first.
        assert!(!press(&mut app, KeyCode::Tab));
        assert_eq!(app.settings_form.field, SettingsField::Language);
        assert!(!press(&mut app, KeyCode::Char('?')));
        assert!(app.show_keybinds);
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(!app.show_keybinds);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn confirm_modal_swallows_keys_until_answered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.select_tab(Tab::Settings);

        assert!(!press_ctrl(&mut app, 'r'));
        assert!(app.pending_confirm().is_some());
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.pending_confirm().is_some());
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert!(app.pending_confirm().is_none());
    }

    #[test]
    fn space_toggles_checkboxes_in_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.select_tab(Tab::Settings);
        while app.settings_form.field != SettingsField::SaveHistory {
            press(&mut app, KeyCode::Tab);
        }

        let before = app.settings_form.save_history;
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.settings_form.save_history, !before);
    }
}
