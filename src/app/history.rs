// History tab behavior.
// - Shows history.json newest first, narrowed by the kind filter and a title search.
// - Opens downloaded files or their folders with the platform's default handler.
// - Delete and clear go through the confirm modal before touching the store.
use std::{
    path::Path,
    process::Stdio,
};

use crate::{
    error::{AppError, Result, truncate_message},
    model::{DownloadField, Focus, Tab},
    store::HistoryEntry,
    tool::background_command,
};

use super::{App, PendingConfirm};

impl App {
    pub(super) fn reload_history(&mut self) {
        self.history = self.store.get_history();
        self.history.reverse();
        self.clamp_history_selection();
    }

    /// Entries passing the current filter and search, newest first.
    pub fn visible_history(&self) -> Vec<&HistoryEntry> {
        let needle = self.history_search.value().trim().to_lowercase();
        self.history
            .iter()
            .filter(|entry| self.history_filter.matches(entry))
            .filter(|entry| needle.is_empty() || entry.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected_history_entry(&self) -> Option<&HistoryEntry> {
        self.visible_history().get(self.history_selected).copied()
    }

    pub fn next_history_entry(&mut self) {
        let count = self.visible_history().len();
        self.history_selected = (self.history_selected + 1).min(count.saturating_sub(1));
    }

    pub fn previous_history_entry(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn cycle_history_filter(&mut self) {
        self.history_filter = self.history_filter.next();
        self.history_selected = 0;
    }

    pub fn start_history_search(&mut self) {
        self.history_searching = true;
        self.history_search.move_end();
    }

    pub fn stop_history_search(&mut self) {
        self.history_searching = false;
    }

    pub fn push_history_search_char(&mut self, ch: char) {
        self.history_search.insert(ch);
        self.history_selected = 0;
    }

    pub fn backspace_history_search(&mut self) {
        if self.history_search.backspace() {
            self.history_selected = 0;
        }
    }

    pub fn open_selected_file(&mut self) {
        let Some(path) = self
            .selected_history_entry()
            .map(|entry| entry.path.clone())
        else {
            return;
        };
        self.open_path(Path::new(&path));
    }

    pub fn open_selected_folder(&mut self) {
        let Some(folder) = self
            .selected_history_entry()
            .and_then(|entry| Path::new(&entry.path).parent().map(Path::to_path_buf))
        else {
            return;
        };
        self.open_path(&folder);
    }

    /// Copies the selected entry's URL into the download tab.
    pub fn redownload_selected(&mut self) {
        let Some(url) = self
            .selected_history_entry()
            .map(|entry| entry.url.clone())
        else {
            return;
        };
        self.url_input.set(url);
        self.url_edited();
        self.download_field = DownloadField::Url;
        self.tab = Tab::Download;
        self.focus = Focus::Main;
        self.status_message = self.t("redownload_ready").to_string();
    }

    pub fn request_delete_selected(&mut self) {
        if let Some(entry) = self.selected_history_entry().cloned() {
            self.pending_confirm = Some(PendingConfirm::DeleteHistory(entry));
        }
    }

    pub fn request_clear_history(&mut self) {
        if !self.history.is_empty() {
            self.pending_confirm = Some(PendingConfirm::ClearHistory);
        }
    }

    pub(super) fn delete_history_entry(&mut self, entry: &HistoryEntry) {
        match self.store.delete_history_entry(entry) {
            Ok(_) => self.status_message = self.t("history_deleted").to_string(),
            Err(err) => {
                log::warn!("could not delete history entry: {err}");
                self.status_message = truncate_message(&err.to_string());
            }
        }
        self.reload_history();
    }

    pub(super) fn clear_history(&mut self) {
        match self.store.clear_history() {
            Ok(()) => self.status_message = self.t("history_cleared").to_string(),
            Err(err) => {
                log::warn!("could not clear history: {err}");
                self.status_message = truncate_message(&err.to_string());
            }
        }
        self.reload_history();
    }

    pub(super) fn open_path(&mut self, path: &Path) {
        match open_with_system_default(path) {
            Ok(()) => self.status_message = format!("Opened {}", path.display()),
            Err(AppError::FileNotFound(_)) => {
                self.status_message = self.t("file_not_found").to_string();
            }
            Err(err) => {
                log::warn!("failed to open {}: {err}", path.display());
                self.status_message = truncate_message(&err.to_string());
            }
        }
    }

    fn clamp_history_selection(&mut self) {
        let count = self.visible_history().len();
        self.history_selected = self.history_selected.min(count.saturating_sub(1));
    }
}

fn open_with_system_default(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.to_path_buf()));
    }

    let mut command = if cfg!(target_os = "macos") {
        background_command("open")
    } else if cfg!(target_os = "windows") {
        let mut command = background_command("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        background_command("xdg-open")
    };

    command
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        app::test_support,
        model::HistoryFilter,
        store::{DownloadSource, MediaKind},
    };

    use super::*;

    fn entry(title: &str, kind: MediaKind, path: &str) -> HistoryEntry {
        HistoryEntry::new(
            title.to_string(),
            format!("https://www.tiktok.com/@a/video/{title}"),
            kind,
            path.to_string(),
        )
    }

    fn seeded_app(dir: &Path) -> App {
        let mut app = test_support::app(dir);
        for item in [
            entry("first dance", MediaKind::Video, "/gone/first.mp4"),
            entry("song", MediaKind::Mp3, "/gone/song.mp3"),
            entry("Dance two", MediaKind::Video, "/gone/two.mp4")
                .with_source(DownloadSource::Profile),
        ] {
            app.store.append_history(item).expect("append");
        }
        app.reload_history();
        app
    }

    #[test]
    fn newest_entries_come_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = seeded_app(dir.path());
        let titles = app
            .visible_history()
            .iter()
            .map(|entry| entry.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["Dance two", "song", "first dance"]);
    }

    #[test]
    fn filter_and_search_combine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = seeded_app(dir.path());

        app.start_history_search();
        for ch in "DANCE".chars() {
            app.push_history_search_char(ch);
        }
        assert_eq!(app.visible_history().len(), 2);

        app.cycle_history_filter();
        assert_eq!(app.history_filter, HistoryFilter::Video);
        assert_eq!(app.visible_history().len(), 1);
        assert_eq!(app.visible_history()[0].title, "first dance");

        app.cycle_history_filter();
        assert_eq!(app.visible_history().len(), 0);
        assert!(app.selected_history_entry().is_none());

        app.cycle_history_filter();
        assert_eq!(app.history_filter, HistoryFilter::Profile);
        assert_eq!(app.visible_history()[0].title, "Dance two");
    }

    #[test]
    fn missing_files_report_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = seeded_app(dir.path());
        app.open_selected_file();
        assert_eq!(app.status_message, "File not found");
        app.open_selected_folder();
        assert_eq!(app.status_message, "File not found");
    }

    #[test]
    fn delete_and_clear_wait_for_confirmation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = seeded_app(dir.path());

        app.next_history_entry();
        app.request_delete_selected();
        assert_eq!(app.history.len(), 3);
        app.confirm_pending();
        assert_eq!(app.history.len(), 2);
        assert!(app.history.iter().all(|entry| entry.title != "song"));

        app.request_clear_history();
        app.cancel_pending_confirm();
        assert_eq!(app.history.len(), 2);

        app.request_clear_history();
        app.confirm_pending();
        assert!(app.history.is_empty());
        assert_eq!(app.status_message, "History cleared!");
    }

    #[test]
    fn redownload_fills_the_url_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = seeded_app(dir.path());
        app.select_tab(Tab::History);

        app.redownload_selected();
        assert_eq!(app.tab, Tab::Download);
        assert_eq!(
            app.url_input.value(),
            "https://www.tiktok.com/@a/video/Dance two"
        );
    }
}
