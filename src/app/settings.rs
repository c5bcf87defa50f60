// Settings tab behavior.
// - Edits a form copy of the settings; nothing is persisted until save.
// - Save validates the path and profile limit before writing settings.json.
// - Also hosts reset, import/export of the settings file, and the yt-dlp updater.
use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, Result, truncate_message},
    events::{ToolStatus, Worker, WorkerEvent},
    i18n::{next_language, previous_language},
    model::SettingsField,
    store::{QualityTier, Settings},
    theme::next_theme,
    tool::{ToolCommand, ffmpeg::Ffmpeg, ytdlp::YtDlp},
    updater::{UpdateOutcome, Updater},
    validators::validate_limit,
};

use super::{App, PendingConfirm, TextInput};

const EXPORT_FILE_NAME: &str = "ttdl-settings.json";

#[derive(Debug, Clone)]
pub(crate) struct SettingsForm {
    pub(crate) field: SettingsField,
    pub(crate) download_path: TextInput,
    pub(crate) language: String,
    pub(crate) theme: String,
    pub(crate) quality: QualityTier,
    pub(crate) profile_limit: TextInput,
    pub(crate) convert_mp3: bool,
    pub(crate) profile_folders: bool,
    pub(crate) save_history: bool,
    pub(crate) auto_update: bool,
    pub(crate) ytdlp_path: TextInput,
    pub(crate) ffmpeg_path: TextInput,
    pub(crate) transfer_path: TextInput,
}

impl SettingsForm {
    pub(crate) fn from_settings(settings: &Settings, data_dir: &Path) -> Self {
        Self {
            field: SettingsField::DownloadPath,
            download_path: TextInput::with_value(settings.download_path.display().to_string()),
            language: settings.language.clone(),
            theme: settings.theme.clone(),
            quality: settings.video_quality,
            profile_limit: TextInput::with_value(settings.profile_video_limit.to_string()),
            convert_mp3: settings.convert_to_mp3,
            profile_folders: settings.create_profile_folders,
            save_history: settings.save_history,
            auto_update: settings.auto_update_ytdlp,
            ytdlp_path: TextInput::with_value(settings.ytdlp_path.clone()),
            ffmpeg_path: TextInput::with_value(settings.ffmpeg_path.clone()),
            transfer_path: TextInput::with_value(
                data_dir.join(EXPORT_FILE_NAME).display().to_string(),
            ),
        }
    }

    /// Validated settings built from the form over `base`.
    pub(crate) fn to_settings(&self, base: &Settings) -> Result<Settings> {
        let download_path = self.download_path.value().trim();
        if download_path.is_empty() {
            return Err(AppError::InvalidSetting {
                key: "download_path".to_string(),
                message: "Download location cannot be empty".to_string(),
            });
        }

        let tool = |input: &TextInput, fallback: &str| {
            let value = input.value().trim();
            if value.is_empty() { fallback.to_string() } else { value.to_string() }
        };

        Ok(Settings {
            language: self.language.clone(),
            download_path: PathBuf::from(download_path),
            auto_update_ytdlp: self.auto_update,
            video_quality: self.quality,
            save_history: self.save_history,
            theme: self.theme.clone(),
            profile_video_limit: validate_limit(self.profile_limit.value(), None)?,
            convert_to_mp3: self.convert_mp3,
            create_profile_folders: self.profile_folders,
            ytdlp_path: tool(&self.ytdlp_path, &base.ytdlp_path),
            ffmpeg_path: tool(&self.ffmpeg_path, &base.ffmpeg_path),
        })
    }

    fn text_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.field {
            SettingsField::DownloadPath => Some(&mut self.download_path),
            SettingsField::ProfileLimit => Some(&mut self.profile_limit),
            SettingsField::YtDlpPath => Some(&mut self.ytdlp_path),
            SettingsField::FfmpegPath => Some(&mut self.ffmpeg_path),
            SettingsField::TransferPath => Some(&mut self.transfer_path),
            _ => None,
        }
    }

    fn toggle_mut(&mut self) -> Option<&mut bool> {
        match self.field {
            SettingsField::ConvertMp3 => Some(&mut self.convert_mp3),
            SettingsField::ProfileFolders => Some(&mut self.profile_folders),
            SettingsField::SaveHistory => Some(&mut self.save_history),
            SettingsField::AutoUpdate => Some(&mut self.auto_update),
            _ => None,
        }
    }

    fn cycle(&mut self, forward: bool) {
        match self.field {
            SettingsField::Language => {
                self.language = if forward {
                    next_language(&self.language)
                } else {
                    previous_language(&self.language)
                }
                .to_string();
            }
            SettingsField::Theme => self.theme = next_theme(&self.theme).to_string(),
            SettingsField::VideoQuality => {
                self.quality = if forward {
                    self.quality.next()
                } else {
                    self.quality.previous()
                };
            }
            _ => {
                if let Some(value) = self.toggle_mut() {
                    *value = !*value;
                }
            }
        }
    }
}

impl App {
    pub fn next_settings_field(&mut self) {
        self.settings_form.field = self.settings_form.field.next();
    }

    pub fn previous_settings_field(&mut self) {
        self.settings_form.field = self.settings_form.field.previous();
    }

    /// Left/Right: move the cursor in text fields, cycle choices elsewhere.
    pub fn settings_left(&mut self) {
        match self.settings_form.text_input_mut() {
            Some(input) => input.move_left(),
            None => self.settings_form.cycle(false),
        }
    }

    pub fn settings_right(&mut self) {
        match self.settings_form.text_input_mut() {
            Some(input) => input.move_right(),
            None => self.settings_form.cycle(true),
        }
    }

    pub fn toggle_settings_field(&mut self) {
        if let Some(value) = self.settings_form.toggle_mut() {
            *value = !*value;
        }
    }

    pub fn push_settings_char(&mut self, ch: char) {
        if let Some(input) = self.settings_form.text_input_mut() {
            input.insert(ch);
        }
    }

    pub(super) fn paste_settings_text(&mut self, text: &str) {
        if let Some(input) = self.settings_form.text_input_mut() {
            input.insert_str(text.trim());
        }
    }

    pub fn backspace_settings_field(&mut self) {
        if let Some(input) = self.settings_form.text_input_mut() {
            input.backspace();
        }
    }

    pub fn save_settings(&mut self) {
        let settings = match self.settings_form.to_settings(&self.settings) {
            Ok(settings) => settings,
            Err(AppError::InvalidSetting { key, .. }) if key == "download_path" => {
                self.status_message = self.t("path_required").to_string();
                return;
            }
            Err(err) => {
                self.status_message = err.to_string();
                return;
            }
        };

        let field = self.settings_form.field;
        match self.store.save_settings(&settings) {
            Ok(()) => {
                log::info!("settings saved");
                self.apply_settings(settings);
                self.settings_form.field = field;
                self.status_message = self.t("settings_saved").to_string();
            }
            Err(err) => {
                log::warn!("could not save settings: {err}");
                self.status_message = truncate_message(&err.to_string());
            }
        }
    }

    pub fn request_reset_settings(&mut self) {
        self.pending_confirm = Some(PendingConfirm::ResetSettings);
    }

    pub(super) fn reset_settings(&mut self) {
        match self.store.reset() {
            Ok(()) => {
                self.apply_settings(self.store.settings());
                self.status_message = self.t("settings_reset").to_string();
            }
            Err(err) => {
                log::warn!("could not reset settings: {err}");
                self.status_message = truncate_message(&err.to_string());
            }
        }
    }

    pub fn export_settings(&mut self) {
        let target = PathBuf::from(self.settings_form.transfer_path.value().trim());
        match self.store.export_settings(&target) {
            Ok(()) => {
                let path = target.display().to_string();
                self.status_message = self.translator.t_with("settings_exported", &[("path", &path)]);
            }
            Err(err) => self.status_message = truncate_message(&err.to_string()),
        }
    }

    pub fn import_settings(&mut self) {
        let source = PathBuf::from(self.settings_form.transfer_path.value().trim());
        match self.store.import_settings(&source) {
            Ok(()) => {
                self.apply_settings(self.store.settings());
                self.settings_form.transfer_path.set(source.display().to_string());
                let path = source.display().to_string();
                self.status_message = self.translator.t_with("settings_imported", &[("path", &path)]);
            }
            Err(err) => {
                log::warn!("settings import from {} failed: {err}", source.display());
                self.status_message = truncate_message(&err.to_string());
            }
        }
    }

    pub fn start_update(&mut self) {
        if self.updating {
            return;
        }

        let updater = self.updater();
        self.updating = true;
        self.status_message = self.t("updating").to_string();
        if !self.spawn_worker(Worker::Update, move |_| {
            WorkerEvent::UpdateFinished(updater.update().map_err(|err| err.to_string()))
        }) {
            self.updating = false;
        }
    }

    /// Probes yt-dlp and ffmpeg, and asks pip whether yt-dlp is outdated.
    pub(super) fn start_version_check(&mut self) {
        let updater = self.updater();
        let ffmpeg = Ffmpeg::new(ToolCommand::new(self.settings.ffmpeg_path.clone()));
        let check_outdated = !self.settings.auto_update_ytdlp;
        self.spawn_worker(Worker::Version, move |_| {
            let ytdlp_version = updater.version().ok();
            let ytdlp_outdated = check_outdated
                && ytdlp_version.is_some()
                && updater.check_for_updates().unwrap_or_else(|err| {
                    log::debug!("yt-dlp outdated check skipped: {err}");
                    false
                });
            WorkerEvent::ToolsChecked(ToolStatus {
                ytdlp_version,
                ffmpeg_available: ffmpeg.is_available(),
                ytdlp_outdated,
            })
        });
    }

    pub(super) fn finish_tool_check(&mut self, status: ToolStatus) {
        log::info!(
            "tool check: yt-dlp {:?}, ffmpeg available: {}",
            status.ytdlp_version,
            status.ffmpeg_available
        );
        if status.ytdlp_outdated && !self.is_busy() {
            self.status_message = self.t("update_available").to_string();
        }
        self.tools = Some(status);
    }

    pub(super) fn finish_update(&mut self, result: std::result::Result<UpdateOutcome, String>) {
        self.updating = false;
        match result {
            Ok(outcome) => {
                log::info!("yt-dlp update: {} (now {:?})", outcome.message, outcome.version);
                self.status_message = outcome.message;
                self.start_version_check();
            }
            Err(err) => {
                log::warn!("yt-dlp update failed: {err}");
                self.status_message = self
                    .translator
                    .t_with("update_failed", &[("error", &truncate_message(&err))]);
                self.start_version_check();
            }
        }
    }

    fn updater(&self) -> Updater {
        Updater::new(YtDlp::new(ToolCommand::new(self.settings.ytdlp_path.clone())))
    }
}

#[cfg(test)]
mod tests {
    use crate::app::test_support;

    use super::*;

    #[test]
    fn choices_cycle_and_toggles_flip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.settings_form.field = SettingsField::Language;
        app.settings_right();
        assert_eq!(app.settings_form.language, "id");
        app.settings_left();
        app.settings_left();
        assert_eq!(app.settings_form.language, "km");

        app.settings_form.field = SettingsField::VideoQuality;
        app.settings_right();
        assert_eq!(app.settings_form.quality, QualityTier::High);

        app.settings_form.field = SettingsField::SaveHistory;
        app.toggle_settings_field();
        assert!(!app.settings_form.save_history);
    }

    #[test]
    fn save_rejects_empty_path_and_bad_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.settings_form.download_path.clear();
        app.save_settings();
        assert_eq!(app.status_message, "Download location cannot be empty");

        app.settings_form.download_path.set("/tmp/videos");
        app.settings_form.profile_limit.set("-3");
        app.save_settings();
        assert!(app.status_message.contains("negative"), "{}", app.status_message);
        assert_eq!(app.store.settings().profile_video_limit, 10);
    }

    #[test]
    fn save_persists_and_applies_language() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.settings_form.field = SettingsField::ProfileLimit;
        app.backspace_settings_field();
        app.backspace_settings_field();
        app.push_settings_char('0');
        app.settings_form.language = "id".to_string();
        app.save_settings();

        let stored = app.store.settings();
        assert_eq!(stored.profile_video_limit, 0);
        assert_eq!(stored.language, "id");
        assert_eq!(app.status_message, "Pengaturan berhasil disimpan!");
        assert_eq!(app.settings_form.field, SettingsField::ProfileLimit);
    }

    #[test]
    fn reset_restores_defaults_after_confirm() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.store.set("theme", "dark").expect("set theme");
        app.apply_settings(app.store.settings());

        app.request_reset_settings();
        app.confirm_pending();
        assert_eq!(app.settings.theme, "light");
        assert_eq!(app.settings_form.theme, "light");
    }

    #[test]
    fn export_then_import_round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        let target = dir.path().join("backup.json");
        app.settings_form.transfer_path.set(target.display().to_string());

        app.export_settings();
        assert!(target.is_file());

        app.store.set("profile_video_limit", 99).expect("set limit");
        app.settings_form.transfer_path.set(target.display().to_string());
        app.import_settings();
        assert_eq!(app.settings.profile_video_limit, 10);
    }
}
