// Central application state shared by the app submodules.
// - Owns the store handle, the live settings snapshot, and per-tab form state.
// - Background jobs run on worker threads and report back over one mpsc channel.
// - The event loop is the only place state changes; `tick` drains worker events.
mod download;
mod history;
mod input;
mod settings;
mod tool_output;

use std::{
    any::Any,
    cell::Cell,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
};

use crate::{
    cancel::CancelToken,
    dispatcher::Dispatcher,
    events::{ToolStatus, Worker, WorkerEvent},
    i18n::Translator,
    model::{DownloadField, Focus, HistoryFilter, Tab},
    orchestrator::{BatchState, Orchestrator},
    store::{HistoryEntry, Settings, Store},
    theme::Theme,
    tool::process::ProcessRegistry,
};

pub(crate) use self::input::TextInput;
pub(crate) use self::settings::SettingsForm;
pub(crate) use self::tool_output::OutputLog;

pub struct App {
    store: Arc<Store>,
    processes: ProcessRegistry,
    events_tx: Sender<WorkerEvent>,
    events_rx: Receiver<WorkerEvent>,
    pub(crate) settings: Settings,
    pub(crate) translator: Translator,
    pub(crate) theme: Theme,
    pub(crate) tab: Tab,
    pub(crate) focus: Focus,
    pub(crate) show_keybinds: bool,
    keybinds_scroll: Cell<usize>,
    pub(crate) status_message: String,
    spinner_frame: usize,
    pending_confirm: Option<PendingConfirm>,
    pub(crate) url_input: TextInput,
    pub(crate) output_dir_input: TextInput,
    pub(crate) filename_input: TextInput,
    pub(crate) download_field: DownloadField,
    pub(crate) convert_mp3: bool,
    pub(crate) profile_banner: Option<String>,
    profile_probe: Option<CancelToken>,
    pub(crate) batch: BatchState,
    job: Option<RunningJob>,
    pub(crate) progress: Option<f64>,
    pub(crate) unit_progress: Option<(usize, usize)>,
    pub(crate) output: OutputLog,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) history_filter: HistoryFilter,
    pub(crate) history_search: TextInput,
    pub(crate) history_searching: bool,
    pub(crate) history_selected: usize,
    pub(crate) settings_form: SettingsForm,
    /// `None` until the background tool probe reports back.
    pub(crate) tools: Option<ToolStatus>,
    updating: bool,
}

pub(crate) enum PendingConfirm {
    StopDownload,
    DeleteHistory(HistoryEntry),
    ClearHistory,
    ResetSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Single,
    Profile,
    Batch,
}

struct RunningJob {
    kind: JobKind,
    cancel: CancelToken,
}

impl App {
    pub fn new(store: Arc<Store>) -> Self {
        let settings = store.settings();
        let (events_tx, events_rx) = mpsc::channel();
        let translator = Translator::new(&settings.language);
        let settings_form = SettingsForm::from_settings(&settings, &store.paths().base_dir);

        let mut app = Self {
            processes: ProcessRegistry::new(),
            events_tx,
            events_rx,
            translator,
            theme: Theme::named(&settings.theme),
            tab: Tab::Download,
            focus: Focus::Main,
            show_keybinds: false,
            keybinds_scroll: Cell::new(0),
            status_message: translator.t("ready").to_string(),
            spinner_frame: 0,
            pending_confirm: None,
            url_input: TextInput::default(),
            output_dir_input: TextInput::default(),
            filename_input: TextInput::default(),
            download_field: DownloadField::Url,
            convert_mp3: settings.convert_to_mp3,
            profile_banner: None,
            profile_probe: None,
            batch: BatchState::default(),
            job: None,
            progress: None,
            unit_progress: None,
            output: OutputLog::new(),
            history: Vec::new(),
            history_filter: HistoryFilter::All,
            history_search: TextInput::default(),
            history_searching: false,
            history_selected: 0,
            settings_form,
            tools: None,
            updating: false,
            settings,
            store,
        };
        app.reload_history();
        app
    }

    /// Kicks off the yt-dlp version probe and, when enabled, the startup update.
    pub fn start_background_checks(&mut self) {
        if self.settings.auto_update_ytdlp {
            self.start_update();
        } else {
            self.start_version_check();
        }
    }

    pub fn tick(&mut self) {
        if self.is_busy() {
            self.spinner_frame = (self.spinner_frame + 1) % spinner_frames().len();
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_worker_event(event);
        }

        if self.store.reload_if_changed() {
            log::info!("settings changed on disk, reloading");
            self.apply_settings(self.store.settings());
        }
    }

    /// Stops any running job and its child processes before exit.
    pub fn shutdown(&mut self) {
        if let Some(job) = &self.job {
            job.cancel.stop();
        }
        if let Some(probe) = &self.profile_probe {
            probe.stop();
        }
        let killed = self.processes.kill_all();
        if killed > 0 {
            log::info!("killed {killed} child processes on exit");
        }
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        self.translator.t(key)
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some() || self.profile_probe.is_some() || self.updating
    }

    pub fn spinner_glyph(&self) -> char {
        spinner_frames()[self.spinner_frame % spinner_frames().len()]
    }

    pub fn version_label(&self) -> String {
        match &self.tools {
            Some(ToolStatus {
                ytdlp_version: Some(version),
                ..
            }) => version.clone(),
            Some(_) => self.t("not_installed").to_string(),
            None => "...".to_string(),
        }
    }

    /// Optimistic until the probe says otherwise.
    pub fn ffmpeg_available(&self) -> bool {
        self.tools
            .as_ref()
            .is_none_or(|status| status.ffmpeg_available)
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn toggle_keybinds(&mut self) {
        self.show_keybinds = !self.show_keybinds;
        self.keybinds_scroll.set(0);
    }

    pub fn hide_keybinds(&mut self) {
        self.show_keybinds = false;
    }

    pub fn scroll_keybinds_down(&mut self, step: usize) {
        self.keybinds_scroll.set(self.keybinds_scroll.get() + step);
    }

    pub fn scroll_keybinds_up(&mut self, step: usize) {
        self.keybinds_scroll
            .set(self.keybinds_scroll.get().saturating_sub(step));
    }

    pub fn clamp_keybinds_scroll(&self, max_scroll_top: usize) -> usize {
        let clamped = self.keybinds_scroll.get().min(max_scroll_top);
        self.keybinds_scroll.set(clamped);
        clamped
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.focus = Focus::Main;
        if tab == Tab::History {
            self.reload_history();
        }
    }

    pub fn select_next_tab(&mut self) {
        self.select_tab(self.tab.next());
    }

    pub fn select_previous_tab(&mut self) {
        self.select_tab(self.tab.previous());
    }

    pub fn select_tab_by_number(&mut self, number: usize) -> bool {
        let Some(tab) = Tab::from_number(number) else {
            return false;
        };
        self.select_tab(tab);
        true
    }

    /// True when printable keys should go into a text field instead of shortcuts.
    pub fn accepts_text_input(&self) -> bool {
        match self.tab {
            Tab::Download => self.focus == Focus::Main,
            Tab::History => self.history_searching,
            Tab::Settings => self.settings_form.field.is_text(),
        }
    }

    /// Bracketed paste goes into whichever text field has focus; newlines are dropped.
    pub fn paste(&mut self, text: &str) {
        if !self.accepts_text_input() {
            return;
        }
        match self.tab {
            Tab::Download => {
                self.download_input_mut().insert_str(text.trim());
                if self.download_field == DownloadField::Url {
                    self.url_edited();
                }
            }
            Tab::History => {
                self.history_search.insert_str(text);
                self.history_selected = 0;
            }
            Tab::Settings => self.paste_settings_text(text),
        }
    }

    pub(crate) fn pending_confirm(&self) -> Option<&PendingConfirm> {
        self.pending_confirm.as_ref()
    }

    pub fn cancel_pending_confirm(&mut self) {
        self.pending_confirm = None;
    }

    pub fn confirm_pending(&mut self) {
        let Some(pending) = self.pending_confirm.take() else {
            return;
        };

        match pending {
            PendingConfirm::StopDownload => self.stop_download(),
            PendingConfirm::DeleteHistory(entry) => self.delete_history_entry(&entry),
            PendingConfirm::ClearHistory => self.clear_history(),
            PendingConfirm::ResetSettings => self.reset_settings(),
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(Dispatcher::new(
            Arc::clone(&self.store),
            self.processes.clone(),
        ))
    }

    fn apply_settings(&mut self, settings: Settings) {
        if self.translator.code() != settings.language {
            log::info!("switching language to {}", settings.language);
            self.translator = Translator::new(&settings.language);
        }
        self.theme = Theme::named(&settings.theme);
        self.convert_mp3 = settings.convert_to_mp3;
        self.settings_form = SettingsForm::from_settings(&settings, &self.store.paths().base_dir);
        self.settings = settings;
    }

    fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress(progress) => self.apply_progress(progress),
            WorkerEvent::SingleFinished(result) => self.finish_single(result),
            WorkerEvent::BatchFinished(summary) => self.finish_batch(summary),
            WorkerEvent::ProfileInfo(result) => self.finish_profile_info(result),
            WorkerEvent::UpdateFinished(result) => self.finish_update(result),
            WorkerEvent::ToolsChecked(status) => self.finish_tool_check(status),
            WorkerEvent::Crashed { worker, message } => {
                log::error!("{worker:?} worker crashed: {message}");
                self.status_message = message;
                match worker {
                    Worker::Download => {
                        self.job = None;
                        if self.batch.is_running() {
                            self.batch = BatchState::Idle;
                        }
                    }
                    Worker::ProfileInfo => self.profile_probe = None,
                    Worker::Update => self.updating = false,
                    Worker::Version => self.tools = Some(ToolStatus::default()),
                }
            }
        }
    }

    /// Runs `work` on its own thread; a panic becomes a `Crashed` event.
    fn spawn_worker<F>(&mut self, worker: Worker, work: F) -> bool
    where
        F: FnOnce(&Sender<WorkerEvent>) -> WorkerEvent + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("ttdl-{worker:?}").to_lowercase())
            .spawn(move || {
                let event = panic::catch_unwind(AssertUnwindSafe(|| work(&tx)))
                    .unwrap_or_else(|payload| WorkerEvent::Crashed {
                        worker,
                        message: panic_message(payload.as_ref()),
                    });
                let _ = tx.send(event);
            });

        match spawned {
            Ok(_) => true,
            Err(err) => {
                log::error!("failed to spawn {worker:?} worker: {err}");
                self.status_message = format!("Failed to start background job: {err}");
                false
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Unexpected error: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Unexpected error: {message}")
    } else {
        "Unexpected error in background job".to_string()
    }
}

fn spinner_frames() -> &'static [char] {
    &['|', '/', '-', '\\']
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_panics_become_crash_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.updating = true;

        assert!(app.spawn_worker(Worker::Update, |_| panic!("boom")));
        let event = app
            .events_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("crash event");
        app.handle_worker_event(event);

        assert!(!app.is_updating());
        assert!(app.status_message.contains("boom"));
    }

    #[test]
    fn text_input_mode_follows_tab_and_focus() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        assert!(app.accepts_text_input());

        app.focus = Focus::Output;
        assert!(!app.accepts_text_input());

        app.select_tab(Tab::History);
        assert!(!app.accepts_text_input());
        app.history_searching = true;
        assert!(app.accepts_text_input());

        assert!(app.select_tab_by_number(3));
        assert_eq!(app.tab, Tab::Settings);
        assert!(!app.select_tab_by_number(9));
    }

    #[test]
    fn paste_targets_the_focused_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.paste("  https://www.tiktok.com/@someone\n");
        assert_eq!(app.url_input.value(), "https://www.tiktok.com/@someone");

        app.focus = Focus::Output;
        app.paste("ignored");
        assert_eq!(app.url_input.value(), "https://www.tiktok.com/@someone");

        app.select_tab(Tab::History);
        app.paste("ignored");
        assert_eq!(app.history_search.value(), "");
        app.history_searching = true;
        app.paste("dance");
        assert_eq!(app.history_search.value(), "dance");
    }

    #[test]
    fn version_label_reports_missing_tool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        assert_eq!(app.version_label(), "...");

        app.handle_worker_event(WorkerEvent::ToolsChecked(ToolStatus::default()));
        assert_eq!(app.version_label(), "not installed");
        assert!(!app.ffmpeg_available());

        app.handle_worker_event(WorkerEvent::ToolsChecked(ToolStatus {
            ytdlp_version: Some("2024.08.06".to_string()),
            ffmpeg_available: true,
            ytdlp_outdated: true,
        }));
        assert_eq!(app.version_label(), "2024.08.06");
        assert!(app.ffmpeg_available());
        assert_eq!(app.status_message, app.t("update_available"));
    }
}
