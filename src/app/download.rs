// Download tab behavior.
// - Owns the URL field, its live classification, and staged batch imports.
// - Starts single, profile, and batch jobs on a worker thread and folds their
//   progress events into the gauge, status line, and output log.
// - Pause/stop act on the running job's cancel token; stop also kills child processes.
use std::path::{Path, PathBuf};

use crate::{
    cancel::CancelToken,
    dispatcher::{DownloadRequest, Downloaded},
    error::truncate_message,
    events::{ProfileInfo, ProgressEvent, Worker, WorkerEvent},
    model::{DownloadField, Focus},
    orchestrator::{BatchState, BatchSummary, BatchTask, load_batch_file, profile_name},
    validators::{UrlKind, classify, is_valid_profile_url, is_valid_video_url},
};

use super::{App, JobKind, PendingConfirm, RunningJob, TextInput};

/// What the banner under the URL field should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlBanner {
    Profile,
    Video,
    Generic,
    LinkFile,
    Invalid,
}

impl UrlBanner {
    pub(crate) fn message_key(self) -> &'static str {
        match self {
            Self::Profile => "profile_url_detected",
            Self::Video => "video_url_detected",
            Self::Generic => "valid_url_detected",
            Self::LinkFile => "batch_file_detected",
            Self::Invalid => "invalid_url_message",
        }
    }

    pub(crate) fn is_ok(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl App {
    pub(crate) fn url_banner(&self) -> Option<UrlBanner> {
        let url = self.url_input.value().trim();
        if url.is_empty() || self.batch.staged().is_some() {
            return None;
        }

        Some(match classify(url) {
            UrlKind::Profile => UrlBanner::Profile,
            UrlKind::Video => UrlBanner::Video,
            UrlKind::Generic => UrlBanner::Generic,
            UrlKind::NotPlatform if Path::new(url).is_file() => UrlBanner::LinkFile,
            UrlKind::NotPlatform => UrlBanner::Invalid,
        })
    }

    pub fn job_is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn job_is_paused(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.cancel.is_paused())
    }

    pub(crate) fn download_input_mut(&mut self) -> &mut TextInput {
        match self.download_field {
            DownloadField::Url => &mut self.url_input,
            DownloadField::OutputDir => &mut self.output_dir_input,
            DownloadField::FileName => &mut self.filename_input,
        }
    }

    pub fn next_download_field(&mut self) {
        self.download_field = self.download_field.next();
    }

    pub fn previous_download_field(&mut self) {
        self.download_field = self.download_field.previous();
    }

    pub fn push_download_char(&mut self, ch: char) {
        self.download_input_mut().insert(ch);
        self.download_text_edited();
    }

    pub fn backspace_download(&mut self) {
        if self.download_input_mut().backspace() {
            self.download_text_edited();
        }
    }

    pub fn delete_download_char(&mut self) {
        if self.download_input_mut().delete() {
            self.download_text_edited();
        }
    }

    fn download_text_edited(&mut self) {
        if self.download_field == DownloadField::Url {
            self.url_edited();
        }
    }

    /// Clears the focused download field.
    pub fn clear_url(&mut self) {
        self.download_input_mut().clear();
        self.download_text_edited();
    }

    /// Opens the configured download folder with the system handler.
    pub fn open_download_folder(&mut self) {
        let folder = self.settings.download_path.clone();
        self.open_path(&folder);
    }

    pub fn toggle_convert_mp3(&mut self) {
        self.convert_mp3 = !self.convert_mp3;
    }

    pub fn toggle_output_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Main => Focus::Output,
            Focus::Output => Focus::Main,
        };
    }

    pub fn scroll_output_down(&mut self) {
        self.output.scroll_down(1);
    }

    pub fn scroll_output_up(&mut self) {
        self.output.scroll_up(1);
    }

    pub fn page_output_down(&mut self) {
        self.output.page_down();
    }

    pub fn page_output_up(&mut self) {
        self.output.page_up();
    }

    /// Reads the link file named in the URL field and stages its tasks.
    pub fn import_batch_file(&mut self) {
        if self.job.is_some() {
            self.status_message = self.t("already_running").to_string();
            return;
        }

        let path = self.url_input.value().trim().to_string();
        if path.is_empty() {
            self.status_message = self.t("empty_url_error").to_string();
            return;
        }

        match load_batch_file(Path::new(&path)) {
            Ok(report) => {
                let count = report.tasks.len().to_string();
                let profiles = report.profile_count().to_string();
                let videos = report.video_count().to_string();
                self.status_message = self.translator.t_with(
                    "batch_loaded",
                    &[
                        ("count", &count),
                        ("profiles", &profiles),
                        ("videos", &videos),
                    ],
                );
                log::info!("staged {count} batch tasks from {path}");
                if !report.duplicates.is_empty() || !report.invalid.is_empty() {
                    let details = self.translator.t_with(
                        "batch_import_details",
                        &[
                            ("duplicates", &report.duplicates.len().to_string()),
                            ("invalid", &report.invalid.len().to_string()),
                        ],
                    );
                    self.output.reset(details);
                    for line in &report.invalid {
                        self.output.push(format!("invalid: {line}"));
                    }
                }
                self.batch.load(report);
            }
            Err(err) => {
                log::warn!("batch import from {path} failed: {err}");
                self.status_message = truncate_message(&err.to_string());
            }
        }
    }

    /// Enter on the download tab: runs the staged batch, or the URL in the field.
    pub fn start_download(&mut self) {
        if self.job.is_some() {
            self.status_message = self.t("already_running").to_string();
            return;
        }

        if let Some(tasks) = self.batch.start() {
            self.start_batch(tasks);
            return;
        }

        let url = self.url_input.value().trim().to_string();
        if url.is_empty() {
            self.status_message = self.t("empty_url_error").to_string();
            return;
        }

        if is_valid_profile_url(&url) {
            self.start_profile(url);
        } else if is_valid_video_url(&url) {
            self.start_single(url);
        } else {
            self.status_message = self.t("invalid_url_error").to_string();
        }
    }

    pub fn toggle_pause(&mut self) {
        let Some(job) = &self.job else {
            self.status_message = self.t("nothing_running").to_string();
            return;
        };

        if job.cancel.is_paused() {
            job.cancel.resume();
            self.status_message = self.t("download_resumed").to_string();
        } else {
            job.cancel.pause();
            self.status_message = self.t("download_paused").to_string();
        }
    }

    pub fn request_stop(&mut self) {
        if self.job.is_some() {
            self.pending_confirm = Some(PendingConfirm::StopDownload);
        } else {
            self.status_message = self.t("nothing_running").to_string();
        }
    }

    pub(super) fn stop_download(&mut self) {
        let Some(job) = &self.job else {
            return;
        };
        job.cancel.stop();
        let killed = self.processes.kill_all();
        log::info!("stop requested, killed {killed} child processes");
        self.status_message = self.t("stopping_download").to_string();
        self.output.push(self.t("stopping_download").to_string());
    }

    /// Looks up the handle and video count for the profile URL in the field.
    pub fn fetch_profile_info(&mut self) {
        let url = self.url_input.value().trim().to_string();
        if !is_valid_profile_url(&url) {
            self.status_message = self.t("invalid_url_error").to_string();
            return;
        }

        if let Some(previous) = self.profile_probe.take() {
            previous.stop();
        }

        let cancel = CancelToken::new();
        let orchestrator = self.orchestrator();
        let worker_cancel = cancel.clone();
        self.profile_banner = Some(self.t("detecting_profile").to_string());
        if self.spawn_worker(Worker::ProfileInfo, move |_| {
            let result = orchestrator
                .profile_info(&url, &worker_cancel)
                .map_err(|err| err.to_string());
            WorkerEvent::ProfileInfo(result)
        }) {
            self.profile_probe = Some(cancel);
        } else {
            self.profile_banner = None;
        }
    }

    pub(super) fn finish_profile_info(&mut self, result: Result<ProfileInfo, String>) {
        // A probe that was superseded or discarded by an edit is ignored.
        if self.profile_probe.take().is_none() {
            return;
        }

        self.profile_banner = Some(match result {
            Ok(info) => {
                let count = info.video_count.to_string();
                match self.settings.profile_limit() {
                    Some(limit) => self.translator.t_with(
                        "profile_info_limited",
                        &[
                            ("username", &info.handle),
                            ("count", &count),
                            ("limit", &limit.min(info.video_count).to_string()),
                        ],
                    ),
                    None => self.translator.t_with(
                        "profile_info_all",
                        &[("username", &info.handle), ("count", &count)],
                    ),
                }
            }
            Err(err) => {
                log::warn!("profile info failed: {err}");
                self.t("profile_info_failed").to_string()
            }
        });
    }

    pub(super) fn apply_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Percent { percent, line } => {
                self.progress = Some(percent);
                self.output.push_progress(&line);
            }
            ProgressEvent::Status { message } => self.output.push(message),
            ProgressEvent::Output { stream, line } => self.output.push_stream(stream, &line),
            ProgressEvent::UnitStarted { index, total, name } => {
                self.unit_progress = Some((index, total));
                self.progress = Some(0.0);
                self.status_message = self.translator.t_with(
                    "profile_progress_text",
                    &[
                        ("current", &index.to_string()),
                        ("total", &total.to_string()),
                        ("video", &name),
                    ],
                );
            }
            ProgressEvent::UnitComplete {
                index,
                total,
                name,
                success,
            } => {
                self.unit_progress = Some((index, total));
                let mark = if success { "ok" } else { "failed" };
                self.output.push(format!("[{index}/{total}] {mark}: {name}"));
            }
        }
    }

    pub(super) fn finish_single(&mut self, result: Result<Downloaded, String>) {
        let stopped = self.take_job().is_some_and(|job| job.cancel.is_stopped());

        match result {
            Ok(downloaded) => {
                self.progress = Some(100.0);
                self.status_message = self
                    .translator
                    .t_with("download_success_message", &[("title", &downloaded.title)]);
                self.output
                    .push(format!("Saved to {}", downloaded.path.display()));
            }
            Err(_) if stopped => {
                self.status_message = self.t("download_stopped").to_string();
            }
            Err(err) => {
                self.output.push(err.clone());
                self.status_message = self.translator.t_with(
                    "download_failed_message",
                    &[("error", &truncate_message(&err))],
                );
            }
        }
        self.reload_history();
    }

    pub(super) fn finish_batch(&mut self, summary: BatchSummary) {
        let kind = self.take_job().map(|job| job.kind);

        for (url, error) in &summary.failures {
            self.output.push(format!("failed: {url}: {error}"));
        }

        self.status_message = if summary.stopped {
            self.t("download_stopped").to_string()
        } else if kind == Some(JobKind::Profile) {
            self.translator.t_with(
                "profile_download_success",
                &[
                    ("done", &summary.succeeded.to_string()),
                    ("total", &summary.total.to_string()),
                ],
            )
        } else {
            self.translator.t_with(
                "batch_summary",
                &[
                    ("succeeded", &summary.succeeded.to_string()),
                    ("failed", &summary.failed.to_string()),
                    ("skipped", &summary.skipped.to_string()),
                ],
            )
        };
        self.output.push(self.status_message.clone());

        if kind == Some(JobKind::Batch) {
            self.batch.finish(summary);
        }
        self.reload_history();
    }

    fn start_single(&mut self, url: String) {
        let output_dir = Some(self.output_dir_input.value().trim())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        let filename = Some(self.filename_input.value().trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let request = DownloadRequest::single(url.clone(), self.convert_mp3)
            .with_output_dir(output_dir)
            .with_filename(filename);
        let orchestrator = self.orchestrator();
        let cancel = self.begin_job(JobKind::Single, &url);
        let worker_cancel = cancel.clone();

        let started = self.spawn_worker(Worker::Download, move |tx| {
            let mut on_progress = |event| {
                let _ = tx.send(WorkerEvent::Progress(event));
            };
            let result = orchestrator
                .dispatcher()
                .download(&request, &worker_cancel, &mut on_progress)
                .map_err(|err| err.to_string());
            WorkerEvent::SingleFinished(result)
        });
        if !started {
            self.job = None;
        }
    }

    fn start_profile(&mut self, url: String) {
        let convert_mp3 = self.convert_mp3;
        let orchestrator = self.orchestrator();
        let cancel = self.begin_job(JobKind::Profile, &url);
        let worker_cancel = cancel.clone();
        self.status_message = self.t("profile_download_start").to_string();
        log::info!("starting profile download for @{}", profile_name(&url));

        let started = self.spawn_worker(Worker::Download, move |tx| {
            let mut on_progress = |event| {
                let _ = tx.send(WorkerEvent::Progress(event));
            };
            let summary = orchestrator.run_profile(&url, convert_mp3, &worker_cancel, &mut on_progress);
            WorkerEvent::BatchFinished(summary)
        });
        if !started {
            self.job = None;
        }
    }

    fn start_batch(&mut self, tasks: Vec<BatchTask>) {
        let convert_mp3 = self.convert_mp3;
        let orchestrator = self.orchestrator();
        let heading = format!("batch of {} links", tasks.len());
        let cancel = self.begin_job(JobKind::Batch, &heading);
        let worker_cancel = cancel.clone();

        let started = self.spawn_worker(Worker::Download, move |tx| {
            let mut on_progress = |event| {
                let _ = tx.send(WorkerEvent::Progress(event));
            };
            let summary = orchestrator.run_batch(tasks, convert_mp3, &worker_cancel, &mut on_progress);
            WorkerEvent::BatchFinished(summary)
        });
        if !started {
            self.job = None;
            self.batch = BatchState::Idle;
        }
    }

    fn begin_job(&mut self, kind: JobKind, target: &str) -> CancelToken {
        let cancel = CancelToken::new();
        self.job = Some(RunningJob {
            kind,
            cancel: cancel.clone(),
        });
        self.progress = Some(0.0);
        self.unit_progress = None;
        self.spinner_frame = 0;
        self.status_message = self.t("downloading").to_string();
        self.output.reset(format!("{} {target}", self.t("downloading")));
        cancel
    }

    fn take_job(&mut self) -> Option<RunningJob> {
        self.job.take()
    }

    pub(super) fn url_edited(&mut self) {
        if self.batch.discard_staged() {
            log::debug!("discarded staged batch after URL edit");
        }
        if let Some(probe) = self.profile_probe.take() {
            probe.stop();
        }
        self.profile_banner = None;
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::app::test_support;

    use super::*;

    #[test]
    fn banner_tracks_url_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        assert_eq!(app.url_banner(), None);

        app.url_input.set("https://www.tiktok.com/@alice");
        assert_eq!(app.url_banner(), Some(UrlBanner::Profile));

        app.url_input.set("https://www.tiktok.com/@alice/video/123");
        assert_eq!(app.url_banner(), Some(UrlBanner::Video));

        app.url_input.set("https://example.com/x");
        assert_eq!(app.url_banner(), Some(UrlBanner::Invalid));

        let links = dir.path().join("links.txt");
        fs::write(&links, "https://www.tiktok.com/@alice\n").expect("write links");
        app.url_input.set(links.display().to_string());
        assert_eq!(app.url_banner(), Some(UrlBanner::LinkFile));
    }

    #[test]
    fn editing_the_url_discards_a_staged_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        let links = dir.path().join("links.txt");
        fs::write(
            &links,
            "https://www.tiktok.com/@alice/video/1\nnot a link\nhttps://www.tiktok.com/@bob\n",
        )
        .expect("write links");

        app.url_input.set(links.display().to_string());
        app.import_batch_file();
        let staged = app.batch.staged().expect("batch staged");
        assert_eq!(staged.tasks.len(), 2);
        assert_eq!(staged.invalid, vec!["not a link".to_string()]);
        assert!(app.status_message.contains("2 links"));

        app.push_download_char('x');
        assert_eq!(app.batch, BatchState::Idle);
    }

    #[test]
    fn optional_fields_take_typing_without_touching_the_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.url_input.set("https://www.tiktok.com/@alice");
        app.profile_banner = Some("@alice".to_string());

        app.next_download_field();
        assert_eq!(app.download_field, DownloadField::OutputDir);
        for ch in "/tmp/clips".chars() {
            app.push_download_char(ch);
        }
        app.next_download_field();
        app.paste("my clip\n");
        app.backspace_download();

        assert_eq!(app.output_dir_input.value(), "/tmp/clips");
        assert_eq!(app.filename_input.value(), "my cli");
        assert_eq!(app.url_input.value(), "https://www.tiktok.com/@alice");
        assert_eq!(app.profile_banner.as_deref(), Some("@alice"));

        app.clear_url();
        assert_eq!(app.filename_input.value(), "");
        app.previous_download_field();
        app.previous_download_field();
        assert_eq!(app.download_field, DownloadField::Url);
    }

    #[test]
    fn missing_download_folder_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.open_download_folder();
        assert_eq!(app.status_message, "File not found");
    }

    #[test]
    fn empty_and_invalid_urls_never_start_a_job() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.start_download();
        assert_eq!(app.status_message, "Please enter a URL");

        app.url_input.set("https://example.com/video/1");
        app.start_download();
        assert_eq!(app.status_message, "Invalid TikTok URL");
        assert!(!app.job_is_running());
    }

    #[test]
    fn pause_and_stop_need_a_running_job() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());

        app.request_stop();
        assert!(app.pending_confirm().is_none());
        assert_eq!(app.status_message, "No download is running");

        app.begin_job(JobKind::Single, "url");
        app.toggle_pause();
        assert!(app.job_is_paused());
        app.toggle_pause();
        assert!(!app.job_is_paused());

        app.request_stop();
        assert!(matches!(app.pending_confirm(), Some(PendingConfirm::StopDownload)));
        app.confirm_pending();
        assert!(app.job.as_ref().is_some_and(|job| job.cancel.is_stopped()));

        app.finish_single(Err("stopped by user".to_string()));
        assert!(!app.job_is_running());
        assert_eq!(app.status_message, "Stopped by user");
    }

    #[test]
    fn progress_events_drive_gauge_and_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.begin_job(JobKind::Profile, "https://www.tiktok.com/@alice");

        app.apply_progress(ProgressEvent::UnitStarted {
            index: 2,
            total: 5,
            name: "clip".to_string(),
        });
        assert_eq!(app.status_message, "Downloading 2/5: clip...");
        assert_eq!(app.unit_progress, Some((2, 5)));

        app.apply_progress(ProgressEvent::Percent {
            percent: 42.0,
            line: "[download]  42.0%".to_string(),
        });
        assert_eq!(app.progress, Some(42.0));

        app.finish_batch(BatchSummary {
            total: 5,
            succeeded: 4,
            failed: 1,
            failures: vec![("u".to_string(), "boom".to_string())],
            ..BatchSummary::default()
        });
        assert_eq!(app.status_message, "Downloaded 4/5 videos");
        assert!(app.output.lines().iter().any(|line| line == "failed: u: boom"));
    }

    #[test]
    fn superseded_profile_probe_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_support::app(dir.path());
        app.finish_profile_info(Ok(ProfileInfo {
            handle: "alice".to_string(),
            video_count: 3,
        }));
        assert_eq!(app.profile_banner, None);

        app.profile_probe = Some(CancelToken::new());
        app.finish_profile_info(Ok(ProfileInfo {
            handle: "alice".to_string(),
            video_count: 30,
        }));
        assert_eq!(
            app.profile_banner.as_deref(),
            Some("👤 @alice - 30 videos available | Downloading 10 videos")
        );
    }

    #[cfg(unix)]
    #[test]
    fn single_download_runs_to_completion_through_worker_events() {
        use std::{
            os::unix::fs::PermissionsExt,
            thread,
            time::{Duration, Instant},
        };

        use crate::dispatcher::test_support::FAKE_YTDLP;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("yt-dlp");
        fs::write(&script, format!("#!/bin/sh\n{FAKE_YTDLP}")).expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

        let mut app = test_support::app(dir.path());
        let mut settings = app.settings.clone();
        settings.ytdlp_path = script.display().to_string();
        app.store.save_settings(&settings).expect("save settings");
        app.apply_settings(app.store.settings());

        app.url_input.set("https://www.tiktok.com/@alice/video/42");
        app.start_download();
        assert!(app.job_is_running());

        let deadline = Instant::now() + Duration::from_secs(20);
        while app.job_is_running() && Instant::now() < deadline {
            app.tick();
            thread::sleep(Duration::from_millis(20));
        }

        assert!(!app.job_is_running());
        assert_eq!(app.status_message, "Downloaded: clip-42");
        assert_eq!(app.history.len(), 1);
        assert!(dir.path().join("downloads").join("clip-42.webm").exists());
    }
}
