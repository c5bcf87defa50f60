// Profile and batch runs built on the single-download dispatcher.
// - Profiles expand through yt-dlp's flat listing, capped by the configured limit.
// - Imported link files become an ordered, de-duplicated task list.
// - Units run strictly in order; pause and stop are checked before each one.
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use crate::{
    cancel::CancelToken,
    dispatcher::{DownloadRequest, Dispatcher},
    error::{AppError, Result},
    events::{ProfileInfo, ProgressEvent},
    store::DownloadSource,
    validators::{UrlKind, classify, extract_handle, is_valid_profile_url},
};

pub const FALLBACK_PROFILE_NAME: &str = "tiktok_profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Video,
    Profile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTask {
    pub url: String,
    pub kind: TaskKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub tasks: Vec<BatchTask>,
    pub duplicates: Vec<String>,
    pub invalid: Vec<String>,
}

impl ImportReport {
    pub fn profile_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.kind == TaskKind::Profile)
            .count()
    }

    pub fn video_count(&self) -> usize {
        self.tasks.len() - self.profile_count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `(url, error)` for every failed unit, in run order.
    pub failures: Vec<(String, String)>,
    pub stopped: bool,
}

impl BatchSummary {
    fn record_failure(&mut self, url: &str, err: &AppError) {
        self.failed += 1;
        self.failures.push((url.to_string(), err.to_string()));
    }
}

/// Lifecycle of the staged batch shown on the download tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BatchState {
    #[default]
    Idle,
    Loaded(ImportReport),
    Running,
    Completed(BatchSummary),
    StoppedByUser(BatchSummary),
}

impl BatchState {
    pub fn load(&mut self, report: ImportReport) {
        *self = Self::Loaded(report);
    }

    /// Editing the URL field drops staged tasks. Running batches are unaffected.
    pub fn discard_staged(&mut self) -> bool {
        if matches!(self, Self::Loaded(_) | Self::Completed(_) | Self::StoppedByUser(_)) {
            *self = Self::Idle;
            return true;
        }
        false
    }

    /// Moves a loaded batch to running and hands out its tasks.
    pub fn start(&mut self) -> Option<Vec<BatchTask>> {
        if !matches!(self, Self::Loaded(_)) {
            return None;
        }
        let Self::Loaded(report) = std::mem::replace(self, Self::Running) else {
            return None;
        };
        Some(report.tasks)
    }

    pub fn finish(&mut self, summary: BatchSummary) {
        *self = if summary.stopped {
            Self::StoppedByUser(summary)
        } else {
            Self::Completed(summary)
        };
    }

    pub fn staged(&self) -> Option<&ImportReport> {
        match self {
            Self::Loaded(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

pub fn parse_batch_text(text: &str) -> ImportReport {
    let mut report = ImportReport::default();
    let mut seen = HashSet::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let kind = match classify(line) {
            UrlKind::Profile => TaskKind::Profile,
            UrlKind::Video | UrlKind::Generic => TaskKind::Video,
            UrlKind::NotPlatform => {
                report.invalid.push(line.to_string());
                continue;
            }
        };

        if !seen.insert(line.to_lowercase()) {
            report.duplicates.push(line.to_string());
            continue;
        }
        report.tasks.push(BatchTask {
            url: line.to_string(),
            kind,
        });
    }

    report
}

pub fn load_batch_file(path: &Path) -> Result<ImportReport> {
    if !path.is_file() {
        return Err(AppError::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(parse_batch_text(&text))
}

/// Keeps at most `limit` video tasks per creator handle. Returns kept tasks and the skip count.
pub fn apply_profile_limit(tasks: Vec<BatchTask>, limit: Option<usize>) -> (Vec<BatchTask>, usize) {
    let Some(limit) = limit else {
        return (tasks, 0);
    };

    let mut per_handle: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0;
    let kept = tasks
        .into_iter()
        .filter(|task| {
            if task.kind != TaskKind::Video {
                return true;
            }
            let Some(handle) = extract_handle(&task.url) else {
                return true;
            };
            let count = per_handle.entry(handle.to_lowercase()).or_default();
            *count += 1;
            if *count > limit {
                skipped += 1;
                false
            } else {
                true
            }
        })
        .collect();
    (kept, skipped)
}

struct Unit {
    url: String,
    source: DownloadSource,
    profile: Option<String>,
}

#[derive(Clone)]
pub struct Orchestrator {
    dispatcher: Dispatcher,
}

impl Orchestrator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn profile_info(&self, url: &str, cancel: &CancelToken) -> Result<ProfileInfo> {
        let handle = profile_name(url);
        let entries = self.dispatcher.ytdlp().list_flat(
            url,
            Some(&handle),
            None,
            self.dispatcher.processes(),
            cancel,
            &mut |_| {},
        )?;
        Ok(ProfileInfo {
            handle,
            video_count: entries.len(),
        })
    }

    /// Member video URLs of a profile, in listing order, capped at `limit` when set.
    pub fn expand_profile(
        &self,
        url: &str,
        limit: Option<usize>,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<String>> {
        if !is_valid_profile_url(url) {
            return Err(AppError::InvalidUrl(url.to_string()));
        }

        let handle = profile_name(url);
        on_progress(ProgressEvent::Status {
            message: format!("Fetching video list for @{handle}..."),
        });
        let entries = self.dispatcher.ytdlp().list_flat(
            url,
            Some(&handle),
            limit,
            self.dispatcher.processes(),
            cancel,
            on_progress,
        )?;
        Ok(entries.into_iter().map(|entry| entry.url).collect())
    }

    pub fn run_profile(
        &self,
        url: &str,
        convert_to_mp3: bool,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let limit = self.dispatcher.store().settings().profile_limit();

        let urls = match self.expand_profile(url, limit, cancel, on_progress) {
            Ok(urls) => urls,
            Err(AppError::Cancelled) => {
                summary.stopped = true;
                return summary;
            }
            Err(err) => {
                summary.total = 1;
                summary.record_failure(url, &err);
                return summary;
            }
        };

        let profile = Some(profile_name(url));
        let units = urls
            .into_iter()
            .map(|url| Unit {
                url,
                source: DownloadSource::Profile,
                profile: profile.clone(),
            })
            .collect::<Vec<_>>();
        summary.total = units.len();
        let total = units.len();
        self.run_units(units, 0, total, convert_to_mp3, cancel, on_progress, &mut summary);
        summary
    }

    pub fn run_batch(
        &self,
        tasks: Vec<BatchTask>,
        convert_to_mp3: bool,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> BatchSummary {
        let limit = self.dispatcher.store().settings().profile_limit();
        let (tasks, skipped) = apply_profile_limit(tasks, limit);

        let mut summary = BatchSummary {
            skipped,
            total: tasks.len() + skipped,
            ..BatchSummary::default()
        };
        let mut planned = tasks.len();
        let mut index = 0;

        for task in tasks {
            if cancel.is_stopped() {
                summary.stopped = true;
                break;
            }

            match task.kind {
                TaskKind::Video => {
                    let unit = Unit {
                        url: task.url,
                        source: DownloadSource::Batch,
                        profile: None,
                    };
                    index = self.run_units(
                        vec![unit],
                        index,
                        planned,
                        convert_to_mp3,
                        cancel,
                        on_progress,
                        &mut summary,
                    );
                }
                TaskKind::Profile => {
                    let urls = match self.expand_profile(&task.url, limit, cancel, on_progress) {
                        Ok(urls) => urls,
                        Err(AppError::Cancelled) => {
                            summary.stopped = true;
                            break;
                        }
                        Err(err) => {
                            index += 1;
                            summary.record_failure(&task.url, &err);
                            on_progress(ProgressEvent::UnitComplete {
                                index,
                                total: planned,
                                name: task.url.clone(),
                                success: false,
                            });
                            continue;
                        }
                    };

                    // The profile task itself is replaced by its videos.
                    planned = planned - 1 + urls.len();
                    summary.total = summary.total - 1 + urls.len();
                    let profile = Some(profile_name(&task.url));
                    let units = urls
                        .into_iter()
                        .map(|url| Unit {
                            url,
                            source: DownloadSource::Profile,
                            profile: profile.clone(),
                        })
                        .collect();
                    index = self.run_units(
                        units,
                        index,
                        planned,
                        convert_to_mp3,
                        cancel,
                        on_progress,
                        &mut summary,
                    );
                }
            }

            if summary.stopped {
                break;
            }
        }

        log::info!(
            "batch finished: {} ok, {} failed, {} skipped, stopped={}",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.stopped
        );
        summary
    }

    /// Runs units in order starting after `index`; returns the last index reached.
    #[allow(clippy::too_many_arguments)]
    fn run_units(
        &self,
        units: Vec<Unit>,
        mut index: usize,
        total: usize,
        convert_to_mp3: bool,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
        summary: &mut BatchSummary,
    ) -> usize {
        for unit in units {
            if !cancel.wait_while_paused() || cancel.is_stopped() {
                summary.stopped = true;
                break;
            }

            index += 1;
            on_progress(ProgressEvent::UnitStarted {
                index,
                total,
                name: unit.url.clone(),
            });

            let request = DownloadRequest::unit(unit.url.clone(), convert_to_mp3, unit.source)
                .with_profile(unit.profile);
            let (name, success) = match self.dispatcher.download(&request, cancel, on_progress) {
                Ok(downloaded) => {
                    summary.succeeded += 1;
                    (downloaded.title, true)
                }
                Err(err) if err.is_cancelled() => {
                    summary.stopped = true;
                    break;
                }
                Err(err) => {
                    summary.record_failure(&unit.url, &err);
                    (unit.url, false)
                }
            };

            on_progress(ProgressEvent::UnitComplete {
                index,
                total,
                name,
                success,
            });
        }
        index
    }
}

pub fn profile_name(url: &str) -> String {
    extract_handle(url).unwrap_or_else(|| FALLBACK_PROFILE_NAME.to_string())
}
