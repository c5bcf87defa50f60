// yt-dlp invocation and output parsing.
// - Downloads land in a per-job staging folder; `--print after_move:` markers report the final file.
// - Flat listing expands a profile into member video URLs without downloading.
// - Progress comes from `--newline` `[download] NN.N%` lines.
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::SystemTime,
};

use regex::Regex;

use crate::{
    cancel::CancelToken,
    error::Result,
    events::{OutputStream, ProgressEvent},
    store::QualityTier,
};

use super::{
    ToolCommand,
    process::{CapturedRun, ProcessRegistry, run_captured, run_streaming},
};

pub const USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TEMPLATE: &str = "%(title).80s.%(ext)s";
const SOCKET_TIMEOUT_SECS: &str = "30";

const FILEPATH_MARKER: &str = "ttdl:filepath=";
const TITLE_MARKER: &str = "ttdl:title=";
const UPLOADER_MARKER: &str = "ttdl:uploader=";

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent regex"));

#[derive(Debug, Clone)]
pub struct DownloadArgs<'a> {
    pub url: &'a str,
    pub staging_dir: &'a Path,
    pub filename: Option<&'a str>,
    pub quality: QualityTier,
    pub audio_only: bool,
    pub playlist: bool,
}

/// What yt-dlp said about the file it produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub filepath: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub title: Option<String>,
    pub uploader_id: Option<String>,
}

impl DownloadReport {
    pub fn observe(&mut self, line: &str) {
        let line = line.trim();
        if let Some(path) = line.strip_prefix(FILEPATH_MARKER) {
            if !path.is_empty() && path != "NA" {
                self.filepath = Some(PathBuf::from(path));
            }
        } else if let Some(title) = line.strip_prefix(TITLE_MARKER) {
            if !title.is_empty() && title != "NA" {
                self.title = Some(title.to_string());
            }
        } else if let Some(uploader) = line.strip_prefix(UPLOADER_MARKER) {
            if !uploader.is_empty() && uploader != "NA" {
                self.uploader_id = Some(uploader.to_string());
            }
        } else if let Some(path) = parse_destination_line(line) {
            self.destination = Some(PathBuf::from(path));
        }
    }

    /// Best guess at the finished file: the after-move path, then the last announced destination.
    pub fn output_path(&self) -> Option<&Path> {
        self.filepath
            .as_deref()
            .filter(|path| path.is_file())
            .or_else(|| self.destination.as_deref().filter(|path| path.is_file()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    tool: ToolCommand,
}

impl YtDlp {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &ToolCommand {
        &self.tool
    }

    pub fn version(&self) -> Result<String> {
        let run = run_captured(&self.tool, &["--version".to_string()])?;
        if !run.success() {
            return Err(run.into_tool_error(&self.tool.name()));
        }
        Ok(run.stdout_lines.first().cloned().unwrap_or_default())
    }

    pub fn download(
        &self,
        args: &DownloadArgs<'_>,
        registry: &ProcessRegistry,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<DownloadReport> {
        fs::create_dir_all(args.staging_dir)?;
        let argv = build_download_args(args);
        on_progress(ProgressEvent::Status {
            message: format!("$ {}", self.tool.command_line(&argv)),
        });

        let mut report = DownloadReport::default();
        // --print implies --quiet, so progress may arrive on either stream.
        let run = run_streaming(&self.tool, &argv, registry, cancel, &mut |stream, line| {
            report.observe(line);
            if let Some(percent) = parse_progress_percent(line) {
                on_progress(ProgressEvent::Percent {
                    percent,
                    line: line.to_string(),
                });
                return;
            }
            on_progress(ProgressEvent::Output {
                stream,
                line: line.to_string(),
            });
        })?;

        if !run.success() {
            return Err(run.into_tool_error(&self.tool.name()));
        }

        if report.output_path().is_none() {
            report.filepath = find_newest_output(args.staging_dir);
        }
        Ok(report)
    }

    /// Lists a profile's videos without downloading them. `limit` of `None` lists everything.
    pub fn list_flat(
        &self,
        url: &str,
        handle: Option<&str>,
        limit: Option<usize>,
        registry: &ProcessRegistry,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<FlatEntry>> {
        let argv = build_flat_args(url, limit);
        let run = run_streaming(&self.tool, &argv, registry, cancel, &mut |stream, line| {
            if stream == OutputStream::Stderr {
                on_progress(ProgressEvent::Output {
                    stream,
                    line: line.to_string(),
                });
            }
        })?;

        let entries = parse_flat_entries(&run, handle, limit);
        // --ignore-errors can exit non-zero after a partial listing; only fail when nothing came back.
        if entries.is_empty() && !run.success() {
            return Err(run.into_tool_error(&self.tool.name()));
        }
        Ok(entries)
    }
}

pub fn build_download_args(args: &DownloadArgs<'_>) -> Vec<String> {
    let template = match args.filename {
        Some(name) if !name.trim().is_empty() => format!("{}.%(ext)s", name.trim()),
        _ => DEFAULT_TEMPLATE.to_string(),
    };
    let output = args.staging_dir.join(template);

    let mut argv = vec![
        "--newline".to_string(),
        "--progress".to_string(),
        "--no-warnings".to_string(),
        "--no-check-certificate".to_string(),
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "--user-agent".to_string(),
        USER_AGENT.to_string(),
        "-o".to_string(),
        output.display().to_string(),
        if args.playlist {
            "--yes-playlist".to_string()
        } else {
            "--no-playlist".to_string()
        },
    ];

    if args.audio_only {
        argv.extend(
            [
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
            ]
            .map(str::to_string),
        );
    } else {
        argv.extend(["-f".to_string(), args.quality.format_selector().to_string()]);
    }

    for marker in [
        format!("after_move:{FILEPATH_MARKER}%(filepath)s"),
        format!("after_move:{TITLE_MARKER}%(title)s"),
        format!("after_move:{UPLOADER_MARKER}%(uploader_id)s"),
    ] {
        argv.push("--print".to_string());
        argv.push(marker);
    }

    argv.push(args.url.to_string());
    argv
}

pub fn build_flat_args(url: &str, limit: Option<usize>) -> Vec<String> {
    let mut argv = vec![
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "--flat-playlist".to_string(),
        "--skip-download".to_string(),
        "--ignore-errors".to_string(),
        "--no-warnings".to_string(),
        "--print".to_string(),
        "%(id)s %(url)s".to_string(),
    ];
    if let Some(limit) = limit {
        argv.push("--playlist-end".to_string());
        argv.push(limit.to_string());
    }
    argv.push(url.to_string());
    argv
}

pub fn parse_progress_percent(line: &str) -> Option<f64> {
    if !line.contains("[download]") {
        return None;
    }
    PERCENT
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|percent| percent.clamp(0.0, 100.0))
}

fn parse_destination_line(line: &str) -> Option<&str> {
    for prefix in ["[download] Destination:", "[ExtractAudio] Destination:"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            let path = rest.trim();
            if !path.is_empty() {
                return Some(path);
            }
        }
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        let path = rest.trim_end_matches('"');
        if !path.is_empty() {
            return Some(path);
        }
    }

    line.strip_prefix("[download] ")
        .and_then(|rest| rest.strip_suffix(" has already been downloaded"))
}

fn parse_flat_entries(run: &CapturedRun, handle: Option<&str>, limit: Option<usize>) -> Vec<FlatEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for line in &run.stdout_lines {
        let line = line.trim();
        let (id, url) = line.split_once(' ').unwrap_or((line, "NA"));
        if id.is_empty() || id == "NA" {
            continue;
        }

        let url = if url.starts_with("http") {
            url.to_string()
        } else if let Some(handle) = handle {
            format!("https://www.tiktok.com/@{handle}/video/{id}")
        } else {
            continue;
        };

        if seen.insert(url.clone()) {
            entries.push(FlatEntry {
                id: id.to_string(),
                url,
            });
        }
    }

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Newest finished media file in a staging folder, ignoring partial downloads.
pub fn find_newest_output(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            !name.starts_with('.')
                && !name.ends_with(".part")
                && !name.ends_with(".ytdl")
                && !name.contains(".temp.")
        })
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
}
