// Single-URL download pipeline.
// - Validate the URL, run yt-dlp into a private staging folder, convert to mp3 if asked.
// - Move the result into the resolved destination under a free name and record it in history.
// - Single downloads retry a few times with an interruptible delay; batch units run once.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    cancel::CancelToken,
    error::{AppError, Result},
    events::ProgressEvent,
    resolver::{move_into, resolve_handle, resolve_target_dir},
    store::{DownloadSource, HistoryEntry, MediaKind, Store},
    tool::{
        ToolCommand,
        ffmpeg::{Ffmpeg, is_mp3},
        process::ProcessRegistry,
        ytdlp::{DownloadArgs, YtDlp},
    },
    validators::{UrlKind, classify, is_valid_tiktok_url, sanitize_filename},
};

pub const SINGLE_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: Option<PathBuf>,
    pub convert_to_mp3: bool,
    pub filename: Option<String>,
    pub source: DownloadSource,
    /// Handle already known to the caller, e.g. the profile being expanded.
    pub profile: Option<String>,
    pub attempts: u32,
}

impl DownloadRequest {
    pub fn single(url: impl Into<String>, convert_to_mp3: bool) -> Self {
        Self {
            url: url.into().trim().to_string(),
            output_dir: None,
            convert_to_mp3,
            filename: None,
            source: DownloadSource::Single,
            profile: None,
            attempts: SINGLE_ATTEMPTS,
        }
    }

    /// One attempt, tagged with where the URL came from.
    pub fn unit(url: impl Into<String>, convert_to_mp3: bool, source: DownloadSource) -> Self {
        Self {
            source,
            attempts: 1,
            ..Self::single(url, convert_to_mp3)
        }
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub title: String,
    pub profile: Option<String>,
    pub kind: MediaKind,
}

#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<Store>,
    ytdlp: YtDlp,
    ffmpeg: Ffmpeg,
    processes: ProcessRegistry,
    retry_delay: Duration,
}

impl Dispatcher {
    /// Builds a dispatcher using the tool paths from settings.
    pub fn new(store: Arc<Store>, processes: ProcessRegistry) -> Self {
        let settings = store.settings();
        let ytdlp = YtDlp::new(ToolCommand::new(settings.ytdlp_path));
        let ffmpeg = Ffmpeg::new(ToolCommand::new(settings.ffmpeg_path));
        Self::with_tools(store, ytdlp, ffmpeg, processes)
    }

    pub fn with_tools(
        store: Arc<Store>,
        ytdlp: YtDlp,
        ffmpeg: Ffmpeg,
        processes: ProcessRegistry,
    ) -> Self {
        Self {
            store,
            ytdlp,
            ffmpeg,
            processes,
            retry_delay: RETRY_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn ytdlp(&self) -> &YtDlp {
        &self.ytdlp
    }

    pub fn processes(&self) -> &ProcessRegistry {
        &self.processes
    }

    pub fn download(
        &self,
        request: &DownloadRequest,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Downloaded> {
        if !is_valid_tiktok_url(&request.url) {
            return Err(AppError::InvalidUrl(request.url.clone()));
        }
        let kind = classify(&request.url);

        let attempts = request.attempts.max(1);
        let mut attempt = 1;
        loop {
            if cancel.is_stopped() {
                return Err(AppError::Cancelled);
            }

            match self.attempt(request, kind, cancel, on_progress) {
                Ok(downloaded) => return Ok(downloaded),
                Err(err @ (AppError::Cancelled | AppError::ToolMissing { .. })) => return Err(err),
                Err(err) if attempt >= attempts => {
                    log::warn!("download of {} failed: {err}", request.url);
                    return Err(err);
                }
                Err(err) => {
                    log::info!("attempt {attempt}/{attempts} for {} failed: {err}", request.url);
                    on_progress(ProgressEvent::Status {
                        message: format!("Attempt {attempt}/{attempts} failed, retrying: {err}"),
                    });
                    if !cancel.sleep(self.retry_delay) {
                        return Err(AppError::Cancelled);
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn attempt(
        &self,
        request: &DownloadRequest,
        kind: UrlKind,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Downloaded> {
        let staging = self
            .store
            .paths()
            .staging_dir(&uuid::Uuid::new_v4().to_string());
        let result = self.download_into_staging(request, kind, &staging, cancel, on_progress);
        if let Err(err) = fs::remove_dir_all(&staging)
            && staging.exists()
        {
            log::warn!("could not clean staging folder {}: {err}", staging.display());
        }
        result
    }

    fn download_into_staging(
        &self,
        request: &DownloadRequest,
        kind: UrlKind,
        staging: &Path,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Downloaded> {
        let settings = self.store.settings();
        let filename = request
            .filename
            .as_deref()
            .map(sanitize_filename)
            .filter(|name| !name.is_empty());

        let report = self.ytdlp.download(
            &DownloadArgs {
                url: &request.url,
                staging_dir: staging,
                filename: filename.as_deref(),
                quality: settings.video_quality,
                audio_only: request.convert_to_mp3,
                playlist: kind == UrlKind::Profile,
            },
            &self.processes,
            cancel,
            on_progress,
        )?;

        let produced = report
            .output_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| AppError::FileNotFound(staging.to_path_buf()))?;

        let produced = if request.convert_to_mp3 {
            let sibling = produced.with_extension("mp3");
            if is_mp3(&produced) {
                produced
            } else if sibling.is_file() {
                sibling
            } else {
                on_progress(ProgressEvent::Status {
                    message: "Converting to MP3...".to_string(),
                });
                self.ffmpeg
                    .convert_to_mp3(&produced, &self.processes, cancel)?
            }
        } else {
            produced
        };

        let handle = request.profile.clone().or_else(|| {
            resolve_handle(
                &request.url,
                request.output_dir.as_deref(),
                report.uploader_id.as_deref(),
            )
        });
        // Single downloads stay flat; profile and batch runs group by creator.
        let folder_handle = match request.source {
            DownloadSource::Single => None,
            DownloadSource::Profile | DownloadSource::Batch => handle.as_deref(),
        };
        let target_dir = resolve_target_dir(
            &settings.download_path,
            request.output_dir.as_deref(),
            folder_handle,
            settings.create_profile_folders,
        );
        let path = move_into(&produced, &target_dir)?;

        let title = report.title.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Unknown".to_string())
        });
        let media_kind = if request.convert_to_mp3 {
            MediaKind::Mp3
        } else {
            MediaKind::Video
        };

        let entry = HistoryEntry::new(
            title.clone(),
            request.url.clone(),
            media_kind,
            path.display().to_string(),
        )
        .with_source(request.source)
        .with_profile(handle.clone());
        if let Err(err) = self.store.append_history(entry) {
            log::warn!("could not record history for {}: {err}", request.url);
        }

        log::info!("downloaded {} -> {}", request.url, path.display());
        Ok(Downloaded {
            path,
            title,
            profile: handle,
            kind: media_kind,
        })
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::{fs, path::Path};

    use super::*;
    use crate::paths::AppPaths;

    /// Shell stand-in for yt-dlp: writes `<title>.webm` into the `-o` template folder.
    /// Flat listings print three videos of @alice.
    pub(crate) const FAKE_YTDLP: &str = r#"
case " $* " in
  *" --flat-playlist "*)
    for id in 1 2 3; do echo "$id https://www.tiktok.com/@alice/video/$id"; done
    exit 0 ;;
esac
out=""
prev=""
url=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
  url="$arg"
done
case "$url" in *fail*) echo "ERROR: Unable to download webpage" >&2; exit 1 ;; esac
name=$(basename "$url")
file=$(printf '%s' "$out" | sed -e "s/%(title).80s/clip-$name/" -e 's/%(ext)s/webm/')
printf 'data' > "$file"
echo "[download]  50.0% of 1.00MiB"
echo "[download] 100.0% of 1.00MiB"
echo "ttdl:title=clip-$name"
echo "ttdl:uploader=uploader"
echo "ttdl:filepath=$file"
"#;

    /// Shell stand-in for ffmpeg: writes the last argument as the output file.
    pub(crate) const FAKE_FFMPEG: &str = r#"
for arg in "$@"; do last="$arg"; done
printf 'mp3' > "$last"
"#;

    pub(crate) fn script(dir: &Path, name: &str, body: &str) -> ToolCommand {
        let path = dir.join(name);
        fs::write(&path, body).expect("write script");
        ToolCommand::with_prefix_args("sh", vec![path.display().to_string()])
    }

    pub(crate) fn dispatcher(dir: &Path, ytdlp_body: &str) -> Dispatcher {
        let store = Arc::new(Store::open(AppPaths::new(dir.join("data"))));
        store
            .set("download_path", dir.join("downloads"))
            .expect("set download path");
        Dispatcher::with_tools(
            store,
            YtDlp::new(script(dir, "yt-dlp.sh", ytdlp_body)),
            Ffmpeg::new(script(dir, "ffmpeg.sh", FAKE_FFMPEG)),
            ProcessRegistry::new(),
        )
        .with_retry_delay(Duration::from_millis(1))
    }
}
