// Messages sent from worker threads to the UI loop.
// - Workers never touch UI state; they only send these over an mpsc channel.
use crate::{dispatcher::Downloaded, orchestrator::BatchSummary, updater::UpdateOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A parsed `[download] NN.N%` line from the downloader.
    Percent { percent: f64, line: String },
    Status { message: String },
    /// One unit of a profile or batch run finished, successfully or not.
    UnitComplete {
        index: usize,
        total: usize,
        name: String,
        success: bool,
    },
    /// Raw tool output for the log panel.
    Output { stream: OutputStream, line: String },
    /// A unit of a multi-item run is starting.
    UnitStarted {
        index: usize,
        total: usize,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct ProfileInfo {
    pub handle: String,
    pub video_count: usize,
}

/// Result of the startup tool probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolStatus {
    /// `None` when yt-dlp could not be run.
    pub ytdlp_version: Option<String>,
    pub ffmpeg_available: bool,
    pub ytdlp_outdated: bool,
}

/// Which background job a worker thread was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worker {
    Download,
    ProfileInfo,
    Update,
    Version,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(ProgressEvent),
    SingleFinished(Result<Downloaded, String>),
    BatchFinished(BatchSummary),
    ProfileInfo(Result<ProfileInfo, String>),
    UpdateFinished(Result<UpdateOutcome, String>),
    ToolsChecked(ToolStatus),
    /// Worker panicked before producing a result.
    Crashed { worker: Worker, message: String },
}
