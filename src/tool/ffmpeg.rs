// ffmpeg audio transcoding.
// - Used when an audio-only download did not already come back as mp3.
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{cancel::CancelToken, error::Result};

use super::{
    ToolCommand,
    process::{ProcessRegistry, run_captured, run_streaming},
};

pub const MP3_BITRATE: &str = "192k";

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    tool: ToolCommand,
}

impl Ffmpeg {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }

    pub fn is_available(&self) -> bool {
        run_captured(&self.tool, &["-version".to_string()])
            .map(|run| run.success())
            .unwrap_or(false)
    }

    /// Transcodes `input` to an mp3 next to it and removes the source. Returns the mp3 path.
    pub fn convert_to_mp3(
        &self,
        input: &Path,
        registry: &ProcessRegistry,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        if is_mp3(input) {
            return Ok(input.to_path_buf());
        }

        let output = input.with_extension("mp3");
        let argv = build_mp3_args(input, &output);
        let run = run_streaming(&self.tool, &argv, registry, cancel, &mut |_, _| {})?;
        if !run.success() {
            let _ = fs::remove_file(&output);
            return Err(run.into_tool_error(&self.tool.name()));
        }

        if let Err(err) = fs::remove_file(input) {
            log::warn!("converted {} but could not remove source: {err}", input.display());
        }
        Ok(output)
    }
}

pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

pub fn build_mp3_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-vn".to_string(),
        "-codec:a".to_string(),
        "libmp3lame".to_string(),
        "-b:a".to_string(),
        MP3_BITRATE.to_string(),
        output.display().to_string(),
    ]
}
