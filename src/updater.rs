// yt-dlp version query and self-update.
// - pip installs are upgraded through the first Python interpreter found.
// - Standalone yt-dlp binaries (no Python on PATH) fall back to `yt-dlp -U`.
use crate::{
    error::{AppError, Result, truncate_message},
    tool::{ToolCommand, process::run_captured, ytdlp::YtDlp},
};

const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub message: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Updater {
    ytdlp: YtDlp,
    pythons: Vec<ToolCommand>,
}

impl Updater {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self {
            ytdlp,
            pythons: PYTHON_CANDIDATES.into_iter().map(ToolCommand::new).collect(),
        }
    }

    #[cfg(test)]
    pub fn with_pythons(ytdlp: YtDlp, pythons: Vec<ToolCommand>) -> Self {
        Self { ytdlp, pythons }
    }

    pub fn version(&self) -> Result<String> {
        self.ytdlp.version()
    }

    pub fn update(&self) -> Result<UpdateOutcome> {
        let pip_args = ["-m", "pip", "install", "--upgrade", "yt-dlp"].map(str::to_string);

        for python in &self.pythons {
            let run = match run_captured(python, &pip_args) {
                Ok(run) => run,
                Err(AppError::ToolMissing { .. }) => continue,
                Err(err) => return Err(err),
            };
            if !run.success() {
                return Err(update_failed(python.name(), run.stderr_lines.join("\n")));
            }

            log::info!("yt-dlp upgraded through {}", python.name());
            return Ok(UpdateOutcome {
                message: "yt-dlp updated successfully!".to_string(),
                version: self.version().ok(),
            });
        }

        log::info!("no python interpreter found, trying yt-dlp -U");
        let tool = self.ytdlp.tool();
        let run = run_captured(tool, &["-U".to_string()])?;
        if !run.success() {
            return Err(update_failed(tool.name(), run.stderr_lines.join("\n")));
        }
        Ok(UpdateOutcome {
            message: run
                .stdout_lines
                .last()
                .cloned()
                .unwrap_or_else(|| "yt-dlp updated successfully!".to_string()),
            version: self.version().ok(),
        })
    }

    /// True when pip reports a newer yt-dlp than the installed one.
    pub fn check_for_updates(&self) -> Result<bool> {
        let args = ["-m", "pip", "list", "--outdated"].map(str::to_string);
        for python in &self.pythons {
            let run = match run_captured(python, &args) {
                Ok(run) => run,
                Err(AppError::ToolMissing { .. }) => continue,
                Err(err) => return Err(err),
            };
            if !run.success() {
                return Err(update_failed(python.name(), run.stderr_lines.join("\n")));
            }
            return Ok(run.stdout_lines.iter().any(|line| lists_ytdlp(line)));
        }
        Err(AppError::ToolMissing {
            tool: "python".to_string(),
        })
    }
}

fn lists_ytdlp(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|name| name.eq_ignore_ascii_case("yt-dlp") || name.eq_ignore_ascii_case("yt_dlp"))
}

fn update_failed(tool: String, stderr: String) -> AppError {
    AppError::ToolFailed {
        tool,
        code: None,
        stderr: truncate_message(&stderr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outdated_listing_matches_package_name_only() {
        assert!(lists_ytdlp("yt-dlp     2024.1.1  2024.8.6  wheel"));
        assert!(lists_ytdlp("yt_dlp 1 2 wheel"));
        assert!(!lists_ytdlp("yt-dlp-plugins 1 2 wheel"));
        assert!(!lists_ytdlp("requests 2.0 2.1 wheel"));
    }

    #[cfg(unix)]
    #[test]
    fn failed_pip_surfaces_stderr() {
        let python = ToolCommand::with_prefix_args(
            "sh",
            vec![
                "-c".to_string(),
                "echo 'ERROR: no network' >&2; exit 1".to_string(),
            ],
        );
        let updater = Updater::with_pythons(YtDlp::new(ToolCommand::new("yt-dlp")), vec![python]);
        let err = updater.update().expect_err("pip failure");
        assert!(err.to_string().contains("no network"));
    }

    #[test]
    fn missing_interpreters_fall_through_to_standalone_binary() {
        let updater = Updater::with_pythons(
            YtDlp::new(ToolCommand::new("ttdl-no-such-yt-dlp")),
            vec![ToolCommand::new("ttdl-no-such-python")],
        );
        let err = updater.update().expect_err("nothing installed");
        assert!(matches!(err, AppError::ToolMissing { .. }));
    }
}
