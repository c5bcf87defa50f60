// External command-line tools (yt-dlp, ffmpeg, pip).
// - `ToolCommand` names a program plus fixed leading args, so tests can swap in scripts.
// - Process spawning and streaming live in `process`; tool-specific args in the submodules.
pub mod ffmpeg;
pub mod process;
pub mod ytdlp;

use std::{ffi::OsStr, path::Path, process::Command};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    prefix_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_prefix_args(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    /// Short name for messages: the program's file name without directories.
    pub fn name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }

    pub fn command(&self) -> Command {
        let mut cmd = background_command(&self.program);
        cmd.args(&self.prefix_args);
        cmd
    }

    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix_args.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn background_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    // Keep console windows from flashing while the TUI runs tools.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}

pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        "''".to_string()
    } else if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "-_./:+@=?".contains(ch))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_only_when_needed() {
        let tool = ToolCommand::with_prefix_args("sh", vec!["/tmp/fake yt-dlp".to_string()]);
        let line = tool.command_line(&["-f".to_string(), "best[height<=720]".to_string()]);
        assert_eq!(line, "sh '/tmp/fake yt-dlp' -f 'best[height<=720]'");
    }

    #[test]
    fn name_strips_directories() {
        assert_eq!(ToolCommand::new("/usr/local/bin/yt-dlp").name(), "yt-dlp");
        assert_eq!(ToolCommand::new("ffmpeg").name(), "ffmpeg");
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
