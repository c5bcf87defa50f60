// Child process runner shared by every tool wrapper.
// - Reader threads push raw stdout/stderr chunks over a channel; the caller's thread splits lines.
// - The caller's cancel token is checked between reads so Stop kills the child promptly.
// - Every live child is tracked in a registry so a global Stop can terminate all of them.
use std::{
    collections::HashMap,
    io::{self, BufReader, Read},
    process::{Child, ExitStatus, Stdio},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::Duration,
};

use crate::{
    cancel::CancelToken,
    error::{AppError, Result},
    events::OutputStream,
};

use super::ToolCommand;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Default)]
pub struct ProcessRegistry {
    children: Arc<Mutex<HashMap<u64, Arc<Mutex<Child>>>>>,
    next_id: Arc<AtomicU64>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, child: Child) -> (u64, Arc<Mutex<Child>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(Mutex::new(child));
        self.lock_children().insert(id, Arc::clone(&shared));
        (id, shared)
    }

    pub fn unregister(&self, id: u64) {
        self.lock_children().remove(&id);
    }

    pub fn kill_all(&self) -> usize {
        let children = self.lock_children();
        let mut killed = 0;
        for child in children.values() {
            let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(child.try_wait(), Ok(None)) && child.kill().is_ok() {
                killed += 1;
            }
        }
        killed
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.lock_children().len()
    }

    fn lock_children(&self) -> MutexGuard<'_, HashMap<u64, Arc<Mutex<Child>>>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct CapturedRun {
    pub status: ExitStatus,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl CapturedRun {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn last_stderr_line(&self) -> Option<&str> {
        self.stderr_lines
            .iter()
            .map(|line| line.trim())
            .rfind(|line| !line.is_empty())
    }

    pub fn into_tool_error(self, tool: &str) -> AppError {
        let stderr = self
            .last_stderr_line()
            .unwrap_or("no error output")
            .to_string();
        AppError::ToolFailed {
            tool: tool.to_string(),
            code: self.status.code(),
            stderr,
        }
    }
}

enum ReaderEvent {
    Chunk { stream: OutputStream, data: Vec<u8> },
    ReaderError { stream: OutputStream, error: String },
}

#[derive(Default)]
struct PendingLines {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl PendingLines {
    fn buffer(&mut self, stream: OutputStream) -> &mut Vec<u8> {
        match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        }
    }
}

/// Runs a tool to completion, handing each output line to `on_line` as it arrives.
pub fn run_streaming(
    tool: &ToolCommand,
    args: &[String],
    registry: &ProcessRegistry,
    cancel: &CancelToken,
    on_line: &mut dyn FnMut(OutputStream, &str),
) -> Result<CapturedRun> {
    log::debug!("running {}", tool.command_line(args));
    let mut child = tool
        .command()
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| spawn_error(tool, err))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other(format!("failed to capture {} stdout", tool.name())))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other(format!("failed to capture {} stderr", tool.name())))?;

    let (tx, rx) = mpsc::channel();
    spawn_reader(stdout, OutputStream::Stdout, tx.clone());
    spawn_reader(stderr, OutputStream::Stderr, tx);

    let (id, child) = registry.register(child);
    let mut pending = PendingLines::default();
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut killed = false;

    let mut emit = |stream: OutputStream, line: String| {
        on_line(stream, &line);
        match stream {
            OutputStream::Stdout => stdout_lines.push(line),
            OutputStream::Stderr => stderr_lines.push(line),
        }
    };

    loop {
        if !killed && cancel.is_stopped() {
            kill_child(&child);
            killed = true;
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(ReaderEvent::Chunk { stream, data }) => {
                for line in consume_stream_chunk(pending.buffer(stream), &data) {
                    emit(stream, line);
                }
            }
            Ok(ReaderEvent::ReaderError { stream, error }) => {
                emit(stream, format!("reader error: {error}"));
            }
            // A killed child's own children can hold the pipes open; stop reading once it exits.
            Err(RecvTimeoutError::Timeout) if killed && child_exited(&child) => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for stream in [OutputStream::Stdout, OutputStream::Stderr] {
        if let Some(line) = flush_pending_line(pending.buffer(stream)) {
            emit(stream, line);
        }
    }

    let status = wait_for_exit(&child, cancel, &mut killed);
    registry.unregister(id);
    let status = status?;

    if killed || cancel.is_stopped() {
        return Err(AppError::Cancelled);
    }

    Ok(CapturedRun {
        status,
        stdout_lines,
        stderr_lines,
    })
}

/// Runs a short command and collects its output without streaming.
pub fn run_captured(tool: &ToolCommand, args: &[String]) -> Result<CapturedRun> {
    log::debug!("running {}", tool.command_line(args));
    let output = tool
        .command()
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| spawn_error(tool, err))?;

    Ok(CapturedRun {
        status: output.status,
        stdout_lines: split_lines(&output.stdout),
        stderr_lines: split_lines(&output.stderr),
    })
}

fn spawn_error(tool: &ToolCommand, err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        AppError::ToolMissing { tool: tool.name() }
    } else {
        AppError::Io(err)
    }
}

fn wait_for_exit(
    child: &Mutex<Child>,
    cancel: &CancelToken,
    killed: &mut bool,
) -> Result<ExitStatus> {
    loop {
        {
            let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if !*killed && cancel.is_stopped() {
                let _ = child.kill();
                *killed = true;
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn child_exited(child: &Mutex<Child>) -> bool {
    let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
    matches!(child.try_wait(), Ok(Some(_)))
}

fn kill_child(child: &Mutex<Child>) {
    let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(err) = child.kill() {
        log::warn!("failed to kill child process: {err}");
    }
}

fn spawn_reader<R>(reader: R, stream: OutputStream, tx: mpsc::Sender<ReaderEvent>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = [0_u8; 4096];

        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    if tx
                        .send(ReaderEvent::Chunk {
                            stream,
                            data: buf[..read].to_vec(),
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(ReaderEvent::ReaderError {
                        stream,
                        error: err.to_string(),
                    });
                    break;
                }
            }
        }
    });
}

// yt-dlp redraws progress with bare '\r', so both separators end a line.
fn consume_stream_chunk(pending: &mut Vec<u8>, data: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    for &byte in data {
        if byte == b'\n' || byte == b'\r' {
            if let Some(line) = flush_pending_line(pending) {
                lines.push(line);
            }
        } else {
            pending.push(byte);
        }
    }
    lines
}

fn flush_pending_line(pending: &mut Vec<u8>) -> Option<String> {
    if pending.is_empty() {
        return None;
    }

    let line = String::from_utf8_lossy(pending).to_string();
    pending.clear();

    if line.trim().is_empty() { None } else { Some(line) }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let mut pending = Vec::new();
    let mut lines = consume_stream_chunk(&mut pending, bytes);
    lines.extend(flush_pending_line(&mut pending));
    lines
}
