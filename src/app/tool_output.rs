// Scrollable log of yt-dlp/ffmpeg output for the download tab.
// - Consecutive progress lines overwrite each other instead of flooding the log.
// - Scrolling follows the tail until the user scrolls up.
use std::cell::Cell;

use crate::events::OutputStream;

#[derive(Debug, Clone)]
pub(crate) struct OutputLog {
    lines: Vec<String>,
    last_is_progress: bool,
    scroll: Cell<usize>,
    max_scroll: Cell<usize>,
    follow_tail: bool,
}

impl OutputLog {
    const PAGE_STEP: usize = 12;
    const MAX_LINES: usize = 20_000;

    pub(crate) fn new() -> Self {
        Self {
            lines: Vec::new(),
            last_is_progress: false,
            scroll: Cell::new(0),
            max_scroll: Cell::new(0),
            follow_tail: true,
        }
    }

    /// Starts a fresh log for a new job.
    pub(crate) fn reset(&mut self, heading: String) {
        self.lines = vec![heading];
        self.last_is_progress = false;
        self.scroll.set(0);
        self.follow_tail = true;
    }

    pub(crate) fn push(&mut self, line: String) {
        self.lines.push(line);
        self.last_is_progress = false;
        self.after_push();
    }

    pub(crate) fn push_stream(&mut self, stream: OutputStream, line: &str) {
        self.push(format!("{}: {line}", stream.prefix()));
    }

    pub(crate) fn push_progress(&mut self, line: &str) {
        if self.last_is_progress
            && let Some(last) = self.lines.last_mut()
        {
            *last = line.to_string();
        } else {
            self.lines.push(line.to_string());
            self.after_push();
        }
        self.last_is_progress = true;
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    #[cfg(test)]
    pub(crate) fn scroll(&self) -> usize {
        self.scroll.get()
    }

    pub(crate) fn scroll_down(&mut self, step: usize) {
        let max = self.max_scroll.get();
        let next = (self.scroll.get() + step).min(max);
        self.scroll.set(next);
        self.follow_tail = next >= max;
    }

    pub(crate) fn scroll_up(&mut self, step: usize) {
        self.scroll.set(self.scroll.get().saturating_sub(step));
        self.follow_tail = false;
    }

    pub(crate) fn page_down(&mut self) {
        self.scroll_down(Self::PAGE_STEP);
    }

    pub(crate) fn page_up(&mut self) {
        self.scroll_up(Self::PAGE_STEP);
    }

    /// Called during render once the viewport height is known.
    pub(crate) fn scroll_for_viewport(&self, visible_lines: usize) -> usize {
        let max = self.lines.len().saturating_sub(visible_lines.max(1));
        self.max_scroll.set(max);
        let scroll = if self.follow_tail {
            max
        } else {
            self.scroll.get().min(max)
        };
        self.scroll.set(scroll);
        scroll
    }

    fn after_push(&mut self) {
        if self.lines.len() > Self::MAX_LINES {
            let overflow = self.lines.len() - Self::MAX_LINES;
            self.lines.drain(0..overflow);
            self.scroll.set(self.scroll.get().saturating_sub(overflow));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines_collapse_until_other_output() {
        let mut log = OutputLog::new();
        log.reset("$ yt-dlp url".to_string());
        log.push_progress("[download]  10.0%");
        log.push_progress("[download]  55.0%");
        log.push_stream(OutputStream::Stderr, "WARNING: slow");
        log.push_progress("[download] 100.0%");

        assert_eq!(
            log.lines(),
            [
                "$ yt-dlp url",
                "[download]  55.0%",
                "stderr: WARNING: slow",
                "[download] 100.0%",
            ]
        );
    }

    #[test]
    fn follows_tail_until_scrolled_up() {
        let mut log = OutputLog::new();
        for index in 0..30 {
            log.push(format!("line {index}"));
        }
        assert_eq!(log.scroll_for_viewport(10), 20);

        log.scroll_up(5);
        log.push("line 30".to_string());
        assert_eq!(log.scroll_for_viewport(10), 15);

        log.page_down();
        assert_eq!(log.scroll_for_viewport(10), 21);
    }
}
