//! The ephemeral status line shown while the agent works.
//!
//! It lives outside the static log: a background thread redraws one stderr
//! row with the elapsed time and clears it when the handle is finished.

use crate::tui::settings;
use crossterm::style::Stylize;
use std::io::{self, IsTerminal, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

static PROGRESS_ENABLED: AtomicBool = AtomicBool::new(true);

/// RAII handle for an active status line.
pub struct StatusLine {
    /// Stop signal shared with the redraw thread.
    stop: Arc<AtomicBool>,
    /// Redraw thread, present only when the status line is live.
    thread: Option<thread::JoinHandle<()>>,
}

impl StatusLine {
    /// No-op handle used when progress output is disabled.
    pub(crate) fn disabled() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(true)),
            thread: None,
        }
    }

    /// Stop redrawing and clear the row.
    pub fn finish(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for StatusLine {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Globally enable/disable live progress rendering.
pub fn set_progress_enabled(enabled: bool) {
    PROGRESS_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Start the status line on stderr.
pub fn start_status_line(label: impl Into<String>, color: bool) -> StatusLine {
    if !PROGRESS_ENABLED.load(Ordering::Relaxed) || !io::stderr().is_terminal() {
        return StatusLine::disabled();
    }

    let label = label.into();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let thread = thread::spawn(move || {
        let start = Instant::now();
        let mut idx = 0usize;

        while !stop_flag.load(Ordering::Relaxed) {
            let line = status_text(
                settings::PROGRESS_FRAMES[idx % settings::PROGRESS_FRAMES.len()],
                &label,
                start.elapsed(),
                color,
            );
            let mut err = io::stderr();
            let _ = write!(err, "{}{line}", settings::PROGRESS_CLEAR_LINE);
            let _ = err.flush();
            idx += 1;
            thread::sleep(Duration::from_millis(settings::PROGRESS_TICK_MS));
        }

        clear_status_row();
    });

    StatusLine {
        stop,
        thread: Some(thread),
    }
}

/// One frame of the status line, e.g. `[|] Thinking (12s)`.
pub fn status_text(frame: char, label: &str, elapsed: Duration, color: bool) -> String {
    let secs = elapsed.as_secs();
    if color {
        format!(
            "{} {} {}",
            format!("[{frame}]").with(settings::COLOR_PROGRESS_FRAME),
            label.with(settings::COLOR_PROGRESS_LABEL),
            format!("({secs}s)").with(settings::COLOR_PROGRESS_ELAPSED),
        )
    } else {
        format!("[{frame}] {label} ({secs}s)")
    }
}

fn clear_status_row() {
    let mut err = io::stderr();
    let _ = write!(err, "{}", settings::PROGRESS_CLEAR_LINE);
    let _ = err.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_status_shows_whole_seconds() {
        let out = status_text('|', "Thinking", Duration::from_millis(12_900), false);
        assert_eq!(out, "[|] Thinking (12s)");
    }

    #[test]
    fn disabled_handle_finishes_cleanly() {
        let mut handle = StatusLine::disabled();
        handle.finish();
        handle.finish();
    }
}
