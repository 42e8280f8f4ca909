//! Terminal rendering for the command-line front end.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::blade::{Progress, SliceState};
use crate::spinner::Spinner;

/// ANSI escapes.
pub mod color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[91m";
    pub const GREEN: &str = "\x1b[92m";
    pub const YELLOW: &str = "\x1b[93m";
    pub const BLUE: &str = "\x1b[94m";
    pub const MAGENTA: &str = "\x1b[95m";
    pub const CYAN: &str = "\x1b[96m";
    pub const WHITE: &str = "\x1b[97m";
    pub const NEON: &str = "\x1b[38;5;199m";
    pub const BLADE: &str = "\x1b[38;5;51m";
    pub const GLOW: &str = "\x1b[38;5;226m";
}

use color::*;

/// Colored marker for each state in the progress log.
pub fn state_icon(state: SliceState) -> String {
    let (c, icon) = match state {
        SliceState::Initializing => (CYAN, ">>"),
        SliceState::Uploading => (YELLOW, "^"),
        SliceState::Queued => (MAGENTA, "#"),
        SliceState::Slicing => (NEON, "X"),
        SliceState::Downloading => (BLUE, "V"),
        SliceState::Complete => (GREEN, "OK"),
        SliceState::Failed => (RED, "ERR"),
    };
    format!("{c}{icon}")
}

/// One line in the blade gutter.
pub fn blade_line(msg: &str) -> String {
    format!("  {DIM}|{RESET} {msg}{RESET}")
}

pub fn blade_print(msg: &str) {
    println!("{}", blade_line(msg));
}

/// Prints a gutter line whenever the state changes and keeps a spinner going
/// while the slice is still in flight. Repeated polls in the same state only
/// relabel the spinner.
pub struct CliProgress {
    spinner: Mutex<Option<(SliceState, Spinner)>>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    /// Stop any running spinner (e.g. after Ctrl+C).
    pub async fn finish(&self) {
        if let Some((_, spinner)) = self.spinner.lock().await.take() {
            spinner.stop().await;
        }
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Progress for CliProgress {
    async fn update(&self, state: SliceState, message: &str) {
        let mut spinner = self.spinner.lock().await;
        if let Some((current, running)) = spinner.as_ref()
            && *current == state
        {
            running.set_label(message);
            return;
        }
        if let Some((_, running)) = spinner.take() {
            running.stop().await;
        }

        blade_print(&format!("{} {message}", state_icon(state)));

        if state.is_active() {
            *spinner = Some((state, Spinner::start(message)));
        }
    }
}
