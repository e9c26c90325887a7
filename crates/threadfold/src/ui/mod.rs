//! Presentation-neutral state for whatever renders the engine's controls.
//!
//! The toolbar itself lives outside this crate. What the crate provides is
//! the data a toolbar shows: the last [`Status`] line, collapse/search
//! counters, and captured log lines.
//!
//! ```text
//! EngineSession ──events──▶ PanelEventHandler ──writes──▶ Arc<Mutex<PanelState>> ◀──reads── frontend
//! tracing ──────────────────▶ PanelTracingLayer ──▶ LogBuffer ──flush_into──┘
//! ```

pub mod event_handler;
pub mod tracing;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Maximum log lines kept in memory.
pub const MAX_LOG_LINES: usize = 500;
/// Trim to this many when the cap is exceeded.
pub const LOG_TRIM_TO: usize = 300;

// ── Status ────────────────────────────────────────────────────────────

/// How a status message should be presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Info,
    Success,
    Warning,
}

/// Outcome message of the last operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
    pub tone: Tone,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tone: Tone::Warning,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::info("Ready.")
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// ── Log Types ─────────────────────────────────────────────────────────

/// A single log line captured from tracing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

/// Log severity level (mirrors tracing levels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short fixed-width label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

// ── PanelState ────────────────────────────────────────────────────────

/// Everything a toolbar needs to render.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PanelState {
    pub status: Status,
    pub conversation: Option<String>,
    pub collapsed: bool,
    /// Entries currently held detached.
    pub detached: usize,
    /// `(current, total)` of the focused search match, 1-based.
    pub match_position: Option<(usize, usize)>,
    /// Times the controls had to be remounted after host re-renders.
    pub remounts: u32,
    pub logs: Vec<LogLine>,
}

impl PanelState {
    /// Label like `2/5` for the search counter, empty without matches.
    pub fn match_label(&self) -> String {
        match self.match_position {
            Some((current, total)) => format!("{current}/{total}"),
            None => String::new(),
        }
    }
}

// ── Convenience Updaters ──────────────────────────────────────────────

/// Lock the shared state mutex and run a closure on the guard.
/// Poisoned locks are skipped.
macro_rules! with_panel {
    ($state:expr, |$s:ident| $body:block) => {
        if let Ok(mut $s) = $state.lock() {
            $body
        }
    };
}

pub fn update_status(state: &Arc<Mutex<PanelState>>, status: Status) {
    with_panel!(state, |s| { s.status = status });
}

pub fn update_window(state: &Arc<Mutex<PanelState>>, collapsed: bool, detached: usize) {
    with_panel!(state, |s| {
        s.collapsed = collapsed;
        s.detached = detached;
    });
}

pub fn update_match(state: &Arc<Mutex<PanelState>>, position: Option<(usize, usize)>) {
    with_panel!(state, |s| { s.match_position = position });
}

pub fn update_conversation(state: &Arc<Mutex<PanelState>>, key: &str) {
    with_panel!(state, |s| {
        s.conversation = Some(key.to_string());
        s.collapsed = false;
        s.detached = 0;
        s.match_position = None;
    });
}

pub fn record_remount(state: &Arc<Mutex<PanelState>>) {
    with_panel!(state, |s| { s.remounts += 1 });
}
