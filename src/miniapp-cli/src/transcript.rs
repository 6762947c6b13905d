//! Transcript format: one JSON object per line, tagged by `step`.
//!
//! ```text
//! {"step":"layout","layout":{"size":{"width":390.0,"height":600.0}}}
//! {"step":"bridge","message":{"eventName":"web_app_request_viewport"}}
//! {"step":"interaction"}
//! {"step":"bridge","message":{"eventName":"web_app_data_send","eventData":"{\"data\":\"ok\"}"}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use miniapp_host::HostLayout;
use miniapp_protocol::HostTheme;

/// Errors raised while reading a transcript.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stock theme name or a full theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeChoice {
    Preset(ThemePreset),
    Custom(HostTheme),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreset {
    Day,
    Night,
}

impl ThemeChoice {
    pub fn resolve(self) -> HostTheme {
        match self {
            ThemeChoice::Preset(ThemePreset::Day) => HostTheme::day(),
            ThemeChoice::Preset(ThemePreset::Night) => HostTheme::night(),
            ThemeChoice::Custom(theme) => theme,
        }
    }
}

/// One replayed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    /// A raw script message body, as content would post it.
    Bridge { message: Value },
    Interaction,
    Layout { layout: HostLayout },
    Theme { theme: ThemeChoice },
    NavigationStarted,
    NavigationFinished,
    Progress { value: f64 },
    Scroll { offset: f64 },
    /// A navigation action inside the surface.
    Navigate { url: String },
    /// A request to open a new window.
    OpenWindow { url: String },
    MainButtonPressed,
    Reload,
    /// Menu action: close and open the bot's chat.
    OpenBot,
    /// Menu action: remove the bot from the attachment menu.
    RemoveFromMenu,
    /// One keep-alive heartbeat.
    KeepAlive,
    /// The keep-alive stream fails.
    KeepAliveError { message: String },
    /// The keep-alive stream completes.
    KeepAliveEnd,
    /// Let timers run for the given number of milliseconds.
    Wait { ms: u64 },
    Close,
}

impl ReplayStep {
    pub fn name(&self) -> &'static str {
        match self {
            ReplayStep::Bridge { .. } => "bridge",
            ReplayStep::Interaction => "interaction",
            ReplayStep::Layout { .. } => "layout",
            ReplayStep::Theme { .. } => "theme",
            ReplayStep::NavigationStarted => "navigation_started",
            ReplayStep::NavigationFinished => "navigation_finished",
            ReplayStep::Progress { .. } => "progress",
            ReplayStep::Scroll { .. } => "scroll",
            ReplayStep::Navigate { .. } => "navigate",
            ReplayStep::OpenWindow { .. } => "open_window",
            ReplayStep::MainButtonPressed => "main_button_pressed",
            ReplayStep::Reload => "reload",
            ReplayStep::OpenBot => "open_bot",
            ReplayStep::RemoveFromMenu => "remove_from_menu",
            ReplayStep::KeepAlive => "keep_alive",
            ReplayStep::KeepAliveError { .. } => "keep_alive_error",
            ReplayStep::KeepAliveEnd => "keep_alive_end",
            ReplayStep::Wait { .. } => "wait",
            ReplayStep::Close => "close",
        }
    }
}

/// Parse a whole transcript held in memory.
pub fn parse_transcript(text: &str) -> Result<Vec<ReplayStep>, TranscriptError> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(index + 1, line).transpose())
        .collect()
}

/// Read a transcript from any buffered reader.
pub fn read_transcript(reader: impl BufRead) -> Result<Vec<ReplayStep>, TranscriptError> {
    let mut steps = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some(step) = parse_line(index + 1, &line?)? {
            steps.push(step);
        }
    }
    Ok(steps)
}

fn parse_line(line: usize, text: &str) -> Result<Option<ReplayStep>, TranscriptError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| TranscriptError::Parse {
            line,
            message: e.to_string(),
        })
}
