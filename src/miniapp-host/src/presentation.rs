//! Presentation state: background, placeholder, reveal and navigation bar alpha.
//!
//! Content starts hidden behind a placeholder. Every provisional navigation
//! bumps a load counter and every finished one drops it; a reveal check runs
//! a short delay after each finish, and the first check that sees no loads in
//! flight reveals the content for good.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use miniapp_protocol::{HostTheme, PeerId, Rgb};

use crate::command::SessionCommand;
use crate::config::HostConfig;

/// Placeholder shown until content first paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// Shimmering grid of item shapes.
    Grid,
    /// The bot's icon, centered.
    Icon,
}

impl PlaceholderStyle {
    /// Style for a bot under the given configuration.
    pub fn for_bot(config: &HostConfig, bot: PeerId) -> Self {
        if config.uses_grid_placeholder(bot) {
            Self::Grid
        } else {
            Self::Icon
        }
    }
}

/// Tracks what the surface should currently show.
#[derive(Debug, Clone)]
pub struct PresentationAdapter {
    placeholder: Option<PlaceholderStyle>,
    load_count: usize,
    revealed: bool,
    max_alpha_offset: f64,
}

impl PresentationAdapter {
    pub fn new(placeholder: PlaceholderStyle, max_alpha_offset: f64) -> Self {
        Self {
            placeholder: Some(placeholder),
            load_count: 0,
            revealed: false,
            max_alpha_offset,
        }
    }

    /// Background behind content for a theme.
    pub fn background_for(theme: &HostTheme) -> Rgb {
        theme.content_background()
    }

    pub fn placeholder(&self) -> Option<PlaceholderStyle> {
        self.placeholder
    }

    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn navigation_started(&mut self) {
        self.load_count += 1;
    }

    pub fn navigation_finished(&mut self) {
        self.load_count = self.load_count.saturating_sub(1);
    }

    /// Reveal content if no navigation is in flight.
    ///
    /// Returns true only on the check that performs the reveal.
    pub fn reveal_if_idle(&mut self) -> bool {
        if self.revealed || self.load_count > 0 {
            return false;
        }
        self.revealed = true;
        self.placeholder = None;
        true
    }

    /// Navigation bar background alpha for a content scroll offset.
    pub fn navigation_alpha(&self, offset: f64) -> f64 {
        if self.max_alpha_offset <= 0.0 {
            return 1.0;
        }
        (offset.min(self.max_alpha_offset) / self.max_alpha_offset).clamp(0.0, 1.0)
    }
}

/// Post a reveal check to the queue after `delay`, unless cancelled first.
pub fn spawn_reveal_check(
    delay: Duration,
    token: CancellationToken,
    tx: UnboundedSender<SessionCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                trace!("Reveal check cancelled");
            }
            _ = tokio::time::sleep(delay) => {
                let _ = tx.send(SessionCommand::RevealCheck);
            }
        }
    })
}
