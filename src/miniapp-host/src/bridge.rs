//! Bridge event state machine.
//!
//! Pure state: decoded events and layout changes go in, [`BridgeEffect`]s
//! come out. The controller applies the effects to the surface, the shell and
//! the messaging service.

use tracing::debug;

use miniapp_protocol::{parse_data_payload, HostTheme, InboundEvent, MainButtonState};

use crate::lifecycle::TerminationReason;
use crate::viewport::{HostLayout, ViewportState};

/// A side effect requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEffect {
    /// Publish a new main-button state to observers.
    PublishMainButton(MainButtonState),
    /// Recompute the viewport from the last layout and push it to the surface.
    PublishViewport(ViewportState),
    /// Ask the host to expand its container.
    RequestExpansion,
    /// End the session.
    Terminate(TerminationReason),
    /// Hand submitted data to the bot.
    SubmitData { button_text: String, data: String },
}

/// Session state driven by bridge events.
#[derive(Debug, Clone)]
pub struct BridgeStateMachine {
    button_text: Option<String>,
    has_received_first_interaction: bool,
    is_dismissed: bool,
    main_button: MainButtonState,
    expansion_threshold: f64,
    last_layout: Option<HostLayout>,
}

impl BridgeStateMachine {
    pub fn new(button_text: Option<String>, theme: &HostTheme, expansion_threshold: f64) -> Self {
        Self {
            button_text,
            has_received_first_interaction: false,
            is_dismissed: false,
            main_button: MainButtonState::hidden(theme),
            expansion_threshold,
            last_layout: None,
        }
    }

    pub fn has_received_first_interaction(&self) -> bool {
        self.has_received_first_interaction
    }

    pub fn is_dismissed(&self) -> bool {
        self.is_dismissed
    }

    pub fn main_button(&self) -> &MainButtonState {
        &self.main_button
    }

    pub fn last_layout(&self) -> Option<&HostLayout> {
        self.last_layout.as_ref()
    }

    /// Viewport for the last known layout.
    pub fn viewport(&self) -> Option<ViewportState> {
        self.last_layout.as_ref().map(ViewportState::compute)
    }

    /// Latch the first user interaction.
    pub fn register_interaction(&mut self) {
        if !self.has_received_first_interaction {
            debug!("First user interaction");
            self.has_received_first_interaction = true;
        }
    }

    /// Handle one decoded event.
    pub fn handle(&mut self, event: InboundEvent, theme: &HostTheme) -> Vec<BridgeEffect> {
        match event {
            InboundEvent::DataSend(raw) => self.handle_data_send(&raw),
            InboundEvent::SetupMainButton(setup) => {
                if !self.has_received_first_interaction {
                    debug!("Ignoring main button setup before first interaction");
                    return Vec::new();
                }
                let state = MainButtonState::resolve(&setup, theme);
                self.main_button = state.clone();
                vec![BridgeEffect::PublishMainButton(state)]
            }
            InboundEvent::RequestViewport => self
                .viewport()
                .map(BridgeEffect::PublishViewport)
                .into_iter()
                .collect(),
            InboundEvent::Expand => vec![BridgeEffect::RequestExpansion],
            InboundEvent::Close => vec![BridgeEffect::Terminate(TerminationReason::Closed)],
            InboundEvent::Unrecognized(name) => {
                debug!(event = %name, "Ignoring unrecognized bridge event");
                Vec::new()
            }
        }
    }

    /// Record a new host layout.
    ///
    /// Always republishes the viewport, and requests expansion once when the
    /// keyboard opens from a closed state.
    pub fn on_layout(&mut self, layout: HostLayout) -> Vec<BridgeEffect> {
        let previous = self.last_layout.replace(layout);
        let mut effects = vec![BridgeEffect::PublishViewport(ViewportState::compute(&layout))];

        let threshold = self.expansion_threshold;
        if previous.is_some_and(|previous| layout.opens_keyboard_from(&previous, threshold)) {
            debug!(input_height = ?layout.input_height, "Keyboard opened, requesting expansion");
            effects.push(BridgeEffect::RequestExpansion);
        }
        effects
    }

    fn handle_data_send(&mut self, raw: &str) -> Vec<BridgeEffect> {
        let Some(button_text) = self.button_text.clone() else {
            debug!("Ignoring data send without a button");
            return Vec::new();
        };
        if self.is_dismissed {
            debug!("Ignoring data send after dismissal");
            return Vec::new();
        }

        match parse_data_payload(raw) {
            Ok(data) => {
                self.is_dismissed = true;
                vec![
                    BridgeEffect::Terminate(TerminationReason::DataSubmitted),
                    BridgeEffect::SubmitData { button_text, data },
                ]
            }
            Err(e) => {
                debug!(error = %e, "Dropping malformed data send");
                Vec::new()
            }
        }
    }
}
