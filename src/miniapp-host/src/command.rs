//! Commands posted to a controller's coordination queue.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use miniapp_protocol::HostTheme;

use crate::collaborators::WebViewSession;
use crate::lifecycle::KeepAliveOutcome;
use crate::navigation::{NavigationDecision, NavigationPolicy};
use crate::viewport::HostLayout;

/// Something the rendering surface observed.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A message posted by content through the bridge channel.
    ScriptMessage(Value),
    /// User-originated input (touch, pointer, key).
    UserInteraction,
    NavigationStarted,
    NavigationFinished,
    /// Estimated load progress in `[0, 1]`.
    Progress(f64),
    /// Content scrolled to a vertical offset.
    Scrolled(f64),
}

/// A unit of work for the coordination queue.
pub enum SessionCommand {
    Surface(SurfaceEvent),
    Layout(HostLayout),
    ThemeChanged(HostTheme),
    MainButtonPressed,
    Reload,
    /// Host-initiated close, such as a cancel button.
    Close,
    /// Close and open the bot's chat.
    OpenBot,
    /// Remove the bot from the attachment menu and close.
    RemoveFromMenu,
    /// Hand a URL to the host's handler.
    OpenUrl(String),
    SessionIssued(WebViewSession),
    SessionRequestFailed(String),
    KeepAlive(KeepAliveOutcome),
    RevealCheck,
}

impl SessionCommand {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Surface(_) => "surface",
            Self::Layout(_) => "layout",
            Self::ThemeChanged(_) => "theme_changed",
            Self::MainButtonPressed => "main_button_pressed",
            Self::Reload => "reload",
            Self::Close => "close",
            Self::OpenBot => "open_bot",
            Self::RemoveFromMenu => "remove_from_menu",
            Self::OpenUrl(_) => "open_url",
            Self::SessionIssued(_) => "session_issued",
            Self::SessionRequestFailed(_) => "session_request_failed",
            Self::KeepAlive(_) => "keep_alive",
            Self::RevealCheck => "reveal_check",
        }
    }
}

impl fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(event) => f.debug_tuple("Surface").field(event).finish(),
            Self::Layout(layout) => f.debug_tuple("Layout").field(layout).finish(),
            Self::SessionIssued(session) => f.debug_tuple("SessionIssued").field(session).finish(),
            Self::SessionRequestFailed(e) => f.debug_tuple("SessionRequestFailed").field(e).finish(),
            Self::KeepAlive(outcome) => f.debug_tuple("KeepAlive").field(outcome).finish(),
            Self::OpenUrl(url) => f.debug_tuple("OpenUrl").field(url).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Cloneable way for surfaces and hosts to reach a controller.
///
/// The handle does not own the controller. Posting after the controller is
/// gone is silently dropped.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: UnboundedSender<SessionCommand>,
    navigation: Arc<NavigationPolicy>,
}

impl ControllerHandle {
    pub(crate) fn new(tx: UnboundedSender<SessionCommand>, navigation: Arc<NavigationPolicy>) -> Self {
        Self { tx, navigation }
    }

    /// Post a command. Returns false if the controller is gone.
    pub fn post(&self, command: SessionCommand) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(err) => {
                debug!(command = err.0.kind(), "Controller gone, dropping command");
                false
            }
        }
    }

    /// Whether the controller has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn surface_event(&self, event: SurfaceEvent) -> bool {
        self.post(SessionCommand::Surface(event))
    }

    /// Deliver a raw bridge message posted by content.
    pub fn script_message(&self, body: Value) -> bool {
        self.surface_event(SurfaceEvent::ScriptMessage(body))
    }

    pub fn user_interaction(&self) -> bool {
        self.surface_event(SurfaceEvent::UserInteraction)
    }

    pub fn layout(&self, layout: HostLayout) -> bool {
        self.post(SessionCommand::Layout(layout))
    }

    pub fn theme_changed(&self, theme: HostTheme) -> bool {
        self.post(SessionCommand::ThemeChanged(theme))
    }

    pub fn main_button_pressed(&self) -> bool {
        self.post(SessionCommand::MainButtonPressed)
    }

    pub fn reload(&self) -> bool {
        self.post(SessionCommand::Reload)
    }

    pub fn close(&self) -> bool {
        self.post(SessionCommand::Close)
    }

    pub fn open_bot(&self) -> bool {
        self.post(SessionCommand::OpenBot)
    }

    pub fn remove_from_menu(&self) -> bool {
        self.post(SessionCommand::RemoveFromMenu)
    }

    /// Decide on an in-frame navigation.
    ///
    /// The verdict is returned synchronously so the surface can cancel before
    /// loading; intercepted URLs are queued for the host's URL handler.
    pub fn decide_navigation(&self, url: &str) -> NavigationDecision {
        self.forward_intercepted(self.navigation.decide(url))
    }

    /// Decide on a request to open a new window.
    pub fn decide_new_window(&self, url: &str) -> NavigationDecision {
        self.forward_intercepted(self.navigation.decide_new_window(url))
    }

    fn forward_intercepted(&self, decision: NavigationDecision) -> NavigationDecision {
        if let NavigationDecision::Intercept(url) = &decision {
            self.post(SessionCommand::OpenUrl(url.clone()));
        }
        decision
    }
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
