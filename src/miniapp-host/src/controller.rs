//! The web-app session controller.
//!
//! A [`WebAppController`] owns one session. Everything that can change session
//! state is a [`SessionCommand`] on a single queue, and the controller is that
//! queue's only consumer: the URL request, the keep-alive subscription, reveal
//! timers, the surface and the host all post into it through senders or a
//! [`ControllerHandle`].
//!
//! The controller must be created and driven inside a Tokio runtime; starting a
//! session and finishing a navigation spawn tasks.
//!
//! ```rust,ignore
//! let mut controller = WebAppController::new(params, theme, config, collaborators);
//! let handle = controller.handle();
//! let mut main_button = controller.main_button();
//!
//! tokio::spawn(controller.run());
//! handle.layout(layout);
//! ```

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use url::Url;

use miniapp_protocol::{
    decode, BridgeMessage, HostTheme, MainButtonState, OutboundEvent, QueryId, ThemePalette,
};

use crate::bridge::{BridgeEffect, BridgeStateMachine};
use crate::collaborators::{
    Collaborators, HostShell, MessagingService, RenderSurface, WebViewData, WebViewRequest,
    WebViewSession,
};
use crate::command::{ControllerHandle, SessionCommand, SurfaceEvent};
use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::lifecycle::{
    spawn_keep_alive, spawn_request, KeepAliveOutcome, SessionLifecycle, SessionPhase,
    TerminationReason,
};
use crate::navigation::NavigationPolicy;
use crate::params::{KeepAliveStream, LaunchPath, SessionParameters};
use crate::presentation::{spawn_reveal_check, PlaceholderStyle, PresentationAdapter};
use crate::viewport::ViewportState;

/// Controller of one embedded web-app session.
pub struct WebAppController {
    config: Arc<HostConfig>,
    params: SessionParameters,
    theme: HostTheme,
    lifecycle: SessionLifecycle,
    bridge: BridgeStateMachine,
    presentation: PresentationAdapter,
    messaging: Arc<dyn MessagingService>,
    surface: Arc<dyn RenderSurface>,
    shell: Arc<dyn HostShell>,
    navigation: Arc<NavigationPolicy>,
    tx: UnboundedSender<SessionCommand>,
    rx: UnboundedReceiver<SessionCommand>,
    main_button_tx: watch::Sender<MainButtonState>,
    progress_tx: watch::Sender<f64>,
    span: Span,
}

impl WebAppController {
    /// Create a controller and put the surface in its initial state: themed
    /// background, content hidden behind the placeholder.
    pub fn new(
        params: SessionParameters,
        theme: HostTheme,
        config: Arc<HostConfig>,
        collaborators: Collaborators,
    ) -> Self {
        let span = info_span!(
            "webapp",
            bot = %params.bot_peer,
            bot_name = %params.bot_display_name,
            query_id = tracing::field::Empty,
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let (main_button_tx, _) = watch::channel(MainButtonState::hidden(&theme));
        let (progress_tx, _) = watch::channel(0.0);

        let placeholder = PlaceholderStyle::for_bot(&config, params.bot_peer);
        let bridge = BridgeStateMachine::new(
            params.button_text.clone(),
            &theme,
            config.expansion_input_threshold,
        );
        let presentation = PresentationAdapter::new(placeholder, config.max_navigation_alpha_offset);
        let navigation = Arc::new(NavigationPolicy::from_config(&config));

        let Collaborators {
            messaging,
            surface,
            shell,
        } = collaborators;

        surface.set_background(PresentationAdapter::background_for(&theme));
        surface.set_content_visible(false);
        surface.set_placeholder(Some(placeholder));
        shell.update_navigation_alpha(0.0);

        Self {
            config,
            params,
            theme,
            lifecycle: SessionLifecycle::new(),
            bridge,
            presentation,
            messaging,
            surface,
            shell,
            navigation,
            tx,
            rx,
            main_button_tx,
            progress_tx,
            span,
        }
    }

    /// A handle for surfaces and hosts to post into this controller.
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle::new(self.tx.clone(), self.navigation.clone())
    }

    /// Published main-button state.
    pub fn main_button(&self) -> watch::Receiver<MainButtonState> {
        self.main_button_tx.subscribe()
    }

    /// Published load progress in `[0, 1]`.
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress_tx.subscribe()
    }

    /// Token cancelled when the session ends. Cancelling it disposes the
    /// controller while `run` is driving it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.lifecycle.token().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle.phase()
    }

    pub fn query_id(&self) -> Option<QueryId> {
        self.lifecycle.query_id()
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.lifecycle.termination()
    }

    pub fn is_dismissed(&self) -> bool {
        self.bridge.is_dismissed()
    }

    pub fn has_received_first_interaction(&self) -> bool {
        self.bridge.has_received_first_interaction()
    }

    pub fn theme(&self) -> &HostTheme {
        &self.theme
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        self.bridge.viewport()
    }

    /// Acquire the session: load a pre-issued URL or request a new one.
    pub fn start(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        match self.params.launch_path() {
            LaunchPath::PreIssued { url, query_id } => {
                self.lifecycle.mark_loaded(query_id)?;
                if let Some(query_id) = query_id {
                    self.span.record("query_id", query_id.0);
                }
                info!(?query_id, "Loading pre-issued session");
                if let Err(e) = self.load_url(&url) {
                    warn!(error = %e, "Surface left unloaded");
                }
                if let Some(stream) = self.params.keep_alive.take() {
                    self.subscribe_keep_alive(stream);
                }
            }
            LaunchPath::Request => {
                self.lifecycle.begin_request()?;
                let request = WebViewRequest {
                    owner_peer: self.params.owner_peer,
                    bot_peer: self.params.bot_peer,
                    url: self.params.url.clone(),
                    payload: None,
                    theme_params: ThemePalette::from_theme(&self.theme),
                    launched_from_menu: self.params.launched_from_menu,
                    reply_to: self.params.reply_to,
                };
                info!(from_menu = request.launched_from_menu, "Requesting session");
                spawn_request(
                    self.messaging.clone(),
                    request,
                    self.lifecycle.child_token(),
                    self.tx.clone(),
                );
            }
        }
        Ok(())
    }

    /// Start the session if needed and process commands until it ends.
    pub async fn run(mut self) -> Option<TerminationReason> {
        let span = self.span.clone();
        async move {
            if self.lifecycle.phase() == SessionPhase::Unstarted {
                if let Err(e) = self.start() {
                    warn!(error = %e, "Failed to start session");
                }
            }

            let token = self.lifecycle.token().clone();
            while !self.lifecycle.is_terminated() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    command = self.rx.recv() => match command {
                        Some(command) => self.dispatch(command),
                        None => break,
                    },
                }
            }

            self.dispose();
            self.lifecycle.termination()
        }
        .instrument(span)
        .await
    }

    /// Wait for the next command and process it.
    ///
    /// Returns false once no further commands can arrive.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(command) => {
                self.dispatch(command);
                true
            }
            None => false,
        }
    }

    /// Process every command already queued, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(command) = self.rx.try_recv() {
            self.dispatch(command);
            processed += 1;
        }
        processed
    }

    /// End the session without notifying the host, cancelling every task.
    ///
    /// Commands queued or posted afterwards are discarded.
    pub fn dispose(&mut self) {
        if self.lifecycle.terminate(TerminationReason::Disposed) {
            debug!(parent: &self.span, "Controller disposed");
        }
        self.rx.close();
    }

    /// Process one command.
    pub fn dispatch(&mut self, command: SessionCommand) {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.lifecycle.is_terminated() {
            debug!(command = command.kind(), "Discarding command after termination");
            return;
        }

        match command {
            SessionCommand::Surface(event) => self.handle_surface_event(event),
            SessionCommand::Layout(layout) => {
                let effects = self.bridge.on_layout(layout);
                self.apply(effects);
            }
            SessionCommand::ThemeChanged(theme) => self.apply_theme(theme),
            SessionCommand::MainButtonPressed => self.send_event(OutboundEvent::MainButtonPressed),
            SessionCommand::Reload => {
                debug!("Reloading surface");
                self.surface.reload();
            }
            SessionCommand::Close => self.terminate(TerminationReason::Closed),
            SessionCommand::OpenBot => {
                if !self.params.can_open_bot() {
                    debug!("Already in the bot's chat, ignoring open bot");
                    return;
                }
                self.terminate(TerminationReason::Closed);
                self.shell.open_chat(self.params.bot_peer);
            }
            SessionCommand::RemoveFromMenu => {
                if !self.params.can_remove_from_menu() {
                    debug!("Bot is not in the attachment menu, ignoring removal");
                    return;
                }
                info!("Removing bot from attachment menu");
                self.messaging.remove_bot_from_attach_menu(self.params.bot_peer);
                self.terminate(TerminationReason::Closed);
            }
            SessionCommand::OpenUrl(url) => {
                debug!(%url, "Handing URL to host");
                self.shell.open_url(&url);
            }
            SessionCommand::SessionIssued(session) => self.adopt_session(session),
            SessionCommand::SessionRequestFailed(message) => {
                warn!(error = %message, "Session request failed, session stalls");
            }
            SessionCommand::KeepAlive(outcome) => {
                match &outcome {
                    KeepAliveOutcome::Invalidated(message) => {
                        warn!(error = %message, "Keep-alive invalidated")
                    }
                    KeepAliveOutcome::Completed => info!("Keep-alive completed"),
                }
                self.terminate(outcome.termination_reason());
            }
            SessionCommand::RevealCheck => {
                if self.presentation.reveal_if_idle() {
                    debug!("Revealing content");
                    self.surface.set_content_visible(true);
                    self.surface.set_placeholder(None);
                }
            }
        }
    }

    fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::ScriptMessage(body) => {
                let event = match BridgeMessage::from_value(body).and_then(|m| decode(&m)) {
                    Ok(event) => event,
                    Err(e) => {
                        debug!(error = %e, "Dropping malformed bridge message");
                        return;
                    }
                };
                debug!(event = event.name(), "Bridge event");
                let effects = self.bridge.handle(event, &self.theme);
                self.apply(effects);
            }
            SurfaceEvent::UserInteraction => self.bridge.register_interaction(),
            SurfaceEvent::NavigationStarted => self.presentation.navigation_started(),
            SurfaceEvent::NavigationFinished => {
                self.presentation.navigation_finished();
                spawn_reveal_check(
                    self.config.reveal_delay(),
                    self.lifecycle.child_token(),
                    self.tx.clone(),
                );
                if let Some(viewport) = self.bridge.viewport() {
                    self.surface.update_viewport(&viewport);
                }
            }
            SurfaceEvent::Progress(progress) => {
                self.progress_tx.send_replace(progress.clamp(0.0, 1.0));
            }
            SurfaceEvent::Scrolled(offset) => {
                let alpha = self.presentation.navigation_alpha(offset);
                self.shell.update_navigation_alpha(alpha);
            }
        }
    }

    fn apply(&mut self, effects: Vec<BridgeEffect>) {
        for effect in effects {
            match effect {
                BridgeEffect::PublishMainButton(state) => {
                    self.main_button_tx.send_if_modified(|current| {
                        if *current == state {
                            return false;
                        }
                        *current = state;
                        true
                    });
                }
                BridgeEffect::PublishViewport(viewport) => self.surface.update_viewport(&viewport),
                BridgeEffect::RequestExpansion => self.shell.request_expansion(),
                BridgeEffect::Terminate(reason) => self.terminate(reason),
                BridgeEffect::SubmitData { button_text, data } => {
                    info!(button = %button_text, bytes = data.len(), "Submitting data to bot");
                    self.messaging.send_web_view_data(WebViewData {
                        bot_peer: self.params.bot_peer,
                        button_text,
                        data,
                    });
                }
            }
        }
    }

    fn apply_theme(&mut self, theme: HostTheme) {
        self.theme = theme;
        self.surface
            .set_background(PresentationAdapter::background_for(&theme));
        self.send_event(OutboundEvent::ThemeChanged(ThemePalette::from_theme(&theme)));
    }

    fn send_event(&self, event: OutboundEvent) {
        debug!(event = event.name(), "Sending event to content");
        self.surface
            .evaluate_script(&event.to_script(&self.config.script_receiver));
    }

    fn adopt_session(&mut self, session: WebViewSession) {
        if self.lifecycle.phase() != SessionPhase::Requesting {
            debug!(phase = %self.lifecycle.phase(), "Ignoring unexpected session");
            return;
        }
        if let Err(e) = self.load_url(&session.url) {
            warn!(error = %e, "Surface left unloaded, session not adopted");
            return;
        }
        if let Err(e) = self.lifecycle.mark_loaded(Some(session.query_id)) {
            warn!(error = %e, "Could not adopt session");
            return;
        }
        self.span.record("query_id", session.query_id.0);
        info!(query_id = %session.query_id, "Session loaded");
        self.subscribe_keep_alive(session.keep_alive);
    }

    fn load_url(&self, raw: &str) -> Result<()> {
        let url = Url::parse(raw).map_err(|e| HostError::invalid_url(raw, e.to_string()))?;
        self.surface.load(&url);
        Ok(())
    }

    fn subscribe_keep_alive(&self, stream: KeepAliveStream) {
        debug!("Subscribing to keep-alive");
        spawn_keep_alive(stream, self.lifecycle.child_token(), self.tx.clone());
    }

    fn terminate(&mut self, reason: TerminationReason) {
        if !self.lifecycle.terminate(reason) {
            return;
        }
        info!(%reason, "Session ended");
        if reason.runs_completion() {
            self.shell.completion();
        }
        if reason.dismisses() {
            self.shell.dismiss();
        }
        self.rx.close();
    }
}

impl Drop for WebAppController {
    fn drop(&mut self) {
        self.lifecycle.token().cancel();
    }
}

impl std::fmt::Debug for WebAppController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebAppController")
            .field("bot", &self.params.bot_peer)
            .field("bot_name", &self.params.bot_display_name)
            .field("phase", &self.lifecycle.phase())
            .field("query_id", &self.lifecycle.query_id())
            .finish_non_exhaustive()
    }
}
