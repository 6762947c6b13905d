//! Drive a controller through a transcript.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use miniapp_host::{
    HostConfig, HostError, LaunchPath, NavigationDecision, SessionParameters, SessionPhase,
    SurfaceEvent, TerminationReason, WebAppController,
};
use miniapp_protocol::{HostTheme, MainButtonState, PeerId, QueryId};

use crate::recorder::{recording_collaborators, Effect, EffectLog, ReplayMessaging};
use crate::transcript::ReplayStep;

/// Upper bound on queue passes after one step.
const SETTLE_ROUNDS: usize = 16;

/// Session setup for a replay.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub owner: PeerId,
    pub bot: PeerId,
    pub bot_name: String,
    /// Pre-issued URL; without one the session is requested.
    pub url: Option<String>,
    pub query_id: Option<QueryId>,
    pub button_text: Option<String>,
    pub from_menu: bool,
    /// The bot is installed in the attachment menu.
    pub in_attach_menu: bool,
    pub theme: HostTheme,
    /// URL the backend issues on the request path.
    pub issued_url: String,
    pub issued_query_id: QueryId,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            owner: PeerId(1),
            bot: PeerId(2),
            bot_name: "Bot".to_string(),
            url: None,
            query_id: None,
            button_text: None,
            from_menu: false,
            in_attach_menu: false,
            theme: HostTheme::day(),
            issued_url: "https://webapp.invalid/".to_string(),
            issued_query_id: QueryId(1),
        }
    }
}

/// How a replay ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub phase: SessionPhase,
    /// Termination reached while steps were applied, if any.
    pub termination: Option<TerminationReason>,
    pub query_id: Option<i64>,
    pub steps_applied: usize,
    pub steps_skipped: usize,
}

/// Replay `steps` against recording collaborators, then dispose the session.
pub async fn replay(
    steps: &[ReplayStep],
    options: ReplayOptions,
    config: HostConfig,
    log: Arc<EffectLog>,
) -> miniapp_host::Result<ReplaySummary> {
    let (beat_tx, beat_rx) = mpsc::unbounded_channel::<Result<(), HostError>>();
    let keep_alive = Box::pin(UnboundedReceiverStream::new(beat_rx));
    let mut beat_tx = Some(beat_tx);

    let mut params = SessionParameters::new(options.owner, options.bot, options.bot_name.clone());
    if let Some(url) = &options.url {
        params = params.with_url(url.clone());
    }
    if let Some(query_id) = options.query_id {
        params = params.with_query_id(query_id);
    }
    if let Some(text) = &options.button_text {
        params = params.with_button_text(text.clone());
    }
    if options.from_menu {
        params = params.from_menu();
    }
    if options.in_attach_menu {
        params = params.in_attach_menu();
    }

    let messaging = ReplayMessaging::new(log.clone(), options.issued_url.clone(), options.issued_query_id);
    let messaging = match params.launch_path() {
        LaunchPath::PreIssued { .. } => {
            params = params.with_keep_alive(keep_alive);
            messaging
        }
        LaunchPath::Request => messaging.with_keep_alive(keep_alive),
    };

    let collaborators = recording_collaborators(&log, messaging);
    let mut controller =
        WebAppController::new(params, options.theme, Arc::new(config), collaborators);
    let handle = controller.handle();
    let mut published = Published::new(&controller);

    controller.start()?;
    settle(&mut controller).await;
    published.record(&log);

    let mut applied = 0;
    for step in steps {
        if controller.termination().is_some() {
            break;
        }
        debug!(step = step.name(), "Applying step");

        match step {
            ReplayStep::Bridge { message } => {
                handle.script_message(message.clone());
            }
            ReplayStep::Interaction => {
                handle.user_interaction();
            }
            ReplayStep::Layout { layout } => {
                handle.layout(*layout);
            }
            ReplayStep::Theme { theme } => {
                handle.theme_changed(theme.resolve());
            }
            ReplayStep::NavigationStarted => {
                handle.surface_event(SurfaceEvent::NavigationStarted);
            }
            ReplayStep::NavigationFinished => {
                handle.surface_event(SurfaceEvent::NavigationFinished);
            }
            ReplayStep::Progress { value } => {
                handle.surface_event(SurfaceEvent::Progress(*value));
            }
            ReplayStep::Scroll { offset } => {
                handle.surface_event(SurfaceEvent::Scrolled(*offset));
            }
            ReplayStep::Navigate { url } => {
                let decision = handle.decide_navigation(url);
                record_navigation(&log, url, &decision);
            }
            ReplayStep::OpenWindow { url } => {
                let decision = handle.decide_new_window(url);
                record_navigation(&log, url, &decision);
            }
            ReplayStep::MainButtonPressed => {
                handle.main_button_pressed();
            }
            ReplayStep::Reload => {
                handle.reload();
            }
            ReplayStep::OpenBot => {
                handle.open_bot();
            }
            ReplayStep::RemoveFromMenu => {
                handle.remove_from_menu();
            }
            ReplayStep::KeepAlive => send_beat(&beat_tx, Ok(())),
            ReplayStep::KeepAliveError { message } => send_beat(
                &beat_tx,
                Err(HostError::IoError(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    message.clone(),
                ))),
            ),
            ReplayStep::KeepAliveEnd => {
                beat_tx = None;
            }
            ReplayStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            ReplayStep::Close => {
                handle.close();
            }
        }
        applied += 1;

        settle(&mut controller).await;
        published.record(&log);
    }

    let skipped = steps.len() - applied;
    if skipped > 0 {
        warn!(skipped, "Session ended before the transcript did");
    }

    let summary = ReplaySummary {
        phase: controller.phase(),
        termination: controller.termination(),
        query_id: controller.query_id().map(|id| id.0),
        steps_applied: applied,
        steps_skipped: skipped,
    };
    controller.dispose();
    info!(phase = %summary.phase, termination = ?summary.termination, "Replay finished");
    Ok(summary)
}

/// Let spawned tasks run and process what they post, until the queue stays empty.
async fn settle(controller: &mut WebAppController) {
    let mut idle = 0;
    for _ in 0..SETTLE_ROUNDS {
        tokio::task::yield_now().await;
        if controller.drain() == 0 {
            idle += 1;
            if idle == 2 {
                break;
            }
        } else {
            idle = 0;
        }
    }
}

fn send_beat(tx: &Option<mpsc::UnboundedSender<Result<(), HostError>>>, item: Result<(), HostError>) {
    match tx {
        Some(tx) => {
            let _ = tx.send(item);
        }
        None => debug!("Keep-alive already ended"),
    }
}

fn record_navigation(log: &EffectLog, url: &str, decision: &NavigationDecision) {
    log.record(Effect::Navigation {
        url: url.to_string(),
        intercepted: matches!(decision, NavigationDecision::Intercept(_)),
    });
}

/// Watches on the controller's published values.
struct Published {
    main_button: tokio::sync::watch::Receiver<MainButtonState>,
    progress: tokio::sync::watch::Receiver<f64>,
}

impl Published {
    fn new(controller: &WebAppController) -> Self {
        Self {
            main_button: controller.main_button(),
            progress: controller.progress(),
        }
    }

    fn record(&mut self, log: &EffectLog) {
        if self.main_button.has_changed().unwrap_or(false) {
            let state = self.main_button.borrow_and_update().clone();
            log.record(Effect::MainButton { state });
        }
        if self.progress.has_changed().unwrap_or(false) {
            let value = *self.progress.borrow_and_update();
            log.record(Effect::Progress { value });
        }
    }
}
