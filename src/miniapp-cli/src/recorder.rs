//! Collaborators that record every call as an [`Effect`].

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use miniapp_host::{
    Collaborators, HostError, HostShell, KeepAliveStream, MessagingService, PlaceholderStyle,
    RenderSurface, ViewportState, WebViewData, WebViewRequest, WebViewSession,
};
use miniapp_protocol::{MainButtonState, PeerId, QueryId, Rgb};

/// Something the session did to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Load { url: String },
    Script { script: String },
    Viewport { viewport: ViewportState },
    Reload,
    ContentVisible { visible: bool },
    Placeholder { placeholder: Option<PlaceholderStyle> },
    Background { color: String },
    Dismiss,
    Completion,
    Expand,
    OpenUrl { url: String },
    OpenChat { peer: i64 },
    NavigationAlpha { alpha: f64 },
    SessionRequested { bot: i64, from_menu: bool },
    SubmitData { bot: i64, button_text: String, data: String },
    RemoveFromMenu { bot: i64 },
    MainButton { state: MainButtonState },
    Progress { value: f64 },
    Navigation { url: String, intercepted: bool },
}

/// Ordered record of effects, optionally echoed as JSON lines.
pub struct EffectLog {
    effects: Mutex<Vec<Effect>>,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

impl EffectLog {
    /// A log that only keeps effects in memory.
    pub fn buffered() -> Arc<Self> {
        Arc::new(Self {
            effects: Mutex::new(Vec::new()),
            writer: Mutex::new(None),
        })
    }

    /// A log that also writes each effect to `writer` as it happens.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            effects: Mutex::new(Vec::new()),
            writer: Mutex::new(Some(Box::new(writer))),
        })
    }

    pub fn record(&self, effect: Effect) {
        debug!(?effect, "Effect");
        if let Some(writer) = lock(&self.writer).as_mut() {
            let written = serde_json::to_writer(&mut *writer, &effect)
                .map_err(std::io::Error::from)
                .and_then(|()| writeln!(writer))
                .and_then(|()| writer.flush());
            if let Err(e) = written {
                warn!(error = %e, "Failed to write effect");
            }
        }
        lock(&self.effects).push(effect);
    }

    pub fn effects(&self) -> Vec<Effect> {
        lock(&self.effects).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.effects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Surface that records instead of rendering.
pub struct LoggingSurface {
    log: Arc<EffectLog>,
}

impl LoggingSurface {
    pub fn new(log: Arc<EffectLog>) -> Self {
        Self { log }
    }
}

impl RenderSurface for LoggingSurface {
    fn load(&self, url: &Url) {
        self.log.record(Effect::Load {
            url: url.to_string(),
        });
    }

    fn evaluate_script(&self, script: &str) {
        self.log.record(Effect::Script {
            script: script.to_string(),
        });
    }

    fn update_viewport(&self, viewport: &ViewportState) {
        self.log.record(Effect::Viewport {
            viewport: *viewport,
        });
    }

    fn reload(&self) {
        self.log.record(Effect::Reload);
    }

    fn set_content_visible(&self, visible: bool) {
        self.log.record(Effect::ContentVisible { visible });
    }

    fn set_placeholder(&self, placeholder: Option<PlaceholderStyle>) {
        self.log.record(Effect::Placeholder { placeholder });
    }

    fn set_background(&self, color: Rgb) {
        self.log.record(Effect::Background {
            color: color.to_string(),
        });
    }
}

/// Shell that records instead of presenting.
pub struct LoggingShell {
    log: Arc<EffectLog>,
}

impl LoggingShell {
    pub fn new(log: Arc<EffectLog>) -> Self {
        Self { log }
    }
}

impl HostShell for LoggingShell {
    fn dismiss(&self) {
        self.log.record(Effect::Dismiss);
    }

    fn completion(&self) {
        self.log.record(Effect::Completion);
    }

    fn request_expansion(&self) {
        self.log.record(Effect::Expand);
    }

    fn open_url(&self, url: &str) {
        self.log.record(Effect::OpenUrl {
            url: url.to_string(),
        });
    }

    fn open_chat(&self, peer: PeerId) {
        self.log.record(Effect::OpenChat { peer: peer.0 });
    }

    fn update_navigation_alpha(&self, alpha: f64) {
        self.log.record(Effect::NavigationAlpha { alpha });
    }
}

/// Messaging backend that issues one fixed session.
pub struct ReplayMessaging {
    log: Arc<EffectLog>,
    issued_url: String,
    issued_query_id: QueryId,
    keep_alive: Mutex<Option<KeepAliveStream>>,
}

impl ReplayMessaging {
    pub fn new(log: Arc<EffectLog>, issued_url: impl Into<String>, issued_query_id: QueryId) -> Self {
        Self {
            log,
            issued_url: issued_url.into(),
            issued_query_id,
            keep_alive: Mutex::new(None),
        }
    }

    /// Keep-alive stream handed out with the issued session.
    pub fn with_keep_alive(self, stream: KeepAliveStream) -> Self {
        *lock(&self.keep_alive) = Some(stream);
        self
    }
}

#[async_trait]
impl MessagingService for ReplayMessaging {
    async fn request_web_view(&self, request: WebViewRequest) -> miniapp_host::Result<WebViewSession> {
        self.log.record(Effect::SessionRequested {
            bot: request.bot_peer.0,
            from_menu: request.launched_from_menu,
        });
        let keep_alive = lock(&self.keep_alive)
            .take()
            .ok_or_else(|| HostError::session_request("session already issued"))?;
        Ok(WebViewSession {
            url: self.issued_url.clone(),
            query_id: self.issued_query_id,
            keep_alive,
        })
    }

    fn send_web_view_data(&self, data: WebViewData) {
        self.log.record(Effect::SubmitData {
            bot: data.bot_peer.0,
            button_text: data.button_text,
            data: data.data,
        });
    }

    fn remove_bot_from_attach_menu(&self, bot: PeerId) {
        self.log.record(Effect::RemoveFromMenu { bot: bot.0 });
    }
}

/// Wire the recording collaborators around one log.
pub fn recording_collaborators(log: &Arc<EffectLog>, messaging: ReplayMessaging) -> Collaborators {
    Collaborators::new(
        Arc::new(messaging),
        Arc::new(LoggingSurface::new(log.clone())),
        Arc::new(LoggingShell::new(log.clone())),
    )
}
