//! Recording collaborators shared by the controller tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use miniapp_host::{
    Collaborators, HostConfig, HostError, HostShell, KeepAliveStream, MessagingService,
    PlaceholderStyle, RenderSurface, SessionParameters, ViewportState, WebAppController,
    WebViewData, WebViewRequest, WebViewSession,
};
use miniapp_protocol::{HostTheme, PeerId, QueryId, Rgb};

// =============================================================================
// Surface
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load(String),
    Script(String),
    Viewport(ViewportState),
    Reload,
    ContentVisible(bool),
    Placeholder(Option<PlaceholderStyle>),
    Background(Rgb),
}

#[derive(Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Script(script) => Some(script),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Load(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RenderSurface for RecordingSurface {
    fn load(&self, url: &Url) {
        self.record(SurfaceCall::Load(url.to_string()));
    }

    fn evaluate_script(&self, script: &str) {
        self.record(SurfaceCall::Script(script.to_string()));
    }

    fn update_viewport(&self, viewport: &ViewportState) {
        self.record(SurfaceCall::Viewport(*viewport));
    }

    fn reload(&self) {
        self.record(SurfaceCall::Reload);
    }

    fn set_content_visible(&self, visible: bool) {
        self.record(SurfaceCall::ContentVisible(visible));
    }

    fn set_placeholder(&self, placeholder: Option<PlaceholderStyle>) {
        self.record(SurfaceCall::Placeholder(placeholder));
    }

    fn set_background(&self, color: Rgb) {
        self.record(SurfaceCall::Background(color));
    }
}

// =============================================================================
// Shell
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCall {
    Dismiss,
    Completion,
    Expand,
    OpenUrl(String),
    OpenChat(PeerId),
    NavigationAlpha(f64),
}

#[derive(Default)]
pub struct RecordingShell {
    calls: Mutex<Vec<ShellCall>>,
}

impl RecordingShell {
    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &ShellCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Lifecycle hooks only, in order.
    pub fn hooks(&self) -> Vec<ShellCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ShellCall::Dismiss | ShellCall::Completion))
            .collect()
    }

    fn record(&self, call: ShellCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HostShell for RecordingShell {
    fn dismiss(&self) {
        self.record(ShellCall::Dismiss);
    }

    fn completion(&self) {
        self.record(ShellCall::Completion);
    }

    fn request_expansion(&self) {
        self.record(ShellCall::Expand);
    }

    fn open_url(&self, url: &str) {
        self.record(ShellCall::OpenUrl(url.to_string()));
    }

    fn open_chat(&self, peer: PeerId) {
        self.record(ShellCall::OpenChat(peer));
    }

    fn update_navigation_alpha(&self, alpha: f64) {
        self.record(ShellCall::NavigationAlpha(alpha));
    }
}

// =============================================================================
// Messaging
// =============================================================================

/// What the messaging service answers to a session request.
pub enum Reply {
    Session(WebViewSession),
    Fail(String),
    /// Answer with the session once `release` is notified.
    Gated(WebViewSession, Arc<Notify>),
    Never,
}

pub struct ScriptedMessaging {
    reply: Mutex<Option<Reply>>,
    requests: Mutex<Vec<WebViewRequest>>,
    submissions: Mutex<Vec<WebViewData>>,
    removals: Mutex<Vec<PeerId>>,
}

impl ScriptedMessaging {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            requests: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            removals: Mutex::new(Vec::new()),
        }
    }

    pub fn never() -> Self {
        Self::new(Reply::Never)
    }

    pub fn requests(&self) -> Vec<WebViewRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<WebViewData> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<PeerId> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingService for ScriptedMessaging {
    async fn request_web_view(&self, request: WebViewRequest) -> miniapp_host::Result<WebViewSession> {
        self.requests.lock().unwrap().push(request);
        let reply = self.reply.lock().unwrap().take();
        match reply {
            Some(Reply::Session(session)) => Ok(session),
            Some(Reply::Fail(message)) => Err(HostError::session_request(message)),
            Some(Reply::Gated(session, release)) => {
                release.notified().await;
                Ok(session)
            }
            Some(Reply::Never) | None => futures::future::pending().await,
        }
    }

    fn send_web_view_data(&self, data: WebViewData) {
        self.submissions.lock().unwrap().push(data);
    }

    fn remove_bot_from_attach_menu(&self, bot: PeerId) {
        self.removals.lock().unwrap().push(bot);
    }
}

// =============================================================================
// Keep-alive
// =============================================================================

/// A keep-alive stream driven by the test. Dropping the sender completes it.
pub fn keep_alive() -> (mpsc::UnboundedSender<Result<(), HostError>>, KeepAliveStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Box::pin(UnboundedReceiverStream::new(rx)))
}

pub fn issued_session(url: &str, query_id: i64, keep_alive: KeepAliveStream) -> WebViewSession {
    WebViewSession {
        url: url.to_string(),
        query_id: QueryId(query_id),
        keep_alive,
    }
}

// =============================================================================
// Harness
// =============================================================================

pub const OWNER: PeerId = PeerId(100);
pub const BOT: PeerId = PeerId(200);
pub const APP_URL: &str = "https://shop.example/app";

pub struct Harness {
    pub controller: WebAppController,
    pub surface: Arc<RecordingSurface>,
    pub shell: Arc<RecordingShell>,
    pub messaging: Arc<ScriptedMessaging>,
}

impl Harness {
    pub fn new(params: SessionParameters, messaging: ScriptedMessaging) -> Self {
        Self::with_config(params, messaging, HostConfig::default())
    }

    pub fn with_config(
        params: SessionParameters,
        messaging: ScriptedMessaging,
        config: HostConfig,
    ) -> Self {
        let surface = Arc::new(RecordingSurface::default());
        let shell = Arc::new(RecordingShell::default());
        let messaging = Arc::new(messaging);
        let collaborators = Collaborators::new(messaging.clone(), surface.clone(), shell.clone());
        let controller =
            WebAppController::new(params, HostTheme::day(), Arc::new(config), collaborators);
        Self {
            controller,
            surface,
            shell,
            messaging,
        }
    }

    /// A started session on the pre-issued path.
    pub fn pre_issued(button_text: Option<&str>) -> Self {
        let mut params = SessionParameters::new(OWNER, BOT, "Shop")
            .with_url(APP_URL)
            .with_query_id(QueryId(7));
        if let Some(text) = button_text {
            params = params.with_button_text(text);
        }
        let mut harness = Self::new(params, ScriptedMessaging::never());
        harness.controller.start().unwrap();
        harness
    }
}

pub fn bridge_message(name: &str, data: Option<&str>) -> serde_json::Value {
    match data {
        Some(data) => serde_json::json!({ "eventName": name, "eventData": data }),
        None => serde_json::json!({ "eventName": name }),
    }
}
