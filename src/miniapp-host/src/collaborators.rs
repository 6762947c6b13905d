//! Interfaces to the components the controller drives but does not own.
//!
//! - [`MessagingService`]: issues session URLs and accepts data submissions
//! - [`RenderSurface`]: the web view that runs embedded content
//! - [`HostShell`]: the container presenting the session
//!
//! Surface and shell calls are made from the coordination queue and must not
//! block.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use miniapp_protocol::{MessageRef, PeerId, QueryId, Rgb, ThemePalette};

use crate::error::Result;
use crate::params::KeepAliveStream;
use crate::presentation::PlaceholderStyle;
use crate::viewport::ViewportState;

/// Request for a new web session.
#[derive(Debug, Clone, PartialEq)]
pub struct WebViewRequest {
    pub owner_peer: PeerId,
    pub bot_peer: PeerId,
    pub url: Option<String>,
    pub payload: Option<String>,
    pub theme_params: ThemePalette,
    pub launched_from_menu: bool,
    pub reply_to: Option<MessageRef>,
}

/// A session issued by the messaging service.
pub struct WebViewSession {
    pub url: String,
    pub query_id: QueryId,
    pub keep_alive: KeepAliveStream,
}

impl fmt::Debug for WebViewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebViewSession")
            .field("url", &self.url)
            .field("query_id", &self.query_id)
            .finish_non_exhaustive()
    }
}

/// Data submitted from content to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewData {
    pub bot_peer: PeerId,
    pub button_text: String,
    pub data: String,
}

/// Backend that issues sessions and delivers submissions.
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Request a session URL and query id.
    async fn request_web_view(&self, request: WebViewRequest) -> Result<WebViewSession>;

    /// Hand submitted data to the bot. Fire-and-forget.
    fn send_web_view_data(&self, data: WebViewData);

    /// Drop the bot from the attachment menu. Fire-and-forget.
    fn remove_bot_from_attach_menu(&self, bot: PeerId);
}

/// The rendering surface hosting embedded content.
pub trait RenderSurface: Send + Sync {
    fn load(&self, url: &Url);

    fn evaluate_script(&self, script: &str);

    fn update_viewport(&self, viewport: &ViewportState);

    fn reload(&self);

    fn set_content_visible(&self, visible: bool);

    /// Show a placeholder, or remove it with `None`.
    fn set_placeholder(&self, placeholder: Option<PlaceholderStyle>);

    fn set_background(&self, color: Rgb);
}

/// The host container presenting the session.
pub trait HostShell: Send + Sync {
    /// Close the container.
    fn dismiss(&self);

    /// The session finished normally.
    fn completion(&self);

    /// Expand the container to full height.
    fn request_expansion(&self);

    /// Open a URL with the host's own handler.
    fn open_url(&self, url: &str);

    /// Navigate to the chat with a peer.
    fn open_chat(&self, peer: PeerId);

    /// Set the navigation bar background alpha, in `[0, 1]`.
    fn update_navigation_alpha(&self, alpha: f64);
}

/// The three collaborators a controller drives.
#[derive(Clone)]
pub struct Collaborators {
    pub messaging: Arc<dyn MessagingService>,
    pub surface: Arc<dyn RenderSurface>,
    pub shell: Arc<dyn HostShell>,
}

impl Collaborators {
    pub fn new(
        messaging: Arc<dyn MessagingService>,
        surface: Arc<dyn RenderSurface>,
        shell: Arc<dyn HostShell>,
    ) -> Self {
        Self {
            messaging,
            surface,
            shell,
        }
    }
}
