//! Parameters a web-app session is launched with.

use std::fmt;

use futures::stream::BoxStream;

use miniapp_protocol::{MessageRef, PeerId, QueryId};

use crate::error::HostError;

/// External signal that a session is still valid.
///
/// Items are heartbeats and carry nothing. An error item invalidates the
/// session; the end of the stream completes it.
pub type KeepAliveStream = BoxStream<'static, Result<(), HostError>>;

/// Immutable launch parameters of one session.
pub struct SessionParameters {
    pub owner_peer: PeerId,
    pub bot_peer: PeerId,
    pub bot_display_name: String,
    pub url: Option<String>,
    pub query_id: Option<QueryId>,
    /// Label of the keyboard button that opened the session. Data submission
    /// is only possible when this is set.
    pub button_text: Option<String>,
    pub keep_alive: Option<KeepAliveStream>,
    pub launched_from_menu: bool,
    pub reply_to: Option<MessageRef>,
    /// The bot is installed in the owner's attachment menu.
    pub in_attach_menu: bool,
}

/// How a session obtains its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPath {
    /// The URL was issued before launch.
    PreIssued {
        url: String,
        query_id: Option<QueryId>,
    },
    /// A URL has to be requested from the messaging service.
    Request,
}

impl SessionParameters {
    pub fn new(owner_peer: PeerId, bot_peer: PeerId, bot_display_name: impl Into<String>) -> Self {
        Self {
            owner_peer,
            bot_peer,
            bot_display_name: bot_display_name.into(),
            url: None,
            query_id: None,
            button_text: None,
            keep_alive: None,
            launched_from_menu: false,
            reply_to: None,
            in_attach_menu: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_query_id(mut self, query_id: QueryId) -> Self {
        self.query_id = Some(query_id);
        self
    }

    pub fn with_button_text(mut self, text: impl Into<String>) -> Self {
        self.button_text = Some(text.into());
        self
    }

    pub fn with_keep_alive(mut self, stream: KeepAliveStream) -> Self {
        self.keep_alive = Some(stream);
        self
    }

    pub fn from_menu(mut self) -> Self {
        self.launched_from_menu = true;
        self
    }

    pub fn with_reply_to(mut self, reply_to: MessageRef) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    pub fn in_attach_menu(mut self) -> Self {
        self.in_attach_menu = true;
        self
    }

    /// Opening the bot's chat makes no sense from inside that chat.
    pub fn can_open_bot(&self) -> bool {
        self.owner_peer != self.bot_peer
    }

    pub fn can_remove_from_menu(&self) -> bool {
        self.in_attach_menu
    }

    /// A pre-issued URL is used unless the session was launched from a menu.
    pub fn launch_path(&self) -> LaunchPath {
        match &self.url {
            Some(url) if !self.launched_from_menu => LaunchPath::PreIssued {
                url: url.clone(),
                query_id: self.query_id,
            },
            _ => LaunchPath::Request,
        }
    }
}

impl fmt::Debug for SessionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParameters")
            .field("owner_peer", &self.owner_peer)
            .field("bot_peer", &self.bot_peer)
            .field("bot_display_name", &self.bot_display_name)
            .field("url", &self.url)
            .field("query_id", &self.query_id)
            .field("button_text", &self.button_text)
            .field("keep_alive", &self.keep_alive.is_some())
            .field("launched_from_menu", &self.launched_from_menu)
            .field("reply_to", &self.reply_to)
            .field("in_attach_menu", &self.in_attach_menu)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SessionParameters {
        SessionParameters::new(PeerId(1), PeerId(2), "Shop")
    }

    #[test]
    fn test_pre_issued_path() {
        let params = params()
            .with_url("https://shop.example/app")
            .with_query_id(QueryId(99));
        assert_eq!(
            params.launch_path(),
            LaunchPath::PreIssued {
                url: "https://shop.example/app".to_string(),
                query_id: Some(QueryId(99)),
            }
        );
    }

    #[test]
    fn test_menu_launch_always_requests() {
        let params = params().with_url("https://shop.example/app").from_menu();
        assert_eq!(params.launch_path(), LaunchPath::Request);
    }

    #[test]
    fn test_no_url_requests() {
        assert_eq!(params().launch_path(), LaunchPath::Request);
    }

    #[test]
    fn test_menu_action_availability() {
        let own_chat = SessionParameters::new(PeerId(2), PeerId(2), "Shop");
        assert!(!own_chat.can_open_bot());
        assert!(params().can_open_bot());

        assert!(!params().can_remove_from_menu());
        assert!(params().in_attach_menu().can_remove_from_menu());
    }

    #[test]
    fn test_debug_hides_stream() {
        let params = params().with_keep_alive(Box::pin(futures::stream::empty()));
        let debug = format!("{params:?}");
        assert!(debug.contains("keep_alive: true"));
    }
}
