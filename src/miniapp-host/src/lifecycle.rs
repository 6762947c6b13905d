//! Session lifecycle: `Unstarted → [Requesting →] Loaded → Terminated`.
//!
//! The lifecycle owns the session's cancellation token. Every task spawned for
//! the session (the URL request, the keep-alive subscription, reveal timers)
//! runs under a child of that token, so terminating or disposing the session
//! cancels all of them at once and nothing they would have posted arrives.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use miniapp_protocol::QueryId;

use crate::collaborators::{MessagingService, WebViewRequest};
use crate::command::SessionCommand;
use crate::error::{HostError, Result};
use crate::params::KeepAliveStream;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unstarted,
    Requesting,
    Loaded,
    Terminated,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Unstarted => write!(f, "unstarted"),
            SessionPhase::Requesting => write!(f, "requesting"),
            SessionPhase::Loaded => write!(f, "loaded"),
            SessionPhase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Closed by content or by the host.
    Closed,
    /// The keep-alive stream failed.
    KeepAliveInvalidated,
    /// The keep-alive stream ended.
    KeepAliveCompleted,
    /// Content submitted data.
    DataSubmitted,
    /// The controller was disposed.
    Disposed,
}

impl TerminationReason {
    /// Whether the host should be dismissed.
    pub fn dismisses(self) -> bool {
        !matches!(self, Self::Disposed)
    }

    /// Whether the completion hook runs before dismissal.
    pub fn runs_completion(self) -> bool {
        matches!(self, Self::KeepAliveCompleted)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::KeepAliveInvalidated => write!(f, "keep_alive_invalidated"),
            Self::KeepAliveCompleted => write!(f, "keep_alive_completed"),
            Self::DataSubmitted => write!(f, "data_submitted"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// How a keep-alive subscription ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepAliveOutcome {
    /// The stream yielded an error.
    Invalidated(String),
    /// The stream ended.
    Completed,
}

impl KeepAliveOutcome {
    pub fn termination_reason(&self) -> TerminationReason {
        match self {
            Self::Invalidated(_) => TerminationReason::KeepAliveInvalidated,
            Self::Completed => TerminationReason::KeepAliveCompleted,
        }
    }
}

/// Phase, query id and cancellation scope of one session.
#[derive(Debug)]
pub struct SessionLifecycle {
    phase: SessionPhase,
    query_id: Option<QueryId>,
    termination: Option<TerminationReason>,
    token: CancellationToken,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unstarted,
            query_id: None,
            termination: None,
            token: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn query_id(&self) -> Option<QueryId> {
        self.query_id
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == SessionPhase::Terminated
    }

    /// Token cancelled when the session ends.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// A child token for a task tied to this session.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// `Unstarted → Requesting`. At most one request per session.
    pub fn begin_request(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::Unstarted)?;
        self.phase = SessionPhase::Requesting;
        Ok(())
    }

    /// `Unstarted | Requesting → Loaded`.
    pub fn mark_loaded(&mut self, query_id: Option<QueryId>) -> Result<()> {
        match self.phase {
            SessionPhase::Unstarted | SessionPhase::Requesting => {
                self.phase = SessionPhase::Loaded;
                self.query_id = query_id;
                Ok(())
            }
            other => Err(HostError::invalid_state("unstarted or requesting", other.to_string())),
        }
    }

    /// Move to `Terminated` and cancel every session task.
    ///
    /// Returns false if the session had already ended.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        if self.is_terminated() {
            trace!(%reason, "Session already terminated");
            return false;
        }
        debug!(from = %self.phase, %reason, "Session terminated");
        self.phase = SessionPhase::Terminated;
        self.termination = Some(reason);
        self.token.cancel();
        true
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(HostError::invalid_state(expected.to_string(), self.phase.to_string()))
        }
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Request a session URL and post the result to the queue.
///
/// No timeout is applied; only cancellation ends a pending request.
pub fn spawn_request(
    messaging: Arc<dyn MessagingService>,
    request: WebViewRequest,
    token: CancellationToken,
    tx: UnboundedSender<SessionCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                trace!("Session request cancelled");
            }
            result = messaging.request_web_view(request) => {
                let command = match result {
                    Ok(session) => SessionCommand::SessionIssued(session),
                    Err(e) => SessionCommand::SessionRequestFailed(e.to_string()),
                };
                let _ = tx.send(command);
            }
        }
    })
}

/// Follow a keep-alive stream and post how it ended.
///
/// Heartbeat items are ignored. Cancellation drops the stream.
pub fn spawn_keep_alive(
    mut stream: KeepAliveStream,
    token: CancellationToken,
    tx: UnboundedSender<SessionCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!("Keep-alive subscription disposed");
                    return;
                }
                item = stream.next() => {
                    let outcome = match item {
                        Some(Ok(())) => {
                            trace!("Keep-alive heartbeat");
                            continue;
                        }
                        Some(Err(e)) => KeepAliveOutcome::Invalidated(e.to_string()),
                        None => KeepAliveOutcome::Completed,
                    };
                    let _ = tx.send(SessionCommand::KeepAlive(outcome));
                    return;
                }
            }
        }
    })
}
