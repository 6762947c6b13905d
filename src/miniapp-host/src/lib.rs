//! # Mini-App Host
//!
//! Runs one embedded bot mini-app session inside a host messaging app.
//!
//! ## Components
//!
//! - **Lifecycle**: acquires the session from a pre-issued URL or a request,
//!   tracks the query id and follows the keep-alive stream
//! - **Bridge state machine**: applies decoded bridge events and layout
//!   changes, gating and latching as the protocol requires
//! - **Presentation**: background, placeholder reveal, navigation bar alpha
//! - **Navigation policy**: keeps intercepted links out of the surface
//! - **Controller**: the single consumer of the session's coordination queue
//!
//! The rendering surface, the host container and the messaging backend are
//! collaborators behind the traits in [`collaborators`].

pub mod bridge;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod navigation;
pub mod params;
pub mod presentation;
pub mod viewport;

// Re-exports for convenience
pub use bridge::{BridgeEffect, BridgeStateMachine};
pub use collaborators::{
    Collaborators, HostShell, MessagingService, RenderSurface, WebViewData, WebViewRequest,
    WebViewSession,
};
pub use command::{ControllerHandle, SessionCommand, SurfaceEvent};
pub use config::HostConfig;
pub use controller::WebAppController;
pub use error::{HostError, Result};
pub use geometry::{Insets, Point, Rect, Size};
pub use lifecycle::{KeepAliveOutcome, SessionLifecycle, SessionPhase, TerminationReason};
pub use navigation::{NavigationDecision, NavigationPolicy};
pub use params::{KeepAliveStream, LaunchPath, SessionParameters};
pub use presentation::{PlaceholderStyle, PresentationAdapter};
pub use viewport::{HostLayout, ViewportState, WidthClass};
