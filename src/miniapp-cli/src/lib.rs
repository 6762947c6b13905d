//! Transcript replay for the mini-app host.
//!
//! A transcript is a JSON-lines list of surface, host and keep-alive inputs.
//! [`replay`] feeds it to a [`miniapp_host::WebAppController`] wired to
//! recording collaborators and returns every effect in order.

pub mod recorder;
pub mod replay;
pub mod transcript;

pub use recorder::{Effect, EffectLog, LoggingShell, LoggingSurface, ReplayMessaging};
pub use replay::{replay, ReplayOptions, ReplaySummary};
pub use transcript::{parse_transcript, read_transcript, ReplayStep, ThemeChoice, TranscriptError};
