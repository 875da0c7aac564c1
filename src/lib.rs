//! Voicecast - speak text on a Google Home / Cast speaker
//!
//! This library provides the pieces behind the `voicecast` binary:
//! - VOICEVOX CORE binding behind the `SpeechEngine` trait
//! - A synthesis worker that owns the engine on one thread
//! - Bounded playback on a cast device with volume restore
//! - Console and Slack text sources
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │         Console  │  Slack (Socket Mode)      │
//! └────────────────────┬─────────────────────────┘
//!                      │ text
//! ┌────────────────────▼─────────────────────────┐
//! │  Notifier                                    │
//! │   SynthesisWorker ── engine thread ── WAV    │
//! │   PlaybackCoordinator ── Cast v2 ── device   │
//! └──────────────────────────────────────────────┘
//! ```

pub mod cast;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod playback;
pub mod synthesis;
pub mod wav;

pub use config::Settings;
pub use engine::{SpeechEngine, Voicevox};
pub use error::{Error, PlaybackError, Result};
pub use notifier::Notifier;
pub use playback::PlaybackCoordinator;
pub use synthesis::{AudioArtifact, SynthesisWorker};
