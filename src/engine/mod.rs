//! Native speech engine binding
//!
//! Wraps VOICEVOX CORE behind the [`SpeechEngine`] trait. The engine is not
//! re-entrant and its state is bound to the thread that initialized it, so
//! an engine value is only ever owned by the synthesis worker thread.

mod buffer;
pub mod ffi;
mod loader;
mod meta;
mod result_code;
mod voicevox;

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

pub use buffer::ForeignBytes;
pub use loader::{LIBRARY_NAME, default_library_path};
pub use meta::{SpeakerMeta, StyleMeta, SupportedDevices, find_style};
pub use result_code::ResultCode;
pub use voicevox::Voicevox;

/// Hardware selection for inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AccelerationMode {
    /// Let the engine pick GPU when available
    #[default]
    Auto,
    /// Force CPU inference
    Cpu,
    /// Force GPU inference
    Gpu,
}

impl AccelerationMode {
    /// Raw value of `VoicevoxAccelerationMode`
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Auto => 0,
            Self::Cpu => 1,
            Self::Gpu => 2,
        }
    }
}

/// Options for [`SpeechEngine::initialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeOptions {
    /// Hardware acceleration mode
    pub acceleration_mode: AccelerationMode,
    /// CPU threads for inference; 0 lets the engine decide
    pub cpu_num_threads: u16,
    /// Load every voice model up front
    pub load_all_models: bool,
    /// Open JTalk dictionary directory
    pub open_jtalk_dict_dir: PathBuf,
}

impl Default for InitializeOptions {
    fn default() -> Self {
        Self {
            acceleration_mode: AccelerationMode::Auto,
            cpu_num_threads: 0,
            load_all_models: false,
            open_jtalk_dict_dir: PathBuf::from(crate::config::DEFAULT_DICT_DIR),
        }
    }
}

/// Per-call synthesis options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtsOptions {
    /// Interpret the text as AquesTalk-style kana
    pub kana: bool,
    /// Raise the pitch at the end of questions
    pub enable_interrogative_upspeak: bool,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            kana: false,
            enable_interrogative_upspeak: true,
        }
    }
}

/// A speech synthesis engine
///
/// Implementations are driven from a single thread; none of the methods may
/// be called concurrently and every call after `initialize` must come from
/// the thread that performed it.
pub trait SpeechEngine {
    /// Initialize the engine. Must be called exactly once before anything else.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EngineInit`] with the engine's own message
    fn initialize(&mut self, options: &InitializeOptions) -> Result<()>;

    /// Load the model for a speaker. Loading an already loaded model is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelLoad`] with the engine's own message
    fn load_model(&mut self, speaker_id: u32) -> Result<()>;

    /// Synthesize `text` into WAV bytes owned by the caller
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Synthesis`] when the engine rejects the request
    fn tts(&mut self, text: &str, speaker_id: u32, options: TtsOptions) -> Result<Vec<u8>>;

    /// Release engine resources. A no-op if `initialize` never succeeded.
    fn finalize(&mut self);

    /// Whether inference runs on a GPU
    fn is_gpu_mode(&self) -> bool {
        false
    }
}
