//! Safe wrapper over the VOICEVOX CORE function table

#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_char};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use libloading::Library;

use super::buffer::ForeignBytes;
use super::ffi::{VoicevoxApi, VoicevoxInitializeOptions, VoicevoxTtsOptions};
use super::loader;
use super::meta::{SpeakerMeta, SupportedDevices};
use super::result_code::ResultCode;
use super::{InitializeOptions, SpeechEngine, TtsOptions};
use crate::{Error, Result};

/// Set while some session holds the process-wide engine state
static ENGINE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// A VOICEVOX CORE engine session
///
/// The value is `!Send`: the engine's state is bound to the
/// thread that initialized it, so a session is created and used on a single
/// thread (see [`crate::synthesis::SynthesisWorker`]).
///
/// The engine keeps one global state per process. Only one session at a time
/// can be initialized; the claim is released by `finalize`.
pub struct Voicevox {
    api: VoicevoxApi,
    initialized: bool,
    // Keeps the resolved function pointers valid
    _library: Option<Library>,
    _thread_bound: PhantomData<*const ()>,
}

impl Voicevox {
    /// Open the engine library and resolve its entry points
    ///
    /// `path` overrides the platform default library name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineInit`] if the library or any symbol is missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (api, library) = loader::load_api(path)?;
        Ok(Self {
            api,
            initialized: false,
            _library: library,
            _thread_bound: PhantomData,
        })
    }

    /// Wrap an already resolved function table
    ///
    /// # Safety
    ///
    /// Every entry must behave like the `voicevox_core` C API it stands for:
    /// - string getters return null or a NUL-terminated string that stays
    ///   valid for the life of the process
    /// - `tts` either leaves the out pointers untouched or writes a pointer
    ///   to `len` initialized bytes that `wav_free` releases exactly once
    /// - any code the table points into outlives the returned session
    #[must_use]
    pub const unsafe fn from_api(api: VoicevoxApi) -> Self {
        Self {
            api,
            initialized: false,
            _library: None,
            _thread_bound: PhantomData,
        }
    }

    /// Engine version string
    #[must_use]
    pub fn version(&self) -> String {
        // SAFETY: returns a static NUL-terminated string owned by the engine
        unsafe { static_str((self.api.get_version)()) }
    }

    /// Voices and styles bundled with the engine
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the engine's JSON is malformed
    pub fn speakers(&self) -> Result<Vec<SpeakerMeta>> {
        // SAFETY: returns a static NUL-terminated string owned by the engine
        let json = unsafe { static_str((self.api.get_metas_json)()) };
        Ok(serde_json::from_str(&json)?)
    }

    /// Inference devices this engine build can use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the engine's JSON is malformed
    pub fn supported_devices(&self) -> Result<SupportedDevices> {
        // SAFETY: returns a static NUL-terminated string owned by the engine
        let json = unsafe { static_str((self.api.get_supported_devices_json)()) };
        Ok(serde_json::from_str(&json)?)
    }

    /// Whether the model for `speaker_id` is loaded
    #[must_use]
    pub fn is_model_loaded(&self, speaker_id: u32) -> bool {
        // SAFETY: plain value call
        unsafe { (self.api.is_model_loaded)(speaker_id) }
    }

    /// Whether `initialize` has succeeded and `finalize` has not run yet
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Translate a result code with the engine's own message table
    fn describe(&self, code: i32) -> String {
        // SAFETY: returns a static NUL-terminated string owned by the engine
        let message = unsafe { static_str((self.api.error_result_to_message)(code)) };
        let code = ResultCode::from(code);

        if message.is_empty() {
            code.to_string()
        } else {
            format!("{message} ({code})")
        }
    }
}

impl SpeechEngine for Voicevox {
    fn initialize(&mut self, options: &InitializeOptions) -> Result<()> {
        if self.initialized {
            return Err(Error::EngineInit("engine already initialized".to_string()));
        }

        let dict_dir = options.open_jtalk_dict_dir.to_str().ok_or_else(|| {
            Error::EngineInit(format!(
                "dictionary path is not valid UTF-8: {}",
                options.open_jtalk_dict_dir.display()
            ))
        })?;
        let dict_dir = CString::new(dict_dir)
            .map_err(|_| Error::EngineInit("dictionary path contains a NUL byte".to_string()))?;

        if ENGINE_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::EngineInit(
                "engine already initialized in this process".to_string(),
            ));
        }

        let raw = VoicevoxInitializeOptions {
            acceleration_mode: options.acceleration_mode.as_raw(),
            cpu_num_threads: options.cpu_num_threads,
            load_all_models: options.load_all_models,
            open_jtalk_dict_dir: dict_dir.as_ptr(),
        };

        // SAFETY: `dict_dir` outlives the call; the engine copies the path.
        let code = unsafe { (self.api.initialize)(raw) };
        if !ResultCode::from(code).is_ok() {
            ENGINE_CLAIMED.store(false, Ordering::Release);
            return Err(Error::EngineInit(self.describe(code)));
        }

        self.initialized = true;
        tracing::info!(
            version = %self.version(),
            acceleration = ?options.acceleration_mode,
            dict_dir = %options.open_jtalk_dict_dir.display(),
            "engine initialized"
        );

        Ok(())
    }

    fn load_model(&mut self, speaker_id: u32) -> Result<()> {
        // SAFETY: plain value call
        let code = unsafe { (self.api.load_model)(speaker_id) };
        if !ResultCode::from(code).is_ok() {
            return Err(Error::ModelLoad(format!(
                "speaker {speaker_id}: {}",
                self.describe(code)
            )));
        }

        tracing::info!(speaker_id, "voice model loaded");
        Ok(())
    }

    fn tts(&mut self, text: &str, speaker_id: u32, options: TtsOptions) -> Result<Vec<u8>> {
        let text = CString::new(text)
            .map_err(|_| Error::Synthesis("text contains a NUL byte".to_string()))?;
        let raw_options = VoicevoxTtsOptions {
            kana: options.kana,
            enable_interrogative_upspeak: options.enable_interrogative_upspeak,
        };

        let mut wav_length: usize = 0;
        let mut wav: *mut u8 = std::ptr::null_mut();

        // SAFETY: `text` is NUL-terminated and outlives the call; the out
        // pointers refer to live locals.
        let code = unsafe {
            (self.api.tts)(
                text.as_ptr(),
                speaker_id,
                raw_options,
                &raw mut wav_length,
                &raw mut wav,
            )
        };

        // SAFETY: on return the engine has passed ownership of `wav` (if any)
        // to us; `wav_free` is its release function.
        let buffer = unsafe { ForeignBytes::from_raw(wav, wav_length, self.api.wav_free) };

        if !ResultCode::from(code).is_ok() {
            drop(buffer);
            return Err(Error::Synthesis(self.describe(code)));
        }

        let bytes = buffer.into_vec();
        tracing::debug!(speaker_id, bytes = bytes.len(), "synthesized");
        Ok(bytes)
    }

    fn finalize(&mut self) {
        if !self.initialized {
            return;
        }

        // SAFETY: the engine was initialized by this session
        unsafe { (self.api.finalize)() };
        self.initialized = false;
        ENGINE_CLAIMED.store(false, Ordering::Release);
        tracing::info!("engine finalized");
    }

    fn is_gpu_mode(&self) -> bool {
        // SAFETY: plain value call
        unsafe { (self.api.is_gpu_mode)() }
    }
}

impl Drop for Voicevox {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Copy a static engine string
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string that stays valid for the call.
unsafe fn static_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }

    // SAFETY: forwarded from the caller
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
