//! Locating the engine entry points
//!
//! By default the shared library is opened at startup and every symbol is
//! resolved eagerly, so a missing library or symbol fails before any request
//! is accepted. With the `static-link` feature the symbols are linked at
//! build time instead.

#![allow(unsafe_code)]

use std::path::{Path, PathBuf};

use libloading::Library;

use super::ffi::VoicevoxApi;
use crate::{Error, Result};

/// Base name of the engine library
pub const LIBRARY_NAME: &str = "voicevox_core";

/// Platform file name of the engine library (`libvoicevox_core.so`, `voicevox_core.dll`, ...)
#[must_use]
pub fn default_library_path() -> PathBuf {
    PathBuf::from(libloading::library_filename(LIBRARY_NAME))
}

/// Resolve the function table, returning the library handle that keeps it valid
#[cfg(not(feature = "static-link"))]
pub(super) fn load_api(path: Option<&Path>) -> Result<(VoicevoxApi, Option<Library>)> {
    let path = path.map_or_else(default_library_path, Path::to_path_buf);

    // SAFETY: opening the library runs its initializers; voicevox_core only
    // sets up its own statics there.
    let library = unsafe { Library::new(&path) }.map_err(|e| {
        Error::EngineInit(format!("failed to load {}: {e}", path.display()))
    })?;

    // SAFETY: each symbol is declared with the signature from voicevox_core.h
    // and the copied pointers are only used while `library` is alive.
    let api = unsafe {
        VoicevoxApi {
            initialize: symbol(&library, b"voicevox_initialize\0")?,
            get_version: symbol(&library, b"voicevox_get_version\0")?,
            load_model: symbol(&library, b"voicevox_load_model\0")?,
            is_gpu_mode: symbol(&library, b"voicevox_is_gpu_mode\0")?,
            is_model_loaded: symbol(&library, b"voicevox_is_model_loaded\0")?,
            finalize: symbol(&library, b"voicevox_finalize\0")?,
            tts: symbol(&library, b"voicevox_tts\0")?,
            wav_free: symbol(&library, b"voicevox_wav_free\0")?,
            error_result_to_message: symbol(&library, b"voicevox_error_result_to_message\0")?,
            get_metas_json: symbol(&library, b"voicevox_get_metas_json\0")?,
            get_supported_devices_json: symbol(&library, b"voicevox_get_supported_devices_json\0")?,
        }
    };

    tracing::debug!(path = %path.display(), "engine library loaded");

    Ok((api, Some(library)))
}

/// Resolve the function table from the linked library
#[cfg(feature = "static-link")]
#[allow(clippy::unnecessary_wraps)]
pub(super) fn load_api(path: Option<&Path>) -> Result<(VoicevoxApi, Option<Library>)> {
    if let Some(path) = path {
        tracing::warn!(
            path = %path.display(),
            "engine library path ignored: built with static-link"
        );
    }

    Ok((super::ffi::linked::api(), None))
}

/// Copy a function pointer out of `library`
///
/// # Safety
///
/// `T` must match the symbol's real signature.
#[cfg(not(feature = "static-link"))]
unsafe fn symbol<T: Copy>(library: &Library, name: &'static [u8]) -> Result<T> {
    let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));

    // SAFETY: forwarded from the caller
    let sym = unsafe { library.get::<T>(name) }
        .map_err(|e| Error::EngineInit(format!("missing symbol {printable}: {e}")))?;

    Ok(*sym)
}
