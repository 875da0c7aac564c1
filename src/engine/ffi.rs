//! Raw C ABI of `voicevox_core`
//!
//! Both the runtime-loaded and the build-time-linked library are exposed as
//! the same [`VoicevoxApi`] function table.

use std::ffi::c_char;

/// `VoicevoxResultCode`; 0 is success
pub type VoicevoxResultCode = i32;

/// `VOICEVOX_RESULT_OK`
pub const VOICEVOX_RESULT_OK: VoicevoxResultCode = 0;

/// `VoicevoxInitializeOptions`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VoicevoxInitializeOptions {
    pub acceleration_mode: i32,
    pub cpu_num_threads: u16,
    pub load_all_models: bool,
    pub open_jtalk_dict_dir: *const c_char,
}

/// `VoicevoxTtsOptions`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VoicevoxTtsOptions {
    pub kana: bool,
    pub enable_interrogative_upspeak: bool,
}

pub type InitializeFn = unsafe extern "C" fn(VoicevoxInitializeOptions) -> VoicevoxResultCode;
pub type GetVersionFn = unsafe extern "C" fn() -> *const c_char;
pub type LoadModelFn = unsafe extern "C" fn(u32) -> VoicevoxResultCode;
pub type IsGpuModeFn = unsafe extern "C" fn() -> bool;
pub type IsModelLoadedFn = unsafe extern "C" fn(u32) -> bool;
pub type FinalizeFn = unsafe extern "C" fn();
pub type TtsFn = unsafe extern "C" fn(
    *const c_char,
    u32,
    VoicevoxTtsOptions,
    *mut usize,
    *mut *mut u8,
) -> VoicevoxResultCode;
pub type WavFreeFn = unsafe extern "C" fn(*mut u8);
pub type ErrorResultToMessageFn = unsafe extern "C" fn(VoicevoxResultCode) -> *const c_char;
pub type GetMetasJsonFn = unsafe extern "C" fn() -> *const c_char;
pub type GetSupportedDevicesJsonFn = unsafe extern "C" fn() -> *const c_char;

/// Entry points of the engine library
///
/// Strings returned by `get_version`, `get_metas_json`,
/// `get_supported_devices_json` and `error_result_to_message` are static
/// NUL-terminated UTF-8 and owned by the engine. The WAV buffer written by `tts` must be handed
/// back to `wav_free` exactly once.
#[derive(Debug, Clone, Copy)]
pub struct VoicevoxApi {
    pub initialize: InitializeFn,
    pub get_version: GetVersionFn,
    pub load_model: LoadModelFn,
    pub is_gpu_mode: IsGpuModeFn,
    pub is_model_loaded: IsModelLoadedFn,
    pub finalize: FinalizeFn,
    pub tts: TtsFn,
    pub wav_free: WavFreeFn,
    pub error_result_to_message: ErrorResultToMessageFn,
    pub get_metas_json: GetMetasJsonFn,
    pub get_supported_devices_json: GetSupportedDevicesJsonFn,
}

#[cfg(feature = "static-link")]
#[allow(unsafe_code)]
pub(crate) mod linked {
    use std::ffi::c_char;

    use super::{VoicevoxApi, VoicevoxInitializeOptions, VoicevoxResultCode, VoicevoxTtsOptions};

    #[link(name = "voicevox_core")]
    unsafe extern "C" {
        fn voicevox_initialize(options: VoicevoxInitializeOptions) -> VoicevoxResultCode;
        fn voicevox_get_version() -> *const c_char;
        fn voicevox_load_model(speaker_id: u32) -> VoicevoxResultCode;
        fn voicevox_is_gpu_mode() -> bool;
        fn voicevox_is_model_loaded(speaker_id: u32) -> bool;
        fn voicevox_finalize();
        fn voicevox_tts(
            text: *const c_char,
            speaker_id: u32,
            options: VoicevoxTtsOptions,
            output_wav_length: *mut usize,
            output_wav: *mut *mut u8,
        ) -> VoicevoxResultCode;
        fn voicevox_wav_free(wav: *mut u8);
        fn voicevox_error_result_to_message(result_code: VoicevoxResultCode) -> *const c_char;
        fn voicevox_get_metas_json() -> *const c_char;
        fn voicevox_get_supported_devices_json() -> *const c_char;
    }

    /// Function table backed by the linked library
    pub fn api() -> VoicevoxApi {
        VoicevoxApi {
            initialize: voicevox_initialize,
            get_version: voicevox_get_version,
            load_model: voicevox_load_model,
            is_gpu_mode: voicevox_is_gpu_mode,
            is_model_loaded: voicevox_is_model_loaded,
            finalize: voicevox_finalize,
            tts: voicevox_tts,
            wav_free: voicevox_wav_free,
            error_result_to_message: voicevox_error_result_to_message,
            get_metas_json: voicevox_get_metas_json,
            get_supported_devices_json: voicevox_get_supported_devices_json,
        }
    }
}
