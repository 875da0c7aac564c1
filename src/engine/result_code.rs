//! `VoicevoxResultCode` values

use std::fmt;

/// Status returned by every fallible engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    NotLoadedOpenjtalkDict,
    LoadModel,
    GetSupportedDevices,
    GpuSupport,
    LoadMetas,
    UninitializedStatus,
    InvalidSpeakerId,
    InvalidModelIndex,
    Inference,
    ExtractFullContextLabel,
    InvalidUtf8Input,
    ParseKana,
    InvalidAudioQuery,
    /// A code this binding does not know about
    Unknown(i32),
}

impl ResultCode {
    /// Whether the call succeeded
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Symbolic name used by the engine's C header
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "RESULT_OK",
            Self::NotLoadedOpenjtalkDict => "RESULT_NOT_LOADED_OPENJTALK_DICT_ERROR",
            Self::LoadModel => "RESULT_LOAD_MODEL_ERROR",
            Self::GetSupportedDevices => "RESULT_GET_SUPPORTED_DEVICES_ERROR",
            Self::GpuSupport => "RESULT_GPU_SUPPORT_ERROR",
            Self::LoadMetas => "RESULT_LOAD_METAS_ERROR",
            Self::UninitializedStatus => "RESULT_UNINITIALIZED_STATUS_ERROR",
            Self::InvalidSpeakerId => "RESULT_INVALID_SPEAKER_ID_ERROR",
            Self::InvalidModelIndex => "RESULT_INVALID_MODEL_INDEX_ERROR",
            Self::Inference => "RESULT_INFERENCE_ERROR",
            Self::ExtractFullContextLabel => "RESULT_EXTRACT_FULL_CONTEXT_LABEL_ERROR",
            Self::InvalidUtf8Input => "RESULT_INVALID_UTF8_INPUT_ERROR",
            Self::ParseKana => "RESULT_PARSE_KANA_ERROR",
            Self::InvalidAudioQuery => "RESULT_INVALID_AUDIO_QUERY_ERROR",
            Self::Unknown(_) => "RESULT_UNKNOWN",
        }
    }

    /// Raw integer value
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::NotLoadedOpenjtalkDict => 1,
            Self::LoadModel => 2,
            Self::GetSupportedDevices => 3,
            Self::GpuSupport => 4,
            Self::LoadMetas => 5,
            Self::UninitializedStatus => 6,
            Self::InvalidSpeakerId => 7,
            Self::InvalidModelIndex => 8,
            Self::Inference => 9,
            Self::ExtractFullContextLabel => 10,
            Self::InvalidUtf8Input => 11,
            Self::ParseKana => 12,
            Self::InvalidAudioQuery => 13,
            Self::Unknown(code) => code,
        }
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::NotLoadedOpenjtalkDict,
            2 => Self::LoadModel,
            3 => Self::GetSupportedDevices,
            4 => Self::GpuSupport,
            5 => Self::LoadMetas,
            6 => Self::UninitializedStatus,
            7 => Self::InvalidSpeakerId,
            8 => Self::InvalidModelIndex,
            9 => Self::Inference,
            10 => Self::ExtractFullContextLabel,
            11 => Self::InvalidUtf8Input,
            12 => Self::ParseKana,
            13 => Self::InvalidAudioQuery,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "{}({code})", self.name()),
            known => f.write_str(known.name()),
        }
    }
}
