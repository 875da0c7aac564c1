//! Error types for voicecast

use thiserror::Error;

/// Result type alias for voicecast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voicecast
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (startup-fatal)
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine could not be loaded or initialized (startup-fatal)
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// Voice model could not be loaded (startup-fatal)
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Engine rejected a synthesis request
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Cast device unreachable or network interface not found
    #[error("connection error: {0}")]
    Connection(String),

    /// Playback on the cast device failed
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Malformed frame or payload from the cast device
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Chat channel error
    #[error("channel error: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures of a single playback attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Device refused to load the media item
    #[error("load failed: {0}")]
    LoadFailed(String),

    /// Playback exceeded the configured maximum duration and was stopped
    #[error("{0}")]
    Timeout(String),
}

impl Error {
    /// Whether this error must stop the process before any request is accepted
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::EngineInit(_) | Self::ModelLoad(_)
        )
    }

    /// Whether this error is a playback timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Playback(PlaybackError::Timeout(_)))
    }
}
