//! Playing synthesized clips on a cast device
//!
//! The device is driven through the [`CastConnector`] / [`CastSession`]
//! traits; [`crate::cast::CastClient`] is the network implementation and
//! tests plug in fakes.

mod coordinator;
pub mod interface;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;

pub use coordinator::{PlaybackCoordinator, TIMEOUT_MESSAGE};

/// Content type of every clip the engine produces
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Where and how to reach the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    /// Device host or IP address
    pub addr: String,
    /// Device control port
    pub port: u16,
    /// Local address to connect from, resolved from the configured interface
    pub local_addr: Option<IpAddr>,
}

/// A media item to load on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLoad {
    /// Local file to play
    pub path: PathBuf,
    /// MIME type announced to the device
    pub content_type: String,
    /// Ask the device to transcode the item
    pub transcode: bool,
    /// Leave the receiver application running when the session closes
    pub detach: bool,
    /// Close the connection without any session teardown
    pub force_detach: bool,
}

impl MediaLoad {
    /// A non-looping WAV item for `path`
    #[must_use]
    pub fn wav(path: &Path, detach: bool, force_detach: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            content_type: WAV_CONTENT_TYPE.to_string(),
            transcode: false,
            detach,
            force_detach,
        }
    }
}

/// Opens control sessions to a device
#[async_trait]
pub trait CastConnector: Send + Sync {
    /// Connect to the device
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Connection`] if the device cannot be reached
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn CastSession>>;
}

/// One control session; closed when dropped
#[async_trait]
pub trait CastSession: Send {
    /// Current device volume (0.0 to 1.0)
    async fn volume(&mut self) -> Result<f32>;

    /// Set the device volume
    async fn set_volume(&mut self, level: f32) -> Result<()>;

    /// Load and start playing a media item
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaybackError::LoadFailed`] if the device rejects the item
    async fn load_media(&mut self, media: &MediaLoad) -> Result<()>;

    /// Stop the current media item
    async fn stop_media(&mut self) -> Result<()>;

    /// Resolve once the device reports the current item finished
    async fn wait_media_finished(&mut self) -> Result<()>;
}
