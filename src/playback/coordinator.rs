//! Bounded playback with volume restore

use std::path::Path;
use std::time::Duration;

use super::{CastConnector, CastSession, DeviceTarget, MediaLoad, interface};
use crate::config::DeviceSettings;
use crate::{PlaybackError, Result};

/// Error text reported when a clip outlives the maximum duration
pub const TIMEOUT_MESSAGE: &str = "message was too long, interrupted";

/// How the finished-or-deadline race ended
enum Outcome {
    Finished(Result<()>),
    TimedOut,
}

/// Plays clips on the configured device, one session per call
pub struct PlaybackCoordinator {
    connector: Box<dyn CastConnector>,
}

impl PlaybackCoordinator {
    /// Create a coordinator driving devices through `connector`
    pub fn new(connector: impl CastConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
        }
    }

    /// Play the clip at `path` on the device described by `device`
    ///
    /// The device volume is set to `device.volume` for the duration of the
    /// call and put back before it returns, whichever way it ends once the
    /// volume has been changed. Playback still running after
    /// `device.max_duration` is stopped.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Connection`] if the interface or the device cannot be reached
    /// - [`PlaybackError::LoadFailed`] if the device rejects the clip
    /// - [`PlaybackError::Timeout`] if playback was interrupted
    pub async fn play(&self, path: &Path, device: &DeviceSettings) -> Result<()> {
        let local_addr = device.iface().map(interface::resolve).transpose()?;
        let target = DeviceTarget {
            addr: device.addr.clone(),
            port: device.port,
            local_addr,
        };

        tracing::debug!(addr = %target.addr, port = target.port, ?local_addr, "connecting to device");
        let mut session = self.connector.connect(&target).await?;

        let previous = session.volume().await?;
        session.set_volume(device.volume).await?;
        tracing::debug!(previous, volume = device.volume, "volume set");

        let media = MediaLoad::wav(path, device.detach, device.force_detach);
        if let Err(e) = session.load_media(&media).await {
            restore_volume(session.as_mut(), previous).await;
            return Err(e);
        }

        let max_duration = device.max_duration();
        let outcome = race(session.as_mut(), max_duration).await;

        match outcome {
            Outcome::Finished(finished) => {
                restore_volume(session.as_mut(), previous).await;
                finished?;
                tracing::info!(path = %path.display(), "playback finished");
                Ok(())
            }
            Outcome::TimedOut => {
                tracing::warn!(max_secs = max_duration.as_secs(), "playback interrupted");
                if let Err(e) = session.stop_media().await {
                    tracing::warn!(error = %e, "failed to stop media");
                }
                restore_volume(session.as_mut(), previous).await;
                Err(PlaybackError::Timeout(TIMEOUT_MESSAGE.to_string()).into())
            }
        }
    }
}

async fn race(session: &mut dyn CastSession, max_duration: Duration) -> Outcome {
    tokio::select! {
        finished = session.wait_media_finished() => Outcome::Finished(finished),
        () = tokio::time::sleep(max_duration) => Outcome::TimedOut,
    }
}

async fn restore_volume(session: &mut dyn CastSession, previous: f32) {
    if let Err(e) = session.set_volume(previous).await {
        tracing::warn!(error = %e, volume = previous, "failed to restore volume");
    }
}
