//! Notifier - speaks text from a channel on the cast device
//!
//! Each message goes text → synthesis worker → clip → playback → cleanup →
//! acknowledgement, one message at a time.

use std::future::Future;
use std::sync::Arc;

use crate::channels::Channel;
use crate::config::DeviceSettings;
use crate::playback::PlaybackCoordinator;
use crate::synthesis::SynthesisWorker;
use crate::{Error, Result, wav};

/// The speaking pipeline
pub struct Notifier {
    worker: Arc<SynthesisWorker>,
    coordinator: PlaybackCoordinator,
    device: DeviceSettings,
}

impl Notifier {
    /// Create a notifier playing on `device`
    #[must_use]
    pub fn new(worker: SynthesisWorker, coordinator: PlaybackCoordinator, device: DeviceSettings) -> Self {
        Self {
            worker: Arc::new(worker),
            coordinator,
            device,
        }
    }

    /// Target device settings
    #[must_use]
    pub const fn device(&self) -> &DeviceSettings {
        &self.device
    }

    /// Synthesize `text` and play it
    ///
    /// The clip is deleted before returning, whether playback worked or not.
    ///
    /// # Errors
    ///
    /// Returns the synthesis, connection or playback failure for this message
    pub async fn speak(&self, text: &str) -> Result<()> {
        let worker = Arc::clone(&self.worker);
        let request = text.to_string();
        let artifact = tokio::task::spawn_blocking(move || worker.synthesize(request))
            .await
            .map_err(|e| Error::Synthesis(format!("synthesis task failed: {e}")))??;

        let max_secs = self.device.max_duration().as_secs_f64();
        match wav::duration(artifact.path()) {
            Ok(secs) if secs > max_secs => tracing::warn!(
                secs,
                max_secs,
                "clip is longer than the maximum duration and will be cut off"
            ),
            Ok(secs) => tracing::debug!(secs, bytes = artifact.len(), "clip synthesized"),
            Err(e) => tracing::warn!(error = %e, "cannot read clip duration"),
        }

        let played = self.coordinator.play(artifact.path(), &self.device).await;

        if let Err(e) = artifact.close() {
            tracing::warn!(error = %e, "failed to remove clip");
        }

        played
    }

    /// Speak everything `channel` produces until it ends or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the channel fails to connect or to produce text
    pub async fn run(&self, channel: &mut dyn Channel) -> Result<()> {
        self.run_until(channel, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Speak everything `channel` produces until it ends or `shutdown` resolves
    ///
    /// A failed message is reported to the channel and the loop moves on.
    ///
    /// # Errors
    ///
    /// Returns error if the channel fails to connect or to produce text
    pub async fn run_until(
        &self,
        channel: &mut dyn Channel,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        channel.connect().await?;
        tracing::info!(channel = channel.name(), "notifier running");

        tokio::pin!(shutdown);

        loop {
            let incoming = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                next = channel.next_text() => match next? {
                    Some(incoming) => incoming,
                    None => {
                        tracing::info!(channel = channel.name(), "input closed");
                        break;
                    }
                },
            };

            let outcome = self.speak(&incoming.text).await;
            match &outcome {
                Ok(()) => tracing::info!(chars = incoming.text.chars().count(), "message spoken"),
                Err(e) => tracing::error!(error = %e, "failed to speak message"),
            }

            if let Err(e) = channel.acknowledge(&incoming, &outcome).await {
                tracing::warn!(error = %e, "failed to acknowledge message");
            }
        }

        channel.disconnect().await
    }
}
