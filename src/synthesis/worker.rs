//! Single-threaded synthesis worker
//!
//! The engine is created, initialized and driven on one dedicated OS thread.
//! Requests and results cross that boundary through zero-capacity
//! (rendezvous) channels, so a submitter blocks until the worker takes the
//! request and the worker takes the next request only after its previous
//! result has been received. At most one request is in flight, which is what
//! lets a shared handle be used from many threads without further locking.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;

use super::artifact::AudioArtifact;
use crate::config::EngineSettings;
use crate::engine::{InitializeOptions, SpeechEngine, TtsOptions};
use crate::{Error, Result};

/// Name of the engine thread
pub const WORKER_THREAD_NAME: &str = "synthesis-worker";

/// Text to synthesize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
}

impl SynthesisRequest {
    /// Create a request
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Outcome of one request: the clip on success, the failure otherwise
pub type SynthesisResult = Result<AudioArtifact>;

/// Everything the worker thread needs to bring the engine up
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Engine initialization options
    pub initialize: InitializeOptions,
    /// Voice to synthesize with
    pub speaker_id: u32,
    /// Per-call options
    pub tts: TtsOptions,
    /// Where clips are written; the system temp dir when `None`
    pub artifact_dir: Option<PathBuf>,
}

impl From<&EngineSettings> for WorkerOptions {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            initialize: settings.initialize_options(),
            speaker_id: settings.speaker_id,
            tts: settings.tts_options(),
            artifact_dir: None,
        }
    }
}

/// Handle to the synthesis worker thread
///
/// The handle is `Sync`; callers on different threads may share it and call
/// [`SynthesisWorker::synthesize`] concurrently. Dropping the handle closes
/// both endpoints; the worker finalizes the engine on its own thread and
/// exits.
pub struct SynthesisWorker {
    requests: Option<SyncSender<SynthesisRequest>>,
    results: Option<Mutex<Receiver<SynthesisResult>>>,
    thread: Option<JoinHandle<()>>,
}

impl SynthesisWorker {
    /// Start the worker
    ///
    /// `factory` builds the engine on the worker thread, where it is then
    /// initialized and its model loaded. This call returns only after that
    /// startup has finished.
    ///
    /// # Errors
    ///
    /// Returns the startup failure ([`Error::EngineInit`] or
    /// [`Error::ModelLoad`]); no request is accepted in that case
    pub fn spawn<E, F>(factory: F, options: WorkerOptions) -> Result<Self>
    where
        E: SpeechEngine,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::sync_channel::<SynthesisRequest>(0);
        let (result_tx, result_rx) = mpsc::sync_channel::<SynthesisResult>(0);
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut engine = match start_engine(factory, &options) {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                serve(&mut engine, &options, &request_rx, &result_tx);

                engine.finalize();
                tracing::debug!("synthesis worker stopped");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                requests: Some(request_tx),
                results: Some(Mutex::new(result_rx)),
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::EngineInit(
                    "synthesis worker exited during startup".to_string(),
                ))
            }
        }
    }

    /// Hand a request to the worker, blocking until it is accepted
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the worker has stopped
    pub fn submit(&self, request: SynthesisRequest) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or_else(worker_stopped)?
            .send(request)
            .map_err(|_| worker_stopped())
    }

    /// Wait for the result of the accepted request
    ///
    /// Every successful [`SynthesisWorker::submit`] must be followed by a
    /// `receive` on the same thread; the worker accepts nothing else until
    /// then.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the worker has stopped
    pub fn receive(&self) -> SynthesisResult {
        self.results
            .as_ref()
            .ok_or_else(worker_stopped)?
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv()
            .map_err(|_| worker_stopped())?
    }

    /// Submit `text` and wait for its result
    ///
    /// # Errors
    ///
    /// Returns the request's synthesis or IO failure, or [`Error::Synthesis`]
    /// if the worker has stopped
    pub fn synthesize(&self, text: impl Into<String>) -> SynthesisResult {
        self.submit(SynthesisRequest::new(text))?;
        self.receive()
    }
}

impl Drop for SynthesisWorker {
    fn drop(&mut self) {
        // Closing both endpoints unblocks the worker wherever it waits
        self.requests.take();
        self.results.take();

        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("synthesis worker panicked");
        }
    }
}

fn worker_stopped() -> Error {
    Error::Synthesis("synthesis worker is not running".to_string())
}

fn start_engine<E, F>(factory: F, options: &WorkerOptions) -> Result<E>
where
    E: SpeechEngine,
    F: FnOnce() -> Result<E>,
{
    let mut engine = factory()?;
    engine.initialize(&options.initialize)?;

    if let Err(e) = engine.load_model(options.speaker_id) {
        engine.finalize();
        return Err(e);
    }

    tracing::info!(
        speaker_id = options.speaker_id,
        gpu = engine.is_gpu_mode(),
        "synthesis worker ready"
    );

    Ok(engine)
}

/// Request loop; returns when either endpoint is closed
fn serve<E: SpeechEngine>(
    engine: &mut E,
    options: &WorkerOptions,
    requests: &Receiver<SynthesisRequest>,
    results: &SyncSender<SynthesisResult>,
) {
    while let Ok(request) = requests.recv() {
        let result = synthesize_one(engine, options, &request);

        match &result {
            Ok(artifact) => tracing::debug!(
                chars = request.text.chars().count(),
                path = %artifact.path().display(),
                "clip ready"
            ),
            Err(e) => tracing::warn!(error = %e, "synthesis request failed"),
        }

        if results.send(result).is_err() {
            break;
        }
    }
}

fn synthesize_one<E: SpeechEngine>(
    engine: &mut E,
    options: &WorkerOptions,
    request: &SynthesisRequest,
) -> SynthesisResult {
    let wav = engine.tts(&request.text, options.speaker_id, options.tts)?;

    let artifact = match &options.artifact_dir {
        Some(dir) => AudioArtifact::create_in(dir, &wav)?,
        None => AudioArtifact::create(&wav)?,
    };

    Ok(artifact)
}
