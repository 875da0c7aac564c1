//! Text to speech on a dedicated engine thread
//!
//! [`SynthesisWorker`] owns the speech engine for the lifetime of the process
//! and turns each [`SynthesisRequest`] into an [`AudioArtifact`], one request
//! at a time.

mod artifact;
mod worker;

pub use artifact::{ARTIFACT_PREFIX, ARTIFACT_SUFFIX, AudioArtifact};
pub use worker::{
    SynthesisRequest, SynthesisResult, SynthesisWorker, WORKER_THREAD_NAME, WorkerOptions,
};
