//! Synthesis worker integration tests
//!
//! Runs the worker against an in-process engine that records which thread
//! each call arrives on.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use voicecast::Error;
use voicecast::synthesis::{
    ARTIFACT_PREFIX, ARTIFACT_SUFFIX, SynthesisRequest, SynthesisWorker, WORKER_THREAD_NAME,
    WorkerOptions,
};
use voicecast::wav;

mod common;
use common::StubEngine;

fn options(dir: &tempfile::TempDir) -> WorkerOptions {
    WorkerOptions {
        initialize: voicecast::engine::InitializeOptions::default(),
        speaker_id: 3,
        tts: voicecast::engine::TtsOptions::default(),
        artifact_dir: Some(dir.path().to_path_buf()),
    }
}

fn spawn(engine: StubEngine, dir: &tempfile::TempDir) -> voicecast::Result<SynthesisWorker> {
    SynthesisWorker::spawn(move || Ok(engine), options(dir))
}

#[test]
fn startup_initializes_then_loads_model() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new();
    let log = Arc::clone(&engine.log);

    let worker = spawn(engine, &dir).unwrap();
    assert_eq!(log.ops(), vec!["initialize", "load_model:3"]);

    drop(worker);
    assert_eq!(log.ops().last().map(String::as_str), Some("finalize"));
}

#[test]
fn initialize_failure_is_fatal_and_accepts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine {
        fail_initialize: true,
        ..StubEngine::new()
    };
    let log = Arc::clone(&engine.log);

    let err = spawn(engine, &dir).err().unwrap();
    assert!(matches!(err, Error::EngineInit(_)));
    assert!(err.is_fatal());
    assert_eq!(log.ops(), vec!["initialize"]);
}

#[test]
fn model_load_failure_is_fatal_and_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine {
        fail_load_model: true,
        ..StubEngine::new()
    };
    let log = Arc::clone(&engine.log);

    let err = spawn(engine, &dir).err().unwrap();
    assert!(matches!(err, Error::ModelLoad(_)));
    assert!(err.is_fatal());
    assert_eq!(log.ops(), vec!["initialize", "load_model:3", "finalize"]);
}

#[test]
fn factory_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = SynthesisWorker::spawn(
        || -> voicecast::Result<StubEngine> {
            Err(Error::EngineInit("failed to load libvoicevox_core.so".to_string()))
        },
        options(&dir),
    );

    let err = result.err().unwrap();
    assert!(err.to_string().contains("libvoicevox_core.so"));
}

#[test]
fn clip_holds_engine_bytes_with_artifact_name() {
    let dir = tempfile::tempdir().unwrap();
    let worker = spawn(StubEngine::new(), &dir).unwrap();

    let artifact = worker.synthesize("hello").unwrap();
    let name = artifact
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with(ARTIFACT_PREFIX), "{name}");
    assert!(name.ends_with(ARTIFACT_SUFFIX), "{name}");
    assert!(artifact.path().starts_with(dir.path()));

    let on_disk = std::fs::read(artifact.path()).unwrap();
    assert_eq!(on_disk, common::wav_bytes(500, common::STUB_SAMPLE_RATE));
    assert_eq!(artifact.len(), on_disk.len());

    let path = artifact.path().to_path_buf();
    artifact.close().unwrap();
    assert!(!path.exists());
}

#[test]
fn results_come_back_in_submission_order() {
    let dir = tempfile::tempdir().unwrap();
    let worker = spawn(StubEngine::new(), &dir).unwrap();

    let durations: Vec<f64> = ["a", "bbbb", "cc"]
        .into_iter()
        .map(|text| {
            let artifact = worker.synthesize(text).unwrap();
            wav::duration(artifact.path()).unwrap()
        })
        .collect();

    assert_eq!(durations, vec![0.1, 0.4, 0.2]);
}

#[test]
fn submit_and_receive_pair_up() {
    let dir = tempfile::tempdir().unwrap();
    let worker = spawn(StubEngine::new(), &dir).unwrap();

    worker.submit(SynthesisRequest::new("abc")).unwrap();
    let artifact = worker.receive().unwrap();
    assert!((wav::duration(artifact.path()).unwrap() - 0.3).abs() < f64::EPSILON);
}

#[test]
fn failed_request_does_not_stop_the_worker() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new().failing_on("t2");
    let log = Arc::clone(&engine.log);
    let worker = spawn(engine, &dir).unwrap();

    assert!(worker.synthesize("t1").is_ok());
    let err = worker.synthesize("t2").err().unwrap();
    assert!(matches!(err, Error::Synthesis(_)));
    assert!(!err.is_fatal());
    assert!(worker.synthesize("t3").is_ok());

    let tts: Vec<String> = log
        .ops()
        .into_iter()
        .filter(|op| op.starts_with("tts:"))
        .collect();
    assert_eq!(tts, vec!["tts:3:t1", "tts:3:t2", "tts:3:t3"]);
}

#[test]
fn shared_handle_serves_concurrent_callers_one_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new().with_tts_delay(Duration::from_millis(5));
    let log = Arc::clone(&engine.log);
    let worker = spawn(engine, &dir).unwrap();

    // No lock around the handle: callers race on submit and receive directly
    std::thread::scope(|scope| {
        for caller in 1..=4u32 {
            let worker = &worker;
            scope.spawn(move || {
                let text = "x".repeat(usize::try_from(caller).unwrap());
                for _ in 0..3 {
                    let artifact = worker.synthesize(text.clone()).unwrap();
                    let secs = wav::duration(artifact.path()).unwrap();
                    // Each caller gets back the clip for its own text
                    assert!((secs - 0.1 * f64::from(caller)).abs() < 1e-9, "{caller}: {secs}");
                }
            });
        }
    });

    assert!(!log.overlapped());
    let tts = log.ops().iter().filter(|op| op.starts_with("tts:")).count();
    assert_eq!(tts, 12);
}

#[test]
fn every_engine_call_runs_on_the_worker_thread() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new();
    let log = Arc::clone(&engine.log);
    let worker = spawn(engine, &dir).unwrap();

    // Drive the worker from several different caller threads
    let worker = Arc::new(worker);
    for text in ["one", "two"] {
        let worker = Arc::clone(&worker);
        std::thread::spawn(move || worker.synthesize(text).map(drop))
            .join()
            .unwrap()
            .unwrap();
    }
    drop(worker);

    let calls = log.calls();
    let threads: HashSet<_> = calls.iter().map(|c| c.thread).collect();
    assert_eq!(threads.len(), 1, "{calls:?}");
    assert_ne!(calls[0].thread, std::thread::current().id());
    assert!(
        calls
            .iter()
            .all(|c| c.thread_name.as_deref() == Some(WORKER_THREAD_NAME))
    );
    assert_eq!(calls.last().unwrap().op, "finalize");
}

#[test]
fn handle_can_be_shared_between_threads() {
    fn shareable<T: Send + Sync>() {}
    shareable::<SynthesisWorker>();
}
