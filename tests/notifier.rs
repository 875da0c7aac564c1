//! End-to-end pipeline tests: channel → worker → device → acknowledgement

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use voicecast::channels::{Channel, IncomingText};
use voicecast::config::DeviceSettings;
use voicecast::synthesis::WorkerOptions;
use voicecast::{Notifier, PlaybackCoordinator, Result, SynthesisWorker};

mod common;
use common::{FakeConnector, Finish, StubEngine};

/// What a scripted channel was told
#[derive(Debug, Default)]
struct Transcript {
    connected: bool,
    disconnected: bool,
    acks: Vec<(String, std::result::Result<(), String>)>,
}

/// Channel replaying fixed lines, then either ending or going quiet
struct ScriptedChannel {
    lines: VecDeque<String>,
    hang_when_empty: bool,
    transcript: Arc<Mutex<Transcript>>,
}

impl ScriptedChannel {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(ToString::to_string).collect(),
            hang_when_empty: false,
            transcript: Arc::new(Mutex::new(Transcript::default())),
        }
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn connect(&mut self) -> Result<()> {
        self.transcript.lock().unwrap().connected = true;
        Ok(())
    }

    async fn next_text(&mut self) -> Result<Option<IncomingText>> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(IncomingText::plain(line))),
            None if self.hang_when_empty => std::future::pending().await,
            None => Ok(None),
        }
    }

    async fn acknowledge(&mut self, incoming: &IncomingText, outcome: &Result<()>) -> Result<()> {
        let outcome = outcome.as_ref().map(|_| ()).map_err(ToString::to_string);
        self.transcript
            .lock()
            .unwrap()
            .acks
            .push((incoming.text.clone(), outcome));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.transcript.lock().unwrap().disconnected = true;
        Ok(())
    }
}

fn notifier(engine: StubEngine, fake: &FakeConnector, dir: &tempfile::TempDir) -> Notifier {
    let options = WorkerOptions {
        initialize: voicecast::engine::InitializeOptions::default(),
        speaker_id: 1,
        tts: voicecast::engine::TtsOptions::default(),
        artifact_dir: Some(dir.path().to_path_buf()),
    };
    let worker = SynthesisWorker::spawn(move || Ok(engine), options).unwrap();
    let device = DeviceSettings {
        addr: "10.0.0.5".to_string(),
        volume: 0.6,
        max_duration: 5,
        ..DeviceSettings::default()
    };

    Notifier::new(worker, PlaybackCoordinator::new(fake.clone()), device)
}

#[tokio::test]
async fn speaks_each_line_and_acknowledges_it() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeConnector::new(0.2, Finish::After(Duration::from_millis(5)));
    let notifier = notifier(StubEngine::new().failing_on("bad"), &fake, &dir);

    let mut channel = ScriptedChannel::new(&["hello", "bad", "again"]);
    let transcript = Arc::clone(&channel.transcript);

    notifier
        .run_until(&mut channel, std::future::pending())
        .await
        .unwrap();

    let transcript = transcript.lock().unwrap();
    assert!(transcript.connected);
    assert!(transcript.disconnected);
    assert_eq!(transcript.acks.len(), 3);
    assert_eq!(transcript.acks[0], ("hello".to_string(), Ok(())));
    assert!(
        transcript.acks[1]
            .1
            .as_ref()
            .is_err_and(|e| e.starts_with("synthesis failed"))
    );
    assert_eq!(transcript.acks[2], ("again".to_string(), Ok(())));

    // Only the clips that synthesized reached the device
    let state = fake.snapshot();
    assert_eq!(state.loads.len(), 2);
    assert_eq!(state.volumes_set, vec![0.6, 0.2, 0.6, 0.2]);
}

#[tokio::test]
async fn clips_are_deleted_after_playback() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeConnector::new(0.5, Finish::After(Duration::from_millis(5)));
    let notifier = notifier(StubEngine::new(), &fake, &dir);

    notifier.speak("short").await.unwrap();

    let state = fake.snapshot();
    let played: &Path = &state.loads[0].path;
    assert!(played.starts_with(dir.path()));
    assert!(!played.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn clips_are_deleted_when_playback_fails() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeConnector::new(0.5, Finish::Never).rejecting_loads();
    let notifier = notifier(StubEngine::new(), &fake, &dir);

    let err = notifier.speak("rejected").await.unwrap_err();
    assert!(err.to_string().starts_with("load failed"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn shutdown_stops_a_waiting_channel() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeConnector::new(0.5, Finish::After(Duration::from_millis(5)));
    let notifier = notifier(StubEngine::new(), &fake, &dir);

    let mut channel = ScriptedChannel {
        hang_when_empty: true,
        ..ScriptedChannel::new(&["first"])
    };
    let transcript = Arc::clone(&channel.transcript);

    notifier
        .run_until(&mut channel, tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    let transcript = transcript.lock().unwrap();
    assert_eq!(transcript.acks.len(), 1);
    assert!(transcript.disconnected);
}
