//! Shared test utilities

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use async_trait::async_trait;
use voicecast::engine::{InitializeOptions, SpeechEngine, TtsOptions};
use voicecast::playback::{CastConnector, CastSession, DeviceTarget, MediaLoad};
use voicecast::{Error, PlaybackError, Result};

/// Sample rate of stub clips; one character of text lasts 0.1s
pub const STUB_SAMPLE_RATE: u32 = 1_000;

/// Mono 16-bit WAV holding `samples` silent samples
#[must_use]
pub fn wav_bytes(samples: u32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
    for _ in 0..samples {
        writer.write_sample(0i16).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    cursor.into_inner()
}

/// One call made on a [`StubEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub op: String,
    pub thread: ThreadId,
    pub thread_name: Option<String>,
}

/// Everything a [`StubEngine`] saw, shared with the test
#[derive(Debug, Default)]
pub struct EngineLog {
    calls: Mutex<Vec<EngineCall>>,
    busy: AtomicBool,
    overlapped: AtomicBool,
}

impl EngineLog {
    fn record(&self, op: impl Into<String>) {
        let current = std::thread::current();
        self.calls.lock().unwrap().push(EngineCall {
            op: op.into(),
            thread: current.id(),
            thread_name: current.name().map(str::to_string),
        });
    }

    /// Mark a call in flight; a second concurrent call panics
    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
            panic!("engine entered while another call was in flight");
        }
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn ops(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    /// Whether two engine calls were ever in flight at once
    #[must_use]
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

/// In-process engine that records every call
///
/// Clips are [`STUB_SAMPLE_RATE`] WAVs with 100 samples per character.
#[derive(Debug, Clone)]
pub struct StubEngine {
    pub log: Arc<EngineLog>,
    pub failing_texts: Vec<String>,
    pub fail_initialize: bool,
    pub fail_load_model: bool,
    pub tts_delay: Duration,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self {
            log: Arc::new(EngineLog::default()),
            failing_texts: Vec::new(),
            fail_initialize: false,
            fail_load_model: false,
            tts_delay: Duration::ZERO,
        }
    }
}

impl StubEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing_texts.push(text.to_string());
        self
    }

    #[must_use]
    pub fn with_tts_delay(mut self, delay: Duration) -> Self {
        self.tts_delay = delay;
        self
    }
}

impl SpeechEngine for StubEngine {
    fn initialize(&mut self, _options: &InitializeOptions) -> Result<()> {
        self.log.record("initialize");
        if self.fail_initialize {
            return Err(Error::EngineInit("dictionary not found".to_string()));
        }
        Ok(())
    }

    fn load_model(&mut self, speaker_id: u32) -> Result<()> {
        self.log.record(format!("load_model:{speaker_id}"));
        if self.fail_load_model {
            return Err(Error::ModelLoad(format!("speaker {speaker_id} unknown")));
        }
        Ok(())
    }

    fn tts(&mut self, text: &str, speaker_id: u32, _options: TtsOptions) -> Result<Vec<u8>> {
        self.log.enter();
        self.log.record(format!("tts:{speaker_id}:{text}"));
        if !self.tts_delay.is_zero() {
            std::thread::sleep(self.tts_delay);
        }
        self.log.leave();

        if self.failing_texts.iter().any(|t| t == text) {
            return Err(Error::Synthesis(format!("cannot read {text:?}")));
        }

        let chars = u32::try_from(text.chars().count()).unwrap();
        Ok(wav_bytes(chars * 100, STUB_SAMPLE_RATE))
    }

    fn finalize(&mut self) {
        self.log.record("finalize");
    }
}

/// How a fake device reports the end of playback
#[derive(Debug, Clone, Copy)]
pub enum Finish {
    /// Never reports the item finished
    Never,
    /// Reports finished after the delay
    After(Duration),
    /// The status stream fails
    Error,
}

/// What a fake device saw
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub volume: f32,
    pub volumes_set: Vec<f32>,
    pub loads: Vec<MediaLoad>,
    pub targets: Vec<DeviceTarget>,
    pub stops: usize,
    pub sessions_closed: usize,
}

/// Connector opening sessions on a scripted device
#[derive(Debug, Clone)]
pub struct FakeConnector {
    pub state: Arc<Mutex<DeviceState>>,
    pub finish: Finish,
    pub reject_load: bool,
}

impl FakeConnector {
    #[must_use]
    pub fn new(initial_volume: f32, finish: Finish) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                volume: initial_volume,
                ..DeviceState::default()
            })),
            finish,
            reject_load: false,
        }
    }

    #[must_use]
    pub fn rejecting_loads(mut self) -> Self {
        self.reject_load = true;
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl CastConnector for FakeConnector {
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn CastSession>> {
        self.state.lock().unwrap().targets.push(target.clone());
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            finish: self.finish,
            reject_load: self.reject_load,
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<DeviceState>>,
    finish: Finish,
    reject_load: bool,
}

#[async_trait]
impl CastSession for FakeSession {
    async fn volume(&mut self) -> Result<f32> {
        Ok(self.state.lock().unwrap().volume)
    }

    async fn set_volume(&mut self, level: f32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.volume = level;
        state.volumes_set.push(level);
        Ok(())
    }

    async fn load_media(&mut self, media: &MediaLoad) -> Result<()> {
        self.state.lock().unwrap().loads.push(media.clone());
        if self.reject_load {
            return Err(PlaybackError::LoadFailed("LOAD_FAILED".to_string()).into());
        }
        Ok(())
    }

    async fn stop_media(&mut self) -> Result<()> {
        self.state.lock().unwrap().stops += 1;
        Ok(())
    }

    async fn wait_media_finished(&mut self) -> Result<()> {
        match self.finish {
            Finish::Never => std::future::pending().await,
            Finish::After(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Finish::Error => Err(Error::Connection("device closed the connection".to_string())),
        }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.lock().unwrap().sessions_closed += 1;
    }
}
