//! Configuration management for voicecast
//!
//! Settings come from a directory of YAML files (see [`file`]) with
//! environment overrides on top: env > file > default.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{AccelerationMode, InitializeOptions, TtsOptions};
use crate::{Error, Result};

/// Default Open JTalk dictionary directory (relative to the working directory)
pub const DEFAULT_DICT_DIR: &str = "open_jtalk_dic_utf_8-1.11";

/// Default settings directory (relative to the working directory)
pub const DEFAULT_SETTINGS_DIR: &str = "settings";

/// Default Cast control port
pub const DEFAULT_CAST_PORT: u16 = 8009;

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Speech engine settings
    #[serde(rename = "Voicevox")]
    pub voicevox: EngineSettings,

    /// Target speaker settings
    #[serde(rename = "GoogleHome")]
    pub google_home: DeviceSettings,

    /// Slack bot settings
    #[serde(rename = "Slack")]
    pub slack: SlackSettings,
}

/// Speech engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Voice to synthesize with
    #[serde(rename = "SpeakerID")]
    pub speaker_id: u32,

    /// Open JTalk dictionary directory
    #[serde(rename = "OpenJtalkDictDir")]
    pub open_jtalk_dict_dir: PathBuf,

    /// Hardware acceleration
    #[serde(rename = "AccelerationMode")]
    pub acceleration_mode: AccelerationMode,

    /// Inference threads; 0 lets the engine decide
    #[serde(rename = "CpuNumThreads")]
    pub cpu_num_threads: u16,

    /// Load every model at initialization
    #[serde(rename = "LoadAllModels")]
    pub load_all_models: bool,

    /// Engine shared library; defaults to the platform name on the search path
    #[serde(rename = "LibraryPath")]
    pub library_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            speaker_id: 3,
            open_jtalk_dict_dir: PathBuf::from(DEFAULT_DICT_DIR),
            acceleration_mode: AccelerationMode::Auto,
            cpu_num_threads: 0,
            load_all_models: false,
            library_path: None,
        }
    }
}

impl EngineSettings {
    /// Options for engine initialization
    #[must_use]
    pub fn initialize_options(&self) -> InitializeOptions {
        InitializeOptions {
            acceleration_mode: self.acceleration_mode,
            cpu_num_threads: self.cpu_num_threads,
            load_all_models: self.load_all_models,
            open_jtalk_dict_dir: self.open_jtalk_dict_dir.clone(),
        }
    }

    /// Options for each synthesis call
    #[must_use]
    pub fn tts_options(&self) -> TtsOptions {
        TtsOptions::default()
    }
}

/// Target cast device
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Friendly device name (informational)
    #[serde(rename = "DeviceName")]
    pub device_name: String,

    /// Device model (informational)
    #[serde(rename = "Device")]
    pub device: String,

    /// Device UUID (informational)
    #[serde(rename = "UUID")]
    pub uuid: String,

    /// Network interface to connect from; empty means any
    #[serde(rename = "Iface")]
    pub iface: String,

    /// Device address
    #[serde(rename = "Addr")]
    pub addr: String,

    /// Device control port
    #[serde(rename = "Port")]
    pub port: u16,

    /// Volume to speak at (0.0 to 1.0)
    #[serde(rename = "Volume")]
    pub volume: f32,

    /// Leave the media receiver running when the session closes
    #[serde(rename = "Detach")]
    pub detach: bool,

    /// Drop the connection without closing the session at all
    #[serde(rename = "ForceDetach")]
    pub force_detach: bool,

    /// Longest allowed playback in seconds before it is interrupted
    #[serde(rename = "MaxDuration")]
    pub max_duration: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_name: String::new(),
            device: String::new(),
            uuid: String::new(),
            iface: String::new(),
            addr: String::new(),
            port: DEFAULT_CAST_PORT,
            volume: 0.5,
            detach: false,
            force_detach: false,
            max_duration: 60,
        }
    }
}

impl DeviceSettings {
    /// Interface name to bind to, if one is configured
    #[must_use]
    pub fn iface(&self) -> Option<&str> {
        let iface = self.iface.trim();
        (!iface.is_empty()).then_some(iface)
    }

    /// Playback deadline
    #[must_use]
    pub const fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration)
    }

    /// Check the settings needed to reach and drive the device
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(Error::Config("GoogleHome.Addr is required".to_string()));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "GoogleHome.Volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        if self.max_duration == 0 {
            return Err(Error::Config(
                "GoogleHome.MaxDuration must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Slack bot credentials
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlackSettings {
    /// Bot token (`xoxb-...`)
    #[serde(rename = "Token")]
    pub token: String,

    /// App-level token for Socket Mode (`xapp-...`)
    #[serde(rename = "AppLevelToken")]
    pub app_level_token: String,

    /// Emoji shown on replies, e.g. `:speaker:`
    #[serde(rename = "Icon")]
    pub icon: String,
}

impl SlackSettings {
    /// Check that both tokens are present
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the missing token
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("Slack.Token is required".to_string()));
        }
        if self.app_level_token.trim().is_empty() {
            return Err(Error::Config("Slack.AppLevelToken is required".to_string()));
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings from `dir` (or the default location) and the environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the directory is missing, a file is
    /// malformed, or an override cannot be parsed
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let dir = dir.map_or_else(default_settings_dir, Path::to_path_buf);
        tracing::debug!(dir = %dir.display(), "loading settings");

        let mut settings = Self::from_dir(&dir)?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;

        Ok(settings)
    }

    /// Load settings from the YAML files in `dir`, without env overrides
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the directory is missing or a file is malformed
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let merged = file::load_settings_dir(dir)?;
        serde_yaml::from_value(merged)
            .map_err(|e| Error::Config(format!("invalid settings in {}: {e}", dir.display())))
    }

    /// Apply overrides from `lookup` (normally the process environment)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric override does not parse
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(speaker) = lookup("VOICECAST_SPEAKER_ID") {
            self.voicevox.speaker_id = parse_override("VOICECAST_SPEAKER_ID", &speaker)?;
        }
        if let Some(library) = lookup("VOICECAST_ENGINE_LIBRARY") {
            self.voicevox.library_path = Some(PathBuf::from(library));
        }
        if let Some(addr) = lookup("VOICECAST_DEVICE_ADDR") {
            self.google_home.addr = addr;
        }
        if let Some(port) = lookup("VOICECAST_DEVICE_PORT") {
            self.google_home.port = parse_override("VOICECAST_DEVICE_PORT", &port)?;
        }
        if let Some(iface) = lookup("VOICECAST_IFACE") {
            self.google_home.iface = iface;
        }
        if let Some(token) = lookup("SLACK_BOT_TOKEN") {
            self.slack.token = token;
        }
        if let Some(token) = lookup("SLACK_APP_TOKEN") {
            self.slack.app_level_token = token;
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value}: {e}")))
}

/// `./settings` when present, otherwise `~/.config/voicecast/settings`
#[must_use]
pub fn default_settings_dir() -> PathBuf {
    let local = PathBuf::from(DEFAULT_SETTINGS_DIR);
    if local.is_dir() {
        return local;
    }

    directories::BaseDirs::new().map_or(local, |d| {
        d.config_dir().join("voicecast").join(DEFAULT_SETTINGS_DIR)
    })
}
