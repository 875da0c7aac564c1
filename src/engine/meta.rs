//! Speaker and device descriptions reported by the engine

use serde::Deserialize;

/// One voice as listed by `voicevox_get_metas_json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeakerMeta {
    pub name: String,
    #[serde(default)]
    pub styles: Vec<StyleMeta>,
    #[serde(default)]
    pub speaker_uuid: String,
    #[serde(default)]
    pub version: String,
}

/// A speaking style; `id` is the speaker id passed to synthesis
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleMeta {
    pub name: String,
    pub id: u32,
}

impl SpeakerMeta {
    /// The style with this speaker id, if the voice has one
    #[must_use]
    pub fn style(&self, speaker_id: u32) -> Option<&StyleMeta> {
        self.styles.iter().find(|s| s.id == speaker_id)
    }
}

/// Find the voice and style behind a speaker id
#[must_use]
pub fn find_style(speakers: &[SpeakerMeta], speaker_id: u32) -> Option<(&SpeakerMeta, &StyleMeta)> {
    speakers
        .iter()
        .find_map(|speaker| speaker.style(speaker_id).map(|style| (speaker, style)))
}

/// Inference devices the engine build can use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupportedDevices {
    pub cpu: bool,
    pub cuda: bool,
    pub dml: bool,
}

impl std::fmt::Display for SupportedDevices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = [("cpu", self.cpu), ("cuda", self.cuda), ("dml", self.dml)]
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect();

        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}
