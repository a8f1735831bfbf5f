//! Scenario files replayed by `hlsync simulate`

use hlsync_core::{ElementEvent, EngineAudioTrack, EngineEvent, EngineLevel, MirrorConfig, PlayerCommand};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulated platform plus the steps to run against it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Mirror configuration; the CLI `--config`/`--source` flags take precedence
    pub config: Option<MirrorConfig>,
    /// Whether the engine provider reports support
    pub engine_supported: bool,
    /// Whether the element plays HLS natively
    pub native_hls: bool,
    /// Variants the engine exposes after parsing
    pub levels: Vec<EngineLevel>,
    /// Audio tracks the engine exposes after parsing
    pub audio_tracks: Vec<EngineAudioTrack>,
    /// Reject reason for fullscreen requests
    pub fullscreen_reject: Option<String>,
    /// Reject reason for element play requests
    pub play_reject: Option<String>,
    pub steps: Vec<Step>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            config: None,
            engine_supported: true,
            native_hls: false,
            levels: Vec::new(),
            audio_tracks: Vec::new(),
            fullscreen_reject: None,
            play_reject: None,
            steps: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read scenario {}: {}", path.display(), e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Event published by the engine
    Engine(EngineEvent),
    /// Event delivered straight to the mirror as if fired by the element
    Element(ElementEvent),
    /// User command
    Command(PlayerCommand),
    /// Replace the engine's level list
    SetLevels(Vec<EngineLevel>),
    /// Replace the engine's audio track list
    SetAudioTracks(Vec<EngineAudioTrack>),
    /// Have the element finish loading metadata
    LoadMetadata { duration: f64 },
    /// Advance element playback
    Advance { seconds: f64 },
}

impl Step {
    pub fn label(&self) -> String {
        match self {
            Step::Engine(event) => format!("engine {:?}", event),
            Step::Element(event) => format!("element {:?}", event),
            Step::Command(command) => format!("command {}", command.name()),
            Step::SetLevels(levels) => format!("set {} levels", levels.len()),
            Step::SetAudioTracks(tracks) => format!("set {} audio tracks", tracks.len()),
            Step::LoadMetadata { duration } => format!("load metadata ({}s)", duration),
            Step::Advance { seconds } => format!("advance {}s", seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_defaults() {
        let scenario = Scenario::from_json("{}").unwrap();
        assert!(scenario.engine_supported);
        assert!(!scenario.native_hls);
        assert!(scenario.steps.is_empty());
        assert!(scenario.config.is_none());
    }

    #[test]
    fn test_step_parsing() {
        let scenario = Scenario::from_json(
            r#"{
                "levels": [{ "height": 720, "bitrate": 2500000 }],
                "steps": [
                    { "engine": { "type": "manifest_parsed" } },
                    { "engine": { "type": "error", "error_type": "network", "details": "manifestLoadError", "fatal": true } },
                    { "element": { "type": "time_update", "current_time": 12.5 } },
                    { "command": { "type": "select_quality", "index": 0 } },
                    { "set_audio_tracks": [{ "name": "English", "lang": "en", "default": true }] },
                    { "advance": { "seconds": 2.0 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.levels, vec![EngineLevel::new(720, 2_500_000)]);
        assert_eq!(scenario.steps.len(), 6);
        assert!(matches!(scenario.steps[0], Step::Engine(EngineEvent::ManifestParsed)));
        assert!(matches!(&scenario.steps[1], Step::Engine(EngineEvent::Error(e)) if e.fatal));
        assert_eq!(scenario.steps[3].label(), "command select_quality");
        assert_eq!(scenario.steps[4].label(), "set 1 audio tracks");
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(Scenario::from_json(r#"{ "steps": [{ "rewind": {} }] }"#).is_err());
    }
}
