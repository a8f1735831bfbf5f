//! User commands forwarded by the mirror

use serde::{Deserialize, Serialize};
use url::Url;

/// User intent, as issued by controls, keyboard handlers or scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    TogglePlay,
    SelectQuality { index: i32 },
    SelectAudioTrack { id: i32 },
    Seek { time: f64 },
    SetVolume { volume: f64 },
    ToggleMute,
    ToggleFullscreen,
    ChangeSource { url: Url },
}

impl PlayerCommand {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::TogglePlay => "toggle_play",
            PlayerCommand::SelectQuality { .. } => "select_quality",
            PlayerCommand::SelectAudioTrack { .. } => "select_audio_track",
            PlayerCommand::Seek { .. } => "seek",
            PlayerCommand::SetVolume { .. } => "set_volume",
            PlayerCommand::ToggleMute => "toggle_mute",
            PlayerCommand::ToggleFullscreen => "toggle_fullscreen",
            PlayerCommand::ChangeSource { .. } => "change_source",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json() {
        let cmd: PlayerCommand = serde_json::from_str(r#"{ "type": "select_quality", "index": 2 }"#).unwrap();
        assert_eq!(cmd, PlayerCommand::SelectQuality { index: 2 });
        assert_eq!(cmd.name(), "select_quality");

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{ "type": "change_source", "url": "https://cdn.example.com/b.m3u8" }"#).unwrap();
        assert_eq!(cmd.name(), "change_source");
    }
}
