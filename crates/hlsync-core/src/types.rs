//! Core types for the playback state mirror

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `selected_quality_index` value meaning "let the engine choose"
pub const AUTO_QUALITY: i32 = -1;

/// `selected_audio_track_id` value meaning "no track selected"
pub const NO_AUDIO_TRACK: i32 = -1;

/// MIME type probed on the native element when no engine is available
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Unique identifier for a mirror instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MirrorId(pub Uuid);

impl MirrorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MirrorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MirrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Engine-side data
// =============================================================================

/// A quality variant as reported by the media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLevel {
    /// Vertical resolution in pixels
    pub height: u32,
    /// Bitrate in bits per second
    pub bitrate: u64,
}

impl EngineLevel {
    pub fn new(height: u32, bitrate: u64) -> Self {
        Self { height, bitrate }
    }
}

/// An audio track as reported by the media engine. Every field is optional
/// upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineAudioTrack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub default: Option<bool>,
}

impl EngineAudioTrack {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            lang: Some(lang.into()),
            default: None,
        }
    }

    /// Flag this track as the default one
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.default = Some(is_default);
        self
    }
}

/// Classification of an engine-reported stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamErrorType {
    Network,
    Media,
    Mux,
    KeySystem,
    Other,
}

impl std::fmt::Display for StreamErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamErrorType::Network => write!(f, "networkError"),
            StreamErrorType::Media => write!(f, "mediaError"),
            StreamErrorType::Mux => write!(f, "muxError"),
            StreamErrorType::KeySystem => write!(f, "keySystemError"),
            StreamErrorType::Other => write!(f, "otherError"),
        }
    }
}

/// Payload of an engine error event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamError {
    #[serde(default = "default_error_type")]
    pub error_type: StreamErrorType,
    /// Engine-provided detail code, e.g. `bufferStalledError`
    pub details: String,
    /// Only fatal errors are surfaced to the user
    #[serde(default)]
    pub fatal: bool,
}

fn default_error_type() -> StreamErrorType {
    StreamErrorType::Other
}

impl StreamError {
    pub fn fatal(error_type: StreamErrorType, details: impl Into<String>) -> Self {
        Self {
            error_type,
            details: details.into(),
            fatal: true,
        }
    }

    pub fn non_fatal(error_type: StreamErrorType, details: impl Into<String>) -> Self {
        Self {
            error_type,
            details: details.into(),
            fatal: false,
        }
    }

    /// Message shown to the user for a fatal error
    pub fn user_message(&self) -> String {
        format!("HLS Error: {}", self.details)
    }
}

/// A stream error kept in the mirror's diagnostics history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamErrorRecord {
    pub at: DateTime<Utc>,
    pub error: StreamError,
}

// =============================================================================
// Mirror-side data
// =============================================================================

/// A selectable quality variant, rebuilt from the engine's levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    pub height: u32,
    pub bitrate: u64,
    /// Display name, e.g. `720p (2500kbps)`
    pub name: String,
    /// Engine variant index
    pub index: usize,
}

impl QualityLevel {
    pub fn from_engine(index: usize, level: &EngineLevel) -> Self {
        Self {
            height: level.height,
            bitrate: level.bitrate,
            name: quality_name(level.height, level.bitrate),
            index,
        }
    }
}

/// Display name of a quality variant; kbps is rounded half up
pub fn quality_name(height: u32, bitrate: u64) -> String {
    format!("{}p ({}kbps)", height, (bitrate + 500) / 1000)
}

/// A selectable audio track, rebuilt from the engine's tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub id: i32,
    pub name: String,
    pub lang: String,
    pub is_default: bool,
}

impl AudioTrack {
    pub fn from_engine(index: usize, track: &EngineAudioTrack) -> Self {
        let name = match track.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Track {}", index + 1),
        };
        let lang = match track.lang.as_deref() {
            Some(lang) if !lang.is_empty() => lang.to_string(),
            _ => "unknown".to_string(),
        };

        Self {
            id: index as i32,
            name,
            lang,
            is_default: track.default.unwrap_or(false),
        }
    }
}

/// How the mirror ended up attached to its media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    /// `initialize` has not run yet
    Pending,
    /// Playback driven by a media engine instance
    Engine,
    /// The element plays the stream natively
    Native,
    /// Neither path is available; the snapshot carries an error
    Unsupported,
    /// Torn down; no further updates
    Released,
}

impl std::fmt::Display for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Pending => write!(f, "pending"),
            Attachment::Engine => write!(f, "engine"),
            Attachment::Native => write!(f, "native"),
            Attachment::Unsupported => write!(f, "unsupported"),
            Attachment::Released => write!(f, "released"),
        }
    }
}

/// UI-facing playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub is_loading: bool,
    pub has_error: bool,
    pub error_message: String,
    pub is_playing: bool,
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    /// 0.0 - 1.0
    pub volume: f64,
    pub is_muted: bool,
    pub is_fullscreen: bool,
    /// -1 = automatic
    pub selected_quality_index: i32,
    /// -1 = none
    pub selected_audio_track_id: i32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            is_loading: true,
            has_error: false,
            error_message: String::new(),
            is_playing: false,
            current_time_seconds: 0.0,
            duration_seconds: 0.0,
            volume: 1.0,
            is_muted: false,
            is_fullscreen: false,
            selected_quality_index: AUTO_QUALITY,
            selected_audio_track_id: NO_AUDIO_TRACK,
        }
    }
}

impl PlaybackSnapshot {
    /// Current position formatted as `m:ss`
    pub fn current_time_label(&self) -> String {
        format_time(self.current_time_seconds)
    }

    /// Duration formatted as `m:ss`
    pub fn duration_label(&self) -> String {
        format_time(self.duration_seconds)
    }
}

/// Everything a UI needs to render the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub snapshot: PlaybackSnapshot,
    pub quality_levels: Vec<QualityLevel>,
    pub audio_tracks: Vec<AudioTrack>,
}

/// Format seconds as `m:ss`. Non-finite or negative input renders `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_name() {
        assert_eq!(quality_name(720, 2_500_000), "720p (2500kbps)");
        assert_eq!(quality_name(1080, 4_999_499), "1080p (4999kbps)");
        assert_eq!(quality_name(1080, 4_999_500), "1080p (5000kbps)");
        assert_eq!(quality_name(240, 0), "240p (0kbps)");
    }

    #[test]
    fn test_audio_track_fallbacks() {
        let track = AudioTrack::from_engine(2, &EngineAudioTrack::default());
        assert_eq!(track.id, 2);
        assert_eq!(track.name, "Track 3");
        assert_eq!(track.lang, "unknown");
        assert!(!track.is_default);

        let named = AudioTrack::from_engine(0, &EngineAudioTrack::new("English", "en").with_default(true));
        assert_eq!(named.name, "English");
        assert_eq!(named.lang, "en");
        assert!(named.is_default);
    }

    #[test]
    fn test_empty_strings_fall_back() {
        let track = EngineAudioTrack {
            name: Some(String::new()),
            lang: Some(String::new()),
            default: Some(false),
        };
        let track = AudioTrack::from_engine(0, &track);
        assert_eq!(track.name, "Track 1");
        assert_eq!(track.lang, "unknown");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.9), "0:09");
        assert_eq!(format_time(61.2), "1:01");
        assert_eq!(format_time(734.0), "12:14");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = PlaybackSnapshot::default();
        assert!(snapshot.is_loading);
        assert!(!snapshot.has_error);
        assert_eq!(snapshot.volume, 1.0);
        assert_eq!(snapshot.selected_quality_index, AUTO_QUALITY);
        assert_eq!(snapshot.selected_audio_track_id, NO_AUDIO_TRACK);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_string(&PlaybackSnapshot::default()).unwrap();
        assert!(json.contains("\"isLoading\":true"));
        assert!(json.contains("\"selectedQualityIndex\":-1"));
    }

    #[test]
    fn test_stream_error_message() {
        let err = StreamError::fatal(StreamErrorType::Media, "bufferStalledError");
        assert_eq!(err.user_message(), "HLS Error: bufferStalledError");
        assert_eq!(StreamErrorType::Network.to_string(), "networkError");
    }
}
