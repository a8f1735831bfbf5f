//! Error types for hlsync core

use thiserror::Error;

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Mirror error types
///
/// Stream failures reported by the media engine are *not* errors in this
/// sense: they are data (`StreamError`) that land in the playback snapshot.
/// This enum covers failures of imperative calls into collaborators.
#[derive(Error, Debug)]
pub enum Error {
    // Engine errors
    #[error("Media engine rejected command: {0}")]
    Engine(String),

    #[error("Quality level {index} out of range ({available} available)")]
    LevelOutOfRange { index: i32, available: usize },

    #[error("Audio track {id} out of range ({available} available)")]
    AudioTrackOutOfRange { id: i32, available: usize },

    // Native element errors
    #[error("Media element rejected playback: {0}")]
    PlaybackRejected(String),

    #[error("Media element unavailable: {0}")]
    ElementUnavailable(String),

    // Platform errors
    #[error("Fullscreen request rejected: {0}")]
    FullscreenRejected(String),

    #[error("Fullscreen not supported")]
    FullscreenUnsupported,

    // Lifecycle errors
    #[error("Mirror already initialized")]
    AlreadyInitialized,

    #[error("Mirror has been torn down")]
    Released,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// Returns true if the caller may retry the same operation later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PlaybackRejected(_) | Error::FullscreenRejected(_) | Error::ElementUnavailable(_)
        )
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Engine(_) => "ENGINE",
            Error::LevelOutOfRange { .. } => "LEVEL_RANGE",
            Error::AudioTrackOutOfRange { .. } => "AUDIO_TRACK_RANGE",
            Error::PlaybackRejected(_) => "PLAYBACK_REJECTED",
            Error::ElementUnavailable(_) => "ELEMENT_UNAVAILABLE",
            Error::FullscreenRejected(_) => "FULLSCREEN_REJECTED",
            Error::FullscreenUnsupported => "FULLSCREEN_UNSUPPORTED",
            Error::AlreadyInitialized => "ALREADY_INITIALIZED",
            Error::Released => "RELEASED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::engine("boom").error_code(), "ENGINE");
        assert_eq!(
            Error::LevelOutOfRange { index: 7, available: 3 }.error_code(),
            "LEVEL_RANGE"
        );
        assert_eq!(Error::Released.error_code(), "RELEASED");
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::FullscreenRejected("denied".into()).is_recoverable());
        assert!(!Error::AlreadyInitialized.is_recoverable());
        assert!(!Error::FullscreenUnsupported.is_recoverable());
    }

    #[test]
    fn test_display_includes_range() {
        let err = Error::AudioTrackOutOfRange { id: 4, available: 2 };
        assert_eq!(err.to_string(), "Audio track 4 out of range (2 available)");
    }
}
