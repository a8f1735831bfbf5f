//! Mirror configuration

use crate::{types::HLS_MIME_TYPE, Error, Result, AUTO_QUALITY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Stream loaded when no source is configured
pub const DEFAULT_SOURCE: &str =
    "https://demo.unified-streaming.com/k8s/features/stable/video/tears-of-steel/tears-of-steel.ism/.m3u8";

/// Configuration handed to the media engine on construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run demuxing in a worker
    pub enable_worker: bool,
    /// Initial level index (-1 = automatic)
    pub start_level: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_worker: false,
            start_level: AUTO_QUALITY,
        }
    }
}

/// Playback mirror configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Stream loaded on initialization
    pub source: Url,
    /// Engine construction options
    pub engine: EngineConfig,
    /// MIME type probed for native playback
    pub native_mime_type: String,
    /// Maximum stream errors kept for diagnostics
    pub max_error_history: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            engine: EngineConfig::default(),
            native_mime_type: HLS_MIME_TYPE.to_string(),
            max_error_history: 50,
        }
    }
}

fn default_source() -> Url {
    Url::parse(DEFAULT_SOURCE).expect("DEFAULT_SOURCE is a valid URL")
}

impl MirrorConfig {
    /// Create a config for the given stream
    pub fn with_source(source: Url) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: MirrorConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the mirror cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.native_mime_type.trim().is_empty() {
            return Err(Error::InvalidConfig("native_mime_type must not be empty".into()));
        }
        if self.max_error_history == 0 {
            return Err(Error::InvalidConfig("max_error_history must be at least 1".into()));
        }
        if self.engine.start_level < AUTO_QUALITY {
            return Err(Error::InvalidConfig(format!(
                "engine.start_level must be -1 or a level index, got {}",
                self.engine.start_level
            )));
        }
        Ok(())
    }
}
