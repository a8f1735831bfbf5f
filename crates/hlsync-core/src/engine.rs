//! Media engine seam
//!
//! The adaptive-streaming engine (manifest parsing, segment fetching, bitrate
//! switching) lives outside this crate. The mirror only needs the small
//! surface below: construct, load, attach, listen, read levels/tracks,
//! switch level/track, destroy.

use crate::{config::EngineConfig, element::SharedElement, events::EventSink, EngineAudioTrack, EngineLevel, Result};
use url::Url;

/// A live engine instance owned by one mirror
pub trait MediaEngine: Send {
    /// Start loading a manifest. Completion is reported via events.
    fn load_source(&mut self, url: &Url);

    /// Bind the engine to the element it feeds
    fn attach_media(&mut self, element: SharedElement);

    /// Register the listener that receives engine events
    fn subscribe(&mut self, sink: EventSink);

    /// Quality variants in engine order
    fn levels(&self) -> Vec<EngineLevel>;

    /// Audio tracks in engine order
    fn audio_tracks(&self) -> Vec<EngineAudioTrack>;

    /// Force a variant (-1 = automatic). Range checking is the engine's job.
    fn set_current_level(&mut self, index: i32) -> Result<()>;

    /// Switch audio track by id
    fn set_audio_track(&mut self, id: i32) -> Result<()>;

    /// Stop all internal activity and drop listeners
    fn destroy(&mut self);
}

/// Capability check plus constructor for a [`MediaEngine`]
pub trait EngineProvider: Send + Sync {
    /// Whether the runtime can host the engine at all
    fn is_supported(&self) -> bool;

    /// Construct a fresh engine instance
    fn create(&self, config: &EngineConfig) -> Box<dyn MediaEngine>;
}
