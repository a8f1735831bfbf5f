//! In-memory engine, element and fullscreen implementations
//!
//! Used by the test suite, the benchmarks and `hlsync simulate`. Each type is
//! a cheap cloneable handle over shared state so a caller can keep scripting
//! and inspecting a collaborator after handing it to a mirror.

use crate::{
    config::EngineConfig,
    element::{MediaElement, SharedElement},
    engine::{EngineProvider, MediaEngine},
    events::{ElementEvent, EngineEvent, EventSink, MirrorEvent},
    fullscreen::FullscreenCapability,
    EngineAudioTrack, EngineLevel, Error, Result, StreamError, StreamErrorType, AUTO_QUALITY,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use url::Url;

fn guard<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn emit(sink: &Option<EventSink>, event: impl Into<MirrorEvent>) {
    if let Some(sink) = sink {
        sink.emit(event);
    }
}

// =============================================================================
// Engine
// =============================================================================

struct EngineState {
    levels: Vec<EngineLevel>,
    audio_tracks: Vec<EngineAudioTrack>,
    current_level: i32,
    audio_track: i32,
    loaded_sources: Vec<Url>,
    media: Option<SharedElement>,
    sink: Option<EventSink>,
    config: Option<EngineConfig>,
    destroyed: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            audio_tracks: Vec::new(),
            current_level: AUTO_QUALITY,
            audio_track: -1,
            loaded_sources: Vec::new(),
            media: None,
            sink: None,
            config: None,
            destroyed: false,
        }
    }
}

/// Scripting and inspection handle for a [`SimulatedEngine`]
#[derive(Clone, Default)]
pub struct SimEngineHandle {
    state: Arc<Mutex<EngineState>>,
}

impl SimEngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the variant list the engine reports
    pub fn set_levels(&self, levels: Vec<EngineLevel>) {
        guard(&self.state).levels = levels;
    }

    /// Replace the audio track list the engine reports
    pub fn set_audio_tracks(&self, tracks: Vec<EngineAudioTrack>) {
        guard(&self.state).audio_tracks = tracks;
    }

    /// Fire an engine event. Returns false when nobody is listening.
    pub fn emit(&self, event: EngineEvent) -> bool {
        let state = guard(&self.state);
        match &state.sink {
            Some(sink) if !state.destroyed => sink.emit(event),
            _ => false,
        }
    }

    pub fn manifest_parsed(&self) -> bool {
        self.emit(EngineEvent::ManifestParsed)
    }

    pub fn level_loaded(&self, level: usize) -> bool {
        self.emit(EngineEvent::LevelLoaded { level })
    }

    pub fn audio_tracks_updated(&self) -> bool {
        self.emit(EngineEvent::AudioTracksUpdated)
    }

    pub fn error(&self, error_type: StreamErrorType, details: &str, fatal: bool) -> bool {
        self.emit(EngineEvent::Error(StreamError {
            error_type,
            details: details.to_string(),
            fatal,
        }))
    }

    pub fn loaded_sources(&self) -> Vec<Url> {
        guard(&self.state).loaded_sources.clone()
    }

    pub fn current_level(&self) -> i32 {
        guard(&self.state).current_level
    }

    pub fn audio_track(&self) -> i32 {
        guard(&self.state).audio_track
    }

    pub fn is_attached(&self) -> bool {
        guard(&self.state).media.is_some()
    }

    pub fn is_subscribed(&self) -> bool {
        guard(&self.state).sink.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        guard(&self.state).destroyed
    }

    /// Config the engine was constructed with
    pub fn config(&self) -> Option<EngineConfig> {
        guard(&self.state).config.clone()
    }
}

/// A [`MediaEngine`] whose levels, tracks and events are scripted through a
/// [`SimEngineHandle`]
pub struct SimulatedEngine {
    handle: SimEngineHandle,
}

impl SimulatedEngine {
    pub fn new(handle: SimEngineHandle) -> Self {
        Self { handle }
    }
}

impl MediaEngine for SimulatedEngine {
    fn load_source(&mut self, url: &Url) {
        debug!(url = %url, "Simulated engine loading source");
        guard(&self.handle.state).loaded_sources.push(url.clone());
    }

    fn attach_media(&mut self, element: SharedElement) {
        guard(&self.handle.state).media = Some(element);
    }

    fn subscribe(&mut self, sink: EventSink) {
        guard(&self.handle.state).sink = Some(sink);
    }

    fn levels(&self) -> Vec<EngineLevel> {
        guard(&self.handle.state).levels.clone()
    }

    fn audio_tracks(&self) -> Vec<EngineAudioTrack> {
        guard(&self.handle.state).audio_tracks.clone()
    }

    fn set_current_level(&mut self, index: i32) -> Result<()> {
        let mut state = guard(&self.handle.state);
        if state.destroyed {
            return Err(Error::engine("engine destroyed"));
        }
        let available = state.levels.len();
        if index < AUTO_QUALITY || (index >= 0 && index as usize >= available) {
            return Err(Error::LevelOutOfRange { index, available });
        }
        state.current_level = index;
        Ok(())
    }

    fn set_audio_track(&mut self, id: i32) -> Result<()> {
        let mut state = guard(&self.handle.state);
        if state.destroyed {
            return Err(Error::engine("engine destroyed"));
        }
        let available = state.audio_tracks.len();
        if id < 0 || id as usize >= available {
            return Err(Error::AudioTrackOutOfRange { id, available });
        }
        state.audio_track = id;
        Ok(())
    }

    fn destroy(&mut self) {
        let mut state = guard(&self.handle.state);
        state.destroyed = true;
        state.sink = None;
        state.media = None;
    }
}

/// Constructs [`SimulatedEngine`]s that all report through one handle
pub struct SimulatedProvider {
    supported: bool,
    handle: SimEngineHandle,
}

impl SimulatedProvider {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            handle: SimEngineHandle::new(),
        }
    }

    pub fn handle(&self) -> SimEngineHandle {
        self.handle.clone()
    }
}

impl EngineProvider for SimulatedProvider {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, config: &EngineConfig) -> Box<dyn MediaEngine> {
        {
            // Scripted levels and tracks survive; everything else starts fresh.
            let mut state = guard(&self.handle.state);
            let levels = std::mem::take(&mut state.levels);
            let audio_tracks = std::mem::take(&mut state.audio_tracks);
            *state = EngineState {
                levels,
                audio_tracks,
                current_level: config.start_level,
                config: Some(config.clone()),
                ..Default::default()
            };
        }
        Box::new(SimulatedEngine::new(self.handle.clone()))
    }
}

// =============================================================================
// Element
// =============================================================================

struct ElementState {
    src: Option<Url>,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    paused: bool,
    native_types: Vec<String>,
    reject_play: Option<String>,
    sink: Option<EventSink>,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            src: None,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            paused: true,
            native_types: Vec::new(),
            reject_play: None,
            sink: None,
        }
    }
}

/// A media element that behaves like a `<video>` tag: it clamps positions
/// and volume, and reports state changes as events
#[derive(Clone, Default)]
pub struct SimulatedElement {
    state: Arc<Mutex<ElementState>>,
}

impl SimulatedElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare native support for a MIME type
    pub fn with_native_support(self, mime: &str) -> Self {
        guard(&self.state).native_types.push(mime.to_ascii_lowercase());
        self
    }

    /// Make every `play()` call fail, or stop failing with `None`
    pub fn set_reject_play(&self, reason: Option<String>) {
        guard(&self.state).reject_play = reason;
    }

    /// Metadata arrived: duration is now known
    pub fn load_metadata(&self, duration: f64) {
        let mut state = guard(&self.state);
        state.duration = duration;
        emit(&state.sink, ElementEvent::LoadedMetadata { duration });
    }

    /// Playback advanced by `seconds`
    pub fn advance(&self, seconds: f64) {
        let mut state = guard(&self.state);
        let mut next = state.current_time + seconds;
        if state.duration > 0.0 {
            next = next.min(state.duration);
        }
        state.current_time = next;
        emit(&state.sink, ElementEvent::TimeUpdate { current_time: next });
    }

    pub fn is_paused(&self) -> bool {
        guard(&self.state).paused
    }

    pub fn is_subscribed(&self) -> bool {
        guard(&self.state).sink.is_some()
    }
}

impl MediaElement for SimulatedElement {
    fn src(&self) -> Option<Url> {
        guard(&self.state).src.clone()
    }

    fn set_src(&mut self, url: &Url) {
        let mut state = guard(&self.state);
        state.src = Some(url.clone());
        state.current_time = 0.0;
        state.duration = 0.0;
    }

    fn current_time(&self) -> f64 {
        guard(&self.state).current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = guard(&self.state);
        let mut position = seconds.max(0.0);
        if state.duration > 0.0 {
            position = position.min(state.duration);
        }
        state.current_time = position;
        emit(&state.sink, ElementEvent::TimeUpdate { current_time: position });
    }

    fn duration(&self) -> f64 {
        guard(&self.state).duration
    }

    fn volume(&self) -> f64 {
        guard(&self.state).volume
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = guard(&self.state);
        state.volume = volume.clamp(0.0, 1.0);
        let (volume, muted) = (state.volume, state.muted);
        emit(&state.sink, ElementEvent::VolumeChange { volume, muted });
    }

    fn muted(&self) -> bool {
        guard(&self.state).muted
    }

    fn set_muted(&mut self, muted: bool) {
        let mut state = guard(&self.state);
        state.muted = muted;
        let volume = state.volume;
        emit(&state.sink, ElementEvent::VolumeChange { volume, muted });
    }

    fn play(&mut self) -> Result<()> {
        let mut state = guard(&self.state);
        if let Some(reason) = &state.reject_play {
            return Err(Error::PlaybackRejected(reason.clone()));
        }
        if state.paused {
            state.paused = false;
            emit(&state.sink, ElementEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = guard(&self.state);
        if !state.paused {
            state.paused = true;
            emit(&state.sink, ElementEvent::Pause);
        }
    }

    fn can_play_type(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        guard(&self.state).native_types.iter().any(|t| *t == mime)
    }

    fn subscribe(&mut self, sink: EventSink) {
        guard(&self.state).sink = Some(sink);
    }

    fn unsubscribe(&mut self) {
        guard(&self.state).sink = None;
    }
}

// =============================================================================
// Fullscreen
// =============================================================================

#[derive(Default)]
struct FullscreenState {
    active: bool,
    reject: Option<String>,
    requests: u32,
}

/// Fullscreen capability that settles asynchronously and can be told to refuse
#[derive(Clone, Default)]
pub struct SimulatedFullscreen {
    state: Arc<Mutex<FullscreenState>>,
}

impl SimulatedFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse requests with `reason`, or accept them again with `None`
    pub fn set_reject(&self, reason: Option<String>) {
        guard(&self.state).reject = reason;
    }

    /// Number of request/exit calls seen
    pub fn requests(&self) -> u32 {
        guard(&self.state).requests
    }

    fn settle(&self, target: bool) -> Result<()> {
        let mut state = guard(&self.state);
        state.requests += 1;
        if let Some(reason) = &state.reject {
            return Err(Error::FullscreenRejected(reason.clone()));
        }
        state.active = target;
        Ok(())
    }
}

#[async_trait]
impl FullscreenCapability for SimulatedFullscreen {
    fn is_active(&self) -> bool {
        guard(&self.state).active
    }

    async fn request(&self) -> Result<()> {
        tokio::task::yield_now().await;
        self.settle(true)
    }

    async fn exit(&self) -> Result<()> {
        tokio::task::yield_now().await;
        self.settle(false)
    }
}
