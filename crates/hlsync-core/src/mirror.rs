//! Playback State Mirror - UI-facing view of an adaptive player
//!
//! Coordinates:
//! - Engine attachment with native and unsupported fallbacks
//! - Event application (engine and element, one FIFO channel)
//! - Command forwarding to the engine and the element
//! - Snapshot broadcasting
//! - Teardown of the engine and all listeners

use crate::{
    command::PlayerCommand,
    config::MirrorConfig,
    element::{self, SharedElement},
    engine::{EngineProvider, MediaEngine},
    events::{ElementEvent, EngineEvent, EventSink, MirrorEvent},
    fullscreen::FullscreenCapability,
    types::*,
    Error, Result,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Message shown when neither an engine nor native playback is available
pub const UNSUPPORTED_MESSAGE: &str = "HLS is not supported on this platform";

/// Mirror of one player's state
pub struct PlaybackMirror {
    /// Unique mirror ID
    id: MirrorId,
    /// Mirror configuration
    config: MirrorConfig,
    /// Source currently requested
    source: Url,
    /// How playback is attached
    attachment: Attachment,
    /// Native media element
    element: SharedElement,
    /// Engine capability, if the host offers one
    provider: Option<Arc<dyn EngineProvider>>,
    /// Platform fullscreen control
    fullscreen: Option<Arc<dyn FullscreenCapability>>,
    /// Live engine instance
    engine: Option<Box<dyn MediaEngine>>,
    /// Snapshot plus quality and track lists
    view: PlayerView,
    /// Recent stream errors
    errors: VecDeque<StreamErrorRecord>,
    /// Event channel shared by engine and element
    events_tx: mpsc::UnboundedSender<MirrorEvent>,
    events_rx: mpsc::UnboundedReceiver<MirrorEvent>,
    /// View change broadcaster
    view_tx: watch::Sender<PlayerView>,
}

impl PlaybackMirror {
    /// Create a mirror over a native element. Nothing is loaded until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(config: MirrorConfig, element: SharedElement) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(PlayerView::default());

        Self {
            id: MirrorId::new(),
            source: config.source.clone(),
            config,
            attachment: Attachment::Pending,
            element,
            provider: None,
            fullscreen: None,
            engine: None,
            view: PlayerView::default(),
            errors: VecDeque::new(),
            events_tx,
            events_rx,
            view_tx,
        }
    }

    /// Offer a media engine capability
    pub fn with_engine_provider(mut self, provider: Arc<dyn EngineProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Offer a fullscreen capability
    pub fn with_fullscreen(mut self, fullscreen: Arc<dyn FullscreenCapability>) -> Self {
        self.fullscreen = Some(fullscreen);
        self
    }

    /// Unique mirror ID
    pub fn id(&self) -> MirrorId {
        self.id
    }

    /// Configuration the mirror was built with
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Source most recently requested
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// How playback is currently attached
    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    /// True while an engine instance is held
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Current playback snapshot
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.view.snapshot
    }

    /// Quality levels from the last engine read
    pub fn quality_levels(&self) -> &[QualityLevel] {
        &self.view.quality_levels
    }

    /// Audio tracks from the last engine read
    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.view.audio_tracks
    }

    /// Snapshot plus both lists, as broadcast to subscribers
    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    /// Stream errors seen so far, oldest first
    pub fn error_history(&self) -> impl Iterator<Item = &StreamErrorRecord> {
        self.errors.iter()
    }

    /// Subscribe to view changes
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view_tx.subscribe()
    }

    /// Listener for hosts that bridge engine or element callbacks by hand
    pub fn event_sink(&self) -> EventSink {
        EventSink::new(self.events_tx.clone())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Attach playback on the first render-ready signal
    ///
    /// Tries, in order: a supported engine, native playback of the HLS MIME
    /// type, and finally an unsupported error state.
    #[instrument(skip(self), fields(mirror_id = %self.id))]
    pub fn initialize(&mut self) -> Result<()> {
        match self.attachment {
            Attachment::Pending => {}
            Attachment::Released => return Err(Error::Released),
            _ => return Err(Error::AlreadyInitialized),
        }

        let provider = self.provider.as_ref().filter(|p| p.is_supported()).cloned();

        if let Some(provider) = provider {
            let mut engine = provider.create(&self.config.engine);
            engine.load_source(&self.source);
            engine.attach_media(Arc::clone(&self.element));
            engine.subscribe(self.event_sink());
            self.engine = Some(engine);
            self.attachment = Attachment::Engine;
            info!(url = %self.source, "Engine attached");
        } else {
            let native = {
                let element = element::lock(&self.element)?;
                element.can_play_type(&self.config.native_mime_type)
            };

            if native {
                element::lock(&self.element)?.set_src(&self.source);
                self.view.snapshot.is_loading = false;
                self.attachment = Attachment::Native;
                info!(url = %self.source, "Native playback attached");
            } else {
                self.mark_unsupported();
                self.attachment = Attachment::Unsupported;
            }
        }

        element::lock(&self.element)?.subscribe(self.event_sink());
        self.publish();

        Ok(())
    }

    /// Release the engine and detach every listener. Idempotent.
    #[instrument(skip(self), fields(mirror_id = %self.id))]
    pub fn destroy(&mut self) {
        if self.attachment == Attachment::Released {
            return;
        }

        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            info!("Engine released");
        }

        self.element
            .lock()
            .unwrap_or_else(|poisoned| {
                warn!("Media element lock poisoned, detaching listeners anyway");
                poisoned.into_inner()
            })
            .unsubscribe();

        self.events_rx.close();
        while self.events_rx.try_recv().is_ok() {}

        self.attachment = Attachment::Released;
        info!("Mirror torn down");
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Apply every queued event. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it. Returns false once torn down.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply one event to the view. Never fails; stream problems end up in
    /// the snapshot.
    pub fn handle_event(&mut self, event: MirrorEvent) {
        if self.attachment == Attachment::Released {
            debug!(?event, "Ignoring event after teardown");
            return;
        }

        match event {
            MirrorEvent::Engine(event) => self.apply_engine_event(event),
            MirrorEvent::Element(event) => self.apply_element_event(event),
        }
    }

    fn apply_engine_event(&mut self, event: EngineEvent) {
        debug!(mirror_id = %self.id, ?event, "Engine event");

        match event {
            EngineEvent::ManifestParsed => {
                self.view.snapshot.is_loading = false;
                self.rebuild_quality_levels();
                self.rebuild_audio_tracks();
            }
            EngineEvent::LevelLoaded { .. } => {
                self.rebuild_quality_levels();
            }
            EngineEvent::AudioTracksUpdated => {
                self.rebuild_audio_tracks();
            }
            EngineEvent::Error(err) => {
                self.record_error(&err);
                if !err.fatal {
                    warn!(
                        mirror_id = %self.id,
                        error_type = %err.error_type,
                        details = %err.details,
                        "Non-fatal stream error"
                    );
                    return;
                }

                error!(
                    mirror_id = %self.id,
                    error_type = %err.error_type,
                    details = %err.details,
                    "Fatal stream error"
                );
                let snapshot = &mut self.view.snapshot;
                snapshot.has_error = true;
                snapshot.error_message = err.user_message();
                snapshot.is_loading = false;
            }
        }

        self.publish();
    }

    fn apply_element_event(&mut self, event: ElementEvent) {
        let snapshot = &mut self.view.snapshot;

        match event {
            ElementEvent::LoadedMetadata { duration } => {
                snapshot.duration_seconds = duration;
                // Natively played sources have no manifest event to end loading.
                if self.attachment == Attachment::Native {
                    snapshot.is_loading = false;
                }
            }
            ElementEvent::TimeUpdate { current_time } => {
                snapshot.current_time_seconds = current_time;
            }
            ElementEvent::Play => snapshot.is_playing = true,
            ElementEvent::Pause => snapshot.is_playing = false,
            ElementEvent::VolumeChange { volume, muted } => {
                snapshot.volume = volume;
                snapshot.is_muted = muted;
            }
        }

        self.publish();
    }

    /// Replace the quality list with a fresh read of the engine's levels
    fn rebuild_quality_levels(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        self.view.quality_levels = engine
            .levels()
            .iter()
            .enumerate()
            .map(|(index, level)| QualityLevel::from_engine(index, level))
            .collect();

        let selected = self.view.snapshot.selected_quality_index;
        if selected != AUTO_QUALITY && !index_in(selected, self.view.quality_levels.len()) {
            debug!(selected, "Selected level vanished, back to automatic");
            self.view.snapshot.selected_quality_index = AUTO_QUALITY;
        }
    }

    /// Replace the audio track list and re-pick the default track.
    ///
    /// The first track flagged default wins. With no default the previous
    /// selection is kept, as long as it still names a track.
    fn rebuild_audio_tracks(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        self.view.audio_tracks = engine
            .audio_tracks()
            .iter()
            .enumerate()
            .map(|(index, track)| AudioTrack::from_engine(index, track))
            .collect();

        let snapshot = &mut self.view.snapshot;
        if let Some(track) = self.view.audio_tracks.iter().find(|t| t.is_default) {
            snapshot.selected_audio_track_id = track.id;
        } else if snapshot.selected_audio_track_id != NO_AUDIO_TRACK
            && !index_in(snapshot.selected_audio_track_id, self.view.audio_tracks.len())
        {
            snapshot.selected_audio_track_id = NO_AUDIO_TRACK;
        }
    }

    fn record_error(&mut self, err: &StreamError) {
        if self.config.max_error_history == 0 {
            return;
        }
        while self.errors.len() >= self.config.max_error_history {
            self.errors.pop_front();
        }
        self.errors.push_back(StreamErrorRecord {
            at: chrono::Utc::now(),
            error: err.clone(),
        });
    }

    fn mark_unsupported(&mut self) {
        warn!(mirror_id = %self.id, mime = %self.config.native_mime_type, "No engine and no native support");
        let snapshot = &mut self.view.snapshot;
        snapshot.has_error = true;
        snapshot.error_message = UNSUPPORTED_MESSAGE.to_string();
        snapshot.is_loading = false;
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view.clone());
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn ensure_live(&self) -> Result<()> {
        if self.attachment == Attachment::Released {
            return Err(Error::Released);
        }
        Ok(())
    }

    /// Execute a scripted or queued command
    pub async fn execute(&mut self, command: PlayerCommand) -> Result<()> {
        debug!(mirror_id = %self.id, command = command.name(), "Executing command");

        match command {
            PlayerCommand::TogglePlay => self.toggle_play(),
            PlayerCommand::SelectQuality { index } => self.select_quality(index),
            PlayerCommand::SelectAudioTrack { id } => self.select_audio_track(id),
            PlayerCommand::Seek { time } => self.seek(time),
            PlayerCommand::SetVolume { volume } => self.set_volume(volume),
            PlayerCommand::ToggleMute => self.toggle_mute(),
            PlayerCommand::ToggleFullscreen => self.toggle_fullscreen().await,
            PlayerCommand::ChangeSource { url } => self.change_source(url),
        }
    }

    /// Pause when playing, play otherwise. No-op before initialization.
    pub fn toggle_play(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.attachment == Attachment::Pending {
            debug!("Toggle play ignored, no media attached");
            return Ok(());
        }

        let mut element = element::lock(&self.element)?;
        if self.view.snapshot.is_playing {
            element.pause();
        } else {
            element.play()?;
        }
        Ok(())
    }

    /// Force a quality level (-1 = automatic). The engine validates the index.
    pub fn select_quality(&mut self, index: i32) -> Result<()> {
        self.ensure_live()?;
        let Some(engine) = self.engine.as_mut() else {
            debug!(index, "Quality selection ignored, no engine");
            return Ok(());
        };

        engine.set_current_level(index)?;
        self.view.snapshot.selected_quality_index = index;
        info!(mirror_id = %self.id, index, "Quality selected");
        self.publish();
        Ok(())
    }

    /// Switch audio track. The engine validates the id.
    pub fn select_audio_track(&mut self, id: i32) -> Result<()> {
        self.ensure_live()?;
        let Some(engine) = self.engine.as_mut() else {
            debug!(id, "Audio track selection ignored, no engine");
            return Ok(());
        };

        engine.set_audio_track(id)?;
        self.view.snapshot.selected_audio_track_id = id;
        info!(mirror_id = %self.id, id, "Audio track selected");
        self.publish();
        Ok(())
    }

    /// Move the playhead. Clamping is left to the element.
    pub fn seek(&mut self, time: f64) -> Result<()> {
        self.ensure_live()?;
        element::lock(&self.element)?.set_current_time(time);
        Ok(())
    }

    /// Set element volume; keeping it within 0.0-1.0 is the caller's job
    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.ensure_live()?;
        element::lock(&self.element)?.set_volume(volume);
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<()> {
        self.ensure_live()?;
        let mut element = element::lock(&self.element)?;
        let muted = element.muted();
        element.set_muted(!muted);
        Ok(())
    }

    /// Enter or leave fullscreen. The snapshot only changes once the
    /// platform accepts; a refusal is returned and not retried.
    pub async fn toggle_fullscreen(&mut self) -> Result<()> {
        self.ensure_live()?;
        let Some(fullscreen) = self.fullscreen.clone() else {
            return Err(Error::FullscreenUnsupported);
        };

        let entering = !fullscreen.is_active();
        let outcome = if entering {
            fullscreen.request().await
        } else {
            fullscreen.exit().await
        };

        match outcome {
            Ok(()) => {
                self.view.snapshot.is_fullscreen = entering;
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!(mirror_id = %self.id, error = %e, entering, "Fullscreen request rejected");
                Err(e)
            }
        }
    }

    /// Switch to another stream
    ///
    /// Loading and error state reset synchronously; results arrive as events.
    /// Events still in flight for the previous source are not filtered.
    #[instrument(skip(self, url), fields(mirror_id = %self.id, url = %url))]
    pub fn change_source(&mut self, url: Url) -> Result<()> {
        self.ensure_live()?;

        self.source = url;
        let snapshot = &mut self.view.snapshot;
        snapshot.is_loading = true;
        snapshot.has_error = false;
        snapshot.error_message.clear();

        if let Some(engine) = self.engine.as_mut() {
            engine.load_source(&self.source);
            info!("Source handed to engine");
        } else if self.attachment != Attachment::Pending {
            let native = {
                let element = element::lock(&self.element)?;
                element.can_play_type(&self.config.native_mime_type)
            };
            if native {
                element::lock(&self.element)?.set_src(&self.source);
                self.attachment = Attachment::Native;
                info!("Source assigned to native element");
            } else {
                self.mark_unsupported();
            }
        }

        self.publish();
        Ok(())
    }
}

impl Drop for PlaybackMirror {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn index_in(index: i32, len: usize) -> bool {
    index >= 0 && (index as usize) < len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::shared;
    use crate::sim::{SimulatedElement, SimulatedProvider};

    fn engine_mirror() -> (PlaybackMirror, crate::sim::SimEngineHandle) {
        let provider = SimulatedProvider::new(true);
        let handle = provider.handle();
        let mirror = PlaybackMirror::new(MirrorConfig::default(), shared(SimulatedElement::new()))
            .with_engine_provider(Arc::new(provider));
        (mirror, handle)
    }

    #[test]
    fn test_mirror_creation() {
        let (mirror, _) = engine_mirror();

        assert_eq!(mirror.attachment(), Attachment::Pending);
        assert!(mirror.snapshot().is_loading);
        assert!(!mirror.has_engine());
        assert!(mirror.quality_levels().is_empty());
    }

    #[test]
    fn test_initialize_twice() {
        let (mut mirror, _) = engine_mirror();

        assert!(mirror.initialize().is_ok());
        assert!(matches!(mirror.initialize(), Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn test_error_history_is_capped() {
        let mut config = MirrorConfig::default();
        config.max_error_history = 2;
        let mut mirror = PlaybackMirror::new(config, shared(SimulatedElement::new()));
        mirror.initialize().unwrap();

        for details in ["a", "b", "c"] {
            mirror.handle_event(MirrorEvent::Engine(EngineEvent::Error(StreamError::non_fatal(
                StreamErrorType::Network,
                details,
            ))));
        }

        let kept: Vec<_> = mirror.error_history().map(|r| r.error.details.as_str()).collect();
        assert_eq!(kept, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_error_history_keeps_nothing() {
        let mut config = MirrorConfig::default();
        config.max_error_history = 0;
        let mut mirror = PlaybackMirror::new(config, shared(SimulatedElement::new()));
        mirror.initialize().unwrap();

        mirror.handle_event(MirrorEvent::Engine(EngineEvent::Error(StreamError::non_fatal(
            StreamErrorType::Network,
            "fragLoadError",
        ))));
        mirror.handle_event(MirrorEvent::Engine(EngineEvent::Error(StreamError::fatal(
            StreamErrorType::Network,
            "manifestLoadError",
        ))));

        assert_eq!(mirror.error_history().count(), 0);
        assert!(mirror.snapshot().has_error);
        assert_eq!(mirror.snapshot().error_message, "HLS Error: manifestLoadError");
    }

    #[test]
    fn test_destroy_detaches_poisoned_element() {
        let element = SimulatedElement::new();
        let shared_element = shared(element.clone());
        let mut mirror = PlaybackMirror::new(MirrorConfig::default(), Arc::clone(&shared_element));
        mirror.initialize().unwrap();
        assert!(element.is_subscribed());

        let poisoner = Arc::clone(&shared_element);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the element lock");
        }));
        assert!(shared_element.is_poisoned());

        mirror.destroy();
        assert_eq!(mirror.attachment(), Attachment::Released);
        assert!(!element.is_subscribed());
    }

    #[test]
    fn test_vanished_quality_selection_resets() {
        let (mut mirror, handle) = engine_mirror();
        handle.set_levels(vec![
            EngineLevel::new(360, 800_000),
            EngineLevel::new(720, 2_500_000),
            EngineLevel::new(1080, 5_000_000),
        ]);
        mirror.initialize().unwrap();
        handle.manifest_parsed();
        mirror.pump();

        mirror.select_quality(2).unwrap();
        assert_eq!(mirror.snapshot().selected_quality_index, 2);

        handle.set_levels(vec![EngineLevel::new(360, 800_000)]);
        handle.level_loaded(0);
        mirror.pump();

        assert_eq!(mirror.quality_levels().len(), 1);
        assert_eq!(mirror.snapshot().selected_quality_index, AUTO_QUALITY);
    }

    #[test]
    fn test_index_in() {
        assert!(index_in(0, 1));
        assert!(!index_in(1, 1));
        assert!(!index_in(-1, 3));
    }
}
