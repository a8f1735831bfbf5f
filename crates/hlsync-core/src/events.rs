//! Events flowing from collaborators into the mirror
//!
//! Engine and element both publish into one FIFO channel through an
//! [`EventSink`]; the mirror drains it and applies each event in order.

use crate::types::StreamError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Lifecycle events emitted by the media engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Stream metadata is ready
    ManifestParsed,
    /// A quality variant's metadata was refreshed
    LevelLoaded {
        #[serde(default)]
        level: usize,
    },
    /// The audio track list changed
    AudioTracksUpdated,
    /// A stream error, fatal or not
    Error(StreamError),
}

/// Events fired by the native media element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementEvent {
    LoadedMetadata { duration: f64 },
    TimeUpdate { current_time: f64 },
    Play,
    Pause,
    VolumeChange { volume: f64, muted: bool },
}

/// Anything the mirror reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorEvent {
    Engine(EngineEvent),
    Element(ElementEvent),
}

impl From<EngineEvent> for MirrorEvent {
    fn from(event: EngineEvent) -> Self {
        MirrorEvent::Engine(event)
    }
}

impl From<ElementEvent> for MirrorEvent {
    fn from(event: ElementEvent) -> Self {
        MirrorEvent::Element(event)
    }
}

/// Listener handle given to the engine and the element
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<MirrorEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<MirrorEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event. Returns false once the mirror has been torn down.
    pub fn emit(&self, event: impl Into<MirrorEvent>) -> bool {
        let event = event.into();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                trace!(?event, "Dropping event for released mirror");
                false
            }
        }
    }

    /// True once the receiving mirror is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamErrorType;

    #[test]
    fn test_sink_preserves_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);

        assert!(sink.emit(ElementEvent::Play));
        assert!(sink.emit(EngineEvent::ManifestParsed));
        assert!(sink.emit(ElementEvent::Pause));

        assert_eq!(rx.try_recv().unwrap(), MirrorEvent::Element(ElementEvent::Play));
        assert_eq!(rx.try_recv().unwrap(), MirrorEvent::Engine(EngineEvent::ManifestParsed));
        assert_eq!(rx.try_recv().unwrap(), MirrorEvent::Element(ElementEvent::Pause));
    }

    #[test]
    fn test_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.emit(ElementEvent::Play));
    }

    #[test]
    fn test_event_json_shape() {
        let event: EngineEvent = serde_json::from_str(
            r#"{ "type": "error", "error_type": "media", "details": "bufferStalledError", "fatal": true }"#,
        )
        .unwrap();
        assert_eq!(
            event,
            EngineEvent::Error(StreamError::fatal(StreamErrorType::Media, "bufferStalledError"))
        );

        let event: ElementEvent =
            serde_json::from_str(r#"{ "type": "volume_change", "volume": 0.5, "muted": true }"#).unwrap();
        assert_eq!(event, ElementEvent::VolumeChange { volume: 0.5, muted: true });
    }
}
