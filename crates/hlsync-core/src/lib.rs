//! hlsync Core - Playback state mirror for adaptive HLS players
//!
//! This crate keeps a UI-facing view of a player in sync with an external
//! adaptive-streaming engine and a native media element:
//! - Engine attachment with native and unsupported fallbacks
//! - Quality level and audio track lists rebuilt from engine events
//! - Position, duration, volume and play state mirrored from element events
//! - Commands forwarded to the engine, the element and the platform
//! - Snapshot broadcasting over a watch channel
//!
//! Manifest parsing, segment fetching and bitrate selection stay inside the
//! engine; this crate only talks to it through [`MediaEngine`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        hlsync Core                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐                        ┌──────────────┐       │
//! │  │ Media Engine │──── engine events ──┐  │ Media Element│       │
//! │  └──────▲───────┘                     │  └──────▲───┬───┘       │
//! │         │                             ▼         │   │           │
//! │         │                      ┌─────────────┐  │   │ element   │
//! │         │ level / track        │ Event Sink  │◀─┼───┘ events    │
//! │         │                      └──────┬──────┘  │               │
//! │         │                             ▼         │ play / seek   │
//! │         │                      ┌─────────────┐  │ volume / mute │
//! │         └──────────────────────│  Playback   │──┘               │
//! │                                │   Mirror    │                  │
//! │  ┌──────────────┐              └──────┬──────┘                  │
//! │  │  Fullscreen  │◀────────────────────┤                         │
//! │  └──────────────┘                     ▼                         │
//! │                                ┌─────────────┐                  │
//! │                                │ PlayerView  │ (watch channel)  │
//! │                                └─────────────┘                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hlsync_core::{element::shared, sim::*, EngineLevel, MirrorConfig, PlaybackMirror};
//!
//! let provider = SimulatedProvider::new(true);
//! let engine = provider.handle();
//! engine.set_levels(vec![EngineLevel::new(720, 2_500_000)]);
//!
//! let mut mirror = PlaybackMirror::new(MirrorConfig::default(), shared(SimulatedElement::new()))
//!     .with_engine_provider(Arc::new(provider));
//! mirror.initialize().unwrap();
//!
//! engine.manifest_parsed();
//! mirror.pump();
//! assert_eq!(mirror.quality_levels()[0].name, "720p (2500kbps)");
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod events;
pub mod command;
pub mod engine;
pub mod element;
pub mod fullscreen;
pub mod mirror;
pub mod sim;

pub use error::{Error, Result};
pub use types::*;
pub use config::{EngineConfig, MirrorConfig};
pub use events::{ElementEvent, EngineEvent, EventSink, MirrorEvent};
pub use command::PlayerCommand;
pub use engine::{EngineProvider, MediaEngine};
pub use element::{MediaElement, SharedElement};
pub use fullscreen::FullscreenCapability;
pub use mirror::PlaybackMirror;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup
pub fn init() {
    tracing::info!(version = VERSION, "hlsync core initialized");
}
