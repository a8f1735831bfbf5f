//! Simulated playback example
//!
//! Drives a playback mirror with the simulated engine and element, and
//! watches the view from a separate task.
//!
//! Run with: cargo run -p hlsync-core --example simulated_playback

use hlsync_core::element::shared;
use hlsync_core::sim::{SimulatedElement, SimulatedFullscreen, SimulatedProvider};
use hlsync_core::{EngineAudioTrack, EngineLevel, MirrorConfig, PlaybackMirror, StreamErrorType};
use std::sync::Arc;

#[tokio::main]
async fn main() -> hlsync_core::Result<()> {
    println!("hlsync Core - Simulated Playback Example");
    println!("==========================================\n");

    let provider = SimulatedProvider::new(true);
    let engine = provider.handle();
    engine.set_levels(vec![
        EngineLevel::new(360, 800_000),
        EngineLevel::new(720, 2_500_000),
        EngineLevel::new(1080, 5_000_000),
    ]);
    engine.set_audio_tracks(vec![
        EngineAudioTrack::new("English", "en").with_default(true),
        EngineAudioTrack::new("Español", "es"),
    ]);

    let element = SimulatedElement::new();
    let mut mirror = PlaybackMirror::new(MirrorConfig::default(), shared(element.clone()))
        .with_engine_provider(Arc::new(provider))
        .with_fullscreen(Arc::new(SimulatedFullscreen::new()));

    let mut views = mirror.subscribe();
    let watcher = tokio::spawn(async move {
        let mut updates = 0;
        while views.changed().await.is_ok() {
            updates += 1;
        }
        updates
    });

    mirror.initialize()?;
    println!("Attached via: {}", mirror.attachment());

    engine.manifest_parsed();
    element.load_metadata(596.0);
    mirror.pump();

    println!("\nQuality levels:");
    for level in mirror.quality_levels() {
        println!("  {}. {}", level.index, level.name);
    }
    println!("\nAudio tracks:");
    for track in mirror.audio_tracks() {
        let marker = if track.is_default { " (default)" } else { "" };
        println!("  {}. {} [{}]{}", track.id, track.name, track.lang, marker);
    }

    mirror.toggle_play()?;
    element.advance(83.0);
    mirror.select_quality(1)?;
    mirror.toggle_fullscreen().await?;
    mirror.pump();

    let snapshot = mirror.snapshot();
    println!(
        "\nPlaying: {}  {} / {}  quality {}  fullscreen {}",
        snapshot.is_playing,
        snapshot.current_time_label(),
        snapshot.duration_label(),
        snapshot.selected_quality_index,
        snapshot.is_fullscreen
    );

    engine.error(StreamErrorType::Network, "manifestLoadError", true);
    mirror.pump();
    println!("Error shown: {}", mirror.snapshot().error_message);

    mirror.destroy();
    drop(mirror);
    if let Ok(updates) = watcher.await {
        println!("\nView updates observed: {}", updates);
    }

    Ok(())
}
