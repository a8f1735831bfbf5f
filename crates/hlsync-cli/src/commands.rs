//! CLI command implementations

use crate::output::{render_view, to_json, OutputFormat};
use crate::scenario::{Scenario, Step};
use hlsync_core::element::shared;
use hlsync_core::sim::{SimEngineHandle, SimulatedElement, SimulatedFullscreen, SimulatedProvider};
use hlsync_core::{format_time, MirrorConfig, PlaybackMirror, PlayerView};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Result of one scenario step
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub view: PlayerView,
}

/// Scenario run, as printed in JSON mode
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub source: String,
    pub attachment: String,
    pub initial: PlayerView,
    pub steps: Vec<StepReport>,
    pub failed_commands: usize,
}

/// Configuration given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Config loaded with `--config`; replaces the scenario's config
    pub file: Option<MirrorConfig>,
    /// `--source`; replaces only the source of whichever config wins
    pub source: Option<Url>,
}

impl ConfigOverrides {
    /// Pick the config file, then the scenario config, then defaults, and
    /// apply the source override on top
    pub fn resolve(&self, scenario: Option<&MirrorConfig>) -> MirrorConfig {
        let mut config = self
            .file
            .clone()
            .or_else(|| scenario.cloned())
            .unwrap_or_default();
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        config
    }
}

/// A mirror wired to the simulation backend
struct Simulation {
    mirror: PlaybackMirror,
    engine: SimEngineHandle,
    element: SimulatedElement,
}

impl Simulation {
    fn new(scenario: &Scenario, config: MirrorConfig) -> Self {
        let provider = SimulatedProvider::new(scenario.engine_supported);
        let engine = provider.handle();
        engine.set_levels(scenario.levels.clone());
        engine.set_audio_tracks(scenario.audio_tracks.clone());

        let mut element = SimulatedElement::new();
        if scenario.native_hls {
            element = element.with_native_support(&config.native_mime_type);
        }
        element.set_reject_play(scenario.play_reject.clone());

        let fullscreen = SimulatedFullscreen::new();
        fullscreen.set_reject(scenario.fullscreen_reject.clone());

        let mirror = PlaybackMirror::new(config, shared(element.clone()))
            .with_engine_provider(Arc::new(provider))
            .with_fullscreen(Arc::new(fullscreen));

        Self { mirror, engine, element }
    }

    /// Apply one step and drain the resulting events
    async fn run(&mut self, step: &Step) -> hlsync_core::Result<()> {
        let result = match step {
            Step::Engine(event) => {
                self.engine.emit(event.clone());
                Ok(())
            }
            Step::Element(event) => {
                self.mirror.event_sink().emit(event.clone());
                Ok(())
            }
            Step::Command(command) => self.mirror.execute(command.clone()).await,
            Step::SetLevels(levels) => {
                self.engine.set_levels(levels.clone());
                Ok(())
            }
            Step::SetAudioTracks(tracks) => {
                self.engine.set_audio_tracks(tracks.clone());
                Ok(())
            }
            Step::LoadMetadata { duration } => {
                self.element.load_metadata(*duration);
                Ok(())
            }
            Step::Advance { seconds } => {
                self.element.advance(*seconds);
                Ok(())
            }
        };
        self.mirror.pump();
        result
    }
}

/// Replay a scenario file
pub async fn simulate(path: &Path, overrides: &ConfigOverrides, format: &str) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(path)?;
    let report = run_scenario(&scenario, overrides).await?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if report.failed_commands > 0 {
        anyhow::bail!("{} command(s) failed", report.failed_commands);
    }
    Ok(())
}

/// Run every step of `scenario` and collect the view after each one
pub async fn run_scenario(scenario: &Scenario, overrides: &ConfigOverrides) -> anyhow::Result<SimulationReport> {
    let config = overrides.resolve(scenario.config.as_ref());
    config.validate()?;

    let mut sim = Simulation::new(scenario, config);
    sim.mirror.initialize()?;
    sim.mirror.pump();

    info!(
        source = %sim.mirror.source(),
        attachment = %sim.mirror.attachment(),
        steps = scenario.steps.len(),
        "Running scenario"
    );

    let initial = sim.mirror.view().clone();
    let mut steps = Vec::with_capacity(scenario.steps.len());
    let mut failed_commands = 0;

    for (i, step) in scenario.steps.iter().enumerate() {
        let error = match sim.run(step).await {
            Ok(()) => None,
            Err(e) => {
                warn!(step = i + 1, code = e.error_code(), error = %e, "Step failed");
                failed_commands += 1;
                Some(e.to_string())
            }
        };

        steps.push(StepReport {
            step: i + 1,
            label: step.label(),
            error,
            view: sim.mirror.view().clone(),
        });
    }

    let report = SimulationReport {
        source: sim.mirror.source().to_string(),
        attachment: sim.mirror.attachment().to_string(),
        initial,
        steps,
        failed_commands,
    };
    sim.mirror.destroy();

    Ok(report)
}

fn print_report(report: &SimulationReport) {
    println!("Source: {}", report.source);
    println!("Attachment: {}", report.attachment);
    println!("\nInitial:");
    print!("{}", render_view(&report.initial));

    for step in &report.steps {
        println!("\n[{}] {}", step.step, step.label);
        if let Some(error) = &step.error {
            println!("  Failed:   {}", error);
        }
        print!("{}", render_view(&step.view));
    }

    println!(
        "\nResults: {} steps, {} failed",
        report.steps.len(),
        report.failed_commands
    );
}

/// Print the effective configuration
pub fn show_config(overrides: &ConfigOverrides) -> anyhow::Result<()> {
    let config = overrides.resolve(None);
    config.validate()?;
    println!("{}", to_json(&config)?);
    Ok(())
}

/// Print a formatted playback time
pub fn time(seconds: f64, format: &str) -> anyhow::Result<()> {
    let label = format_time(seconds);
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&serde_json::json!({ "seconds": seconds, "label": label }))?),
        OutputFormat::Text => println!("{}", label),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsync_core::{EngineLevel, NO_AUDIO_TRACK};

    fn scenario(json: &str) -> Scenario {
        Scenario::from_json(json).unwrap()
    }

    #[tokio::test]
    async fn test_engine_scenario() {
        let scenario = scenario(
            r#"{
                "levels": [
                    { "height": 360, "bitrate": 800000 },
                    { "height": 720, "bitrate": 2500000 }
                ],
                "audio_tracks": [{ "name": "English", "lang": "en", "default": true }],
                "steps": [
                    { "engine": { "type": "manifest_parsed" } },
                    { "command": { "type": "select_quality", "index": 1 } },
                    { "load_metadata": { "duration": 120.0 } },
                    { "advance": { "seconds": 61.0 } }
                ]
            }"#,
        );

        let report = run_scenario(&scenario, &ConfigOverrides::default()).await.unwrap();
        assert_eq!(report.attachment, "engine");
        assert_eq!(report.failed_commands, 0);
        assert!(report.initial.snapshot.is_loading);

        let parsed = &report.steps[0].view;
        assert!(!parsed.snapshot.is_loading);
        assert_eq!(parsed.quality_levels.len(), 2);
        assert_eq!(parsed.snapshot.selected_audio_track_id, 0);

        assert_eq!(report.steps[1].view.snapshot.selected_quality_index, 1);

        let last = &report.steps[3].view.snapshot;
        assert_eq!(last.duration_label(), "2:00");
        assert_eq!(last.current_time_label(), "1:01");
    }

    #[tokio::test]
    async fn test_unsupported_scenario() {
        let scenario = scenario(r#"{ "engine_supported": false, "native_hls": false }"#);

        let report = run_scenario(&scenario, &ConfigOverrides::default()).await.unwrap();
        assert_eq!(report.attachment, "unsupported");
        assert!(report.initial.snapshot.has_error);
        assert!(!report.initial.snapshot.is_loading);
        assert_eq!(report.initial.snapshot.selected_audio_track_id, NO_AUDIO_TRACK);
    }

    #[tokio::test]
    async fn test_failed_command_is_counted() {
        let scenario = scenario(
            r#"{
                "levels": [{ "height": 720, "bitrate": 2500000 }],
                "fullscreen_reject": "denied",
                "steps": [
                    { "engine": { "type": "manifest_parsed" } },
                    { "command": { "type": "select_quality", "index": 5 } },
                    { "command": { "type": "toggle_fullscreen" } }
                ]
            }"#,
        );

        let report = run_scenario(&scenario, &ConfigOverrides::default()).await.unwrap();
        assert_eq!(report.failed_commands, 2);
        assert!(report.steps[1].error.is_some());
        assert!(!report.steps[2].view.snapshot.is_fullscreen);
    }

    #[tokio::test]
    async fn test_cli_config_overrides_scenario() {
        let scenario = scenario(
            r#"{ "config": { "source": "https://cdn.example.com/scenario.m3u8" } }"#,
        );

        let report = run_scenario(&scenario, &ConfigOverrides::default()).await.unwrap();
        assert_eq!(report.source, "https://cdn.example.com/scenario.m3u8");

        let overrides = ConfigOverrides {
            file: Some(MirrorConfig::with_source("https://cdn.example.com/cli.m3u8".parse().unwrap())),
            source: None,
        };
        let report = run_scenario(&scenario, &overrides).await.unwrap();
        assert_eq!(report.source, "https://cdn.example.com/cli.m3u8");
    }

    #[test]
    fn test_source_override_keeps_scenario_config() {
        let scenario = scenario(
            r#"{
                "config": {
                    "source": "https://cdn.example.com/scenario.m3u8",
                    "max_error_history": 3,
                    "engine": { "enable_worker": true }
                }
            }"#,
        );
        let overrides = ConfigOverrides {
            file: None,
            source: Some("https://cdn.example.com/cli.m3u8".parse().unwrap()),
        };

        let config = overrides.resolve(scenario.config.as_ref());
        assert_eq!(config.source.as_str(), "https://cdn.example.com/cli.m3u8");
        assert_eq!(config.max_error_history, 3);
        assert!(config.engine.enable_worker);
    }

    #[test]
    fn test_source_override_applies_to_config_file() {
        let mut file = MirrorConfig::default();
        file.max_error_history = 7;
        let overrides = ConfigOverrides {
            file: Some(file),
            source: Some("https://cdn.example.com/cli.m3u8".parse().unwrap()),
        };
        let scenario_config = MirrorConfig::with_source("https://cdn.example.com/scenario.m3u8".parse().unwrap());

        let config = overrides.resolve(Some(&scenario_config));
        assert_eq!(config.source.as_str(), "https://cdn.example.com/cli.m3u8");
        assert_eq!(config.max_error_history, 7);
    }

    #[test]
    fn test_no_overrides_falls_back_to_defaults() {
        let config = ConfigOverrides::default().resolve(None);
        assert_eq!(config, MirrorConfig::default());
    }

    #[tokio::test]
    async fn test_set_levels_then_level_loaded() {
        let mut scenario = scenario(r#"{ "steps": [{ "engine": { "type": "manifest_parsed" } }] }"#);
        scenario.steps.push(Step::SetLevels(vec![EngineLevel::new(1080, 5_000_000)]));
        scenario.steps.push(Step::Engine(hlsync_core::EngineEvent::LevelLoaded { level: 0 }));

        let report = run_scenario(&scenario, &ConfigOverrides::default()).await.unwrap();
        assert!(report.steps[0].view.quality_levels.is_empty());
        assert_eq!(report.steps[2].view.quality_levels[0].name, "1080p (5000kbps)");
    }
}
