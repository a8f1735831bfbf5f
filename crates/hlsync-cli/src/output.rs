//! Output formatting for CLI

use console::style;
use hlsync_core::{AudioTrack, PlayerView, QualityLevel};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Serialize `data` as pretty JSON
pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "#")]
    index: usize,
    name: String,
    selected: &'static str,
}

#[derive(Tabled)]
struct TrackRow {
    id: i32,
    name: String,
    lang: String,
    default: &'static str,
    selected: &'static str,
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "*"
    } else {
        ""
    }
}

fn level_table(levels: &[QualityLevel], selected: i32) -> String {
    let rows: Vec<LevelRow> = levels
        .iter()
        .map(|l| LevelRow {
            index: l.index,
            name: l.name.clone(),
            selected: mark(l.index as i32 == selected),
        })
        .collect();
    Table::new(rows).to_string()
}

fn track_table(tracks: &[AudioTrack], selected: i32) -> String {
    let rows: Vec<TrackRow> = tracks
        .iter()
        .map(|t| TrackRow {
            id: t.id,
            name: t.name.clone(),
            lang: t.lang.clone(),
            default: mark(t.is_default),
            selected: mark(t.id == selected),
        })
        .collect();
    Table::new(rows).to_string()
}

/// Human readable rendering of a view
pub fn render_view(view: &PlayerView) -> String {
    let s = &view.snapshot;
    let mut out = String::new();

    let state = if s.has_error {
        style("error").red().to_string()
    } else if s.is_loading {
        style("loading").yellow().to_string()
    } else if s.is_playing {
        style("playing").green().to_string()
    } else {
        "paused".to_string()
    };

    out.push_str(&format!(
        "  State:    {}  {} / {}\n",
        state,
        s.current_time_label(),
        s.duration_label()
    ));
    if s.has_error {
        out.push_str(&format!("  Error:    {}\n", s.error_message));
    }
    out.push_str(&format!(
        "  Volume:   {:.0}%{}\n",
        s.volume * 100.0,
        if s.is_muted { " (muted)" } else { "" }
    ));
    out.push_str(&format!("  Fullscreen: {}\n", s.is_fullscreen));

    let quality = if s.selected_quality_index < 0 {
        "auto".to_string()
    } else {
        s.selected_quality_index.to_string()
    };
    out.push_str(&format!("  Quality:  {}\n", quality));
    if !view.quality_levels.is_empty() {
        out.push_str(&level_table(&view.quality_levels, s.selected_quality_index));
        out.push('\n');
    }

    let audio = if s.selected_audio_track_id < 0 {
        "none".to_string()
    } else {
        s.selected_audio_track_id.to_string()
    };
    out.push_str(&format!("  Audio:    {}\n", audio));
    if !view.audio_tracks.is_empty() {
        out.push_str(&track_table(&view.audio_tracks, s.selected_audio_track_id));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsync_core::{EngineLevel, PlaybackSnapshot};

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_render_view_lists_levels() {
        console::set_colors_enabled(false);
        let view = PlayerView {
            snapshot: PlaybackSnapshot {
                is_loading: false,
                selected_quality_index: 1,
                ..Default::default()
            },
            quality_levels: vec![
                QualityLevel::from_engine(0, &EngineLevel::new(360, 800_000)),
                QualityLevel::from_engine(1, &EngineLevel::new(720, 2_500_000)),
            ],
            audio_tracks: Vec::new(),
        };

        let text = render_view(&view);
        assert!(text.contains("paused"));
        assert!(text.contains("0:00 / 0:00"));
        assert!(text.contains("720p (2500kbps)"));
        assert!(text.contains("Audio:    none"));
    }

    #[test]
    fn test_render_view_shows_error() {
        console::set_colors_enabled(false);
        let view = PlayerView {
            snapshot: PlaybackSnapshot {
                has_error: true,
                error_message: "HLS Error: manifestLoadError".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let text = render_view(&view);
        assert!(text.contains("State:    error"));
        assert!(text.contains("HLS Error: manifestLoadError"));
    }
}
