//! Flight configuration — timings, step sizes, colors, key bindings.
//!
//! Loaded from `~/.config/paper-plane/config.json` when present; every field
//! is optional and falls back to its default, so a partial file is fine.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::sequencer::Tuning;
use crate::types::{Color, NamedColor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightConfig {
    /// Pause after a rotation before the glide starts, in milliseconds.
    #[serde(default = "default_rotate_delay_ms")]
    pub rotate_delay_ms: u64,
    /// Duration of a glide, in milliseconds.
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,
    /// One full expansion of a ripple ring, in milliseconds.
    #[serde(default = "default_ripple_period_ms")]
    pub ripple_period_ms: u64,
    /// Ripple radius in rows (columns are doubled for cell aspect).
    #[serde(default = "default_ripple_radius")]
    pub ripple_radius: f64,
    /// Keyboard step in columns.
    #[serde(default = "default_step_cols")]
    pub step_cols: f64,
    /// Keyboard step in rows; defaults to half the columns so a step looks
    /// the same length either way.
    #[serde(default = "default_step_rows")]
    pub step_rows: f64,
    #[serde(default = "default_marker_color")]
    pub marker_color: Color,
    #[serde(default = "default_plane_color")]
    pub plane_color: Color,
    #[serde(default)]
    pub key_bindings: KeyBindings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_center")]
    pub center: String,
}

fn default_rotate_delay_ms() -> u64 {
    200
}
fn default_move_duration_ms() -> u64 {
    1000
}
fn default_ripple_period_ms() -> u64 {
    1000
}
fn default_ripple_radius() -> f64 {
    4.0
}
fn default_step_cols() -> f64 {
    10.0
}
fn default_step_rows() -> f64 {
    5.0
}
fn default_marker_color() -> Color {
    // The web original's ripple border, #5693d9.
    Color::Rgb {
        r: 0x56,
        g: 0x93,
        b: 0xd9,
    }
}
fn default_plane_color() -> Color {
    Color::Named(NamedColor::Yellow)
}
fn default_quit() -> String {
    "q".into()
}
fn default_center() -> String {
    "c".into()
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            quit: default_quit(),
            center: default_center(),
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        FlightConfig {
            rotate_delay_ms: default_rotate_delay_ms(),
            move_duration_ms: default_move_duration_ms(),
            ripple_period_ms: default_ripple_period_ms(),
            ripple_radius: default_ripple_radius(),
            step_cols: default_step_cols(),
            step_rows: default_step_rows(),
            marker_color: default_marker_color(),
            plane_color: default_plane_color(),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl FlightConfig {
    /// Load from the default config path; missing file or invalid JSON
    /// falls back to defaults (invalid JSON warns on stderr).
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: invalid flight config ({e}), using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Load from an explicit path; here a bad file is an error.
    pub fn from_file(path: &str) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {path}"))
    }

    fn config_path() -> std::path::PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = std::path::PathBuf::from(home);
        path.push(".config");
        path.push("paper-plane");
        path.push("config.json");
        path
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            rotate_delay: Duration::from_millis(self.rotate_delay_ms),
            move_duration: Duration::from_millis(self.move_duration_ms),
            step_cols: self.step_cols,
            step_rows: self.step_rows,
        }
    }

    pub fn ripple_period(&self) -> Duration {
        Duration::from_millis(self.ripple_period_ms)
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    // Ctrl- prefix
    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return rest
            .chars()
            .next()
            .is_some_and(|c| event.code == KeyCode::Char(c));
    }

    // Plain bindings must not fire with Ctrl or Alt held.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    match binding {
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Tab" => event.code == KeyCode::Tab,
        s => {
            // F-key binding: "F1" through "F12".
            if let Some(rest) = s.strip_prefix('F')
                && let Ok(n) = rest.parse::<u8>()
            {
                return event.code == KeyCode::F(n);
            }
            s.chars()
                .next()
                .is_some_and(|c| event.code == KeyCode::Char(c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config: FlightConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.rotate_delay_ms, 200);
        assert_eq!(config.move_duration_ms, 1000);
        assert_eq!(config.key_bindings.quit, "q");
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: FlightConfig =
            serde_json::from_str(r#"{"move_duration_ms": 500, "marker_color": "cyan"}"#).unwrap();
        assert_eq!(config.move_duration_ms, 500);
        assert_eq!(config.marker_color, Color::Named(NamedColor::Cyan));
        assert_eq!(config.rotate_delay_ms, 200);
    }

    #[test]
    fn tuning_converts_milliseconds() {
        let config = FlightConfig::default();
        let tuning = config.tuning();
        assert_eq!(tuning.rotate_delay, Duration::from_millis(200));
        assert_eq!(tuning.move_duration, Duration::from_millis(1000));
    }

    #[test]
    fn binding_matcher() {
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(matches_binding("q", &q));
        assert!(!matches_binding("c", &q));

        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(!matches_binding("q", &ctrl_q));
        assert!(matches_binding("Ctrl-q", &ctrl_q));

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(matches_binding("Esc", &esc));
    }
}
