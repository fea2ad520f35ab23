//! Gameplay tunables and viewport geometry.
//!
//! Everything the scene needs is validated once at startup. A bad value is a
//! `ConfigError` naming the file and field, never a panic in the running loop.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tux_core::input::GestureConfig;

const SUPPORTED_VERSION: &str = "0.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {message}")]
    Invalid { context: String, message: String },
}

impl ConfigError {
    pub fn invalid(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn check_version(context: &str, version: &str) -> Result<(), ConfigError> {
    if version != SUPPORTED_VERSION {
        return Err(ConfigError::invalid(
            context,
            format!("unsupported version '{version}'"),
        ));
    }
    Ok(())
}

/// Scene size in logical points, fixed for the lifetime of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl ViewportConfig {
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::invalid(
                "viewport",
                format!("size must be positive, got {width}x{height}"),
            ));
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub version: String,
    /// Upward impulse applied on jump, in mass * points / second.
    pub jump_impulse: f32,
    pub tux_mass: f32,
    pub tux_size: [f32; 2],
    /// Horizontal distance of one scripted walk, in points.
    pub walk_distance: f32,
    pub walk_duration_s: f32,
    pub walk_frame_ms: u64,
    /// Background scroll per simulation step once the run has begun.
    pub scroll_step: f32,
    pub facing_threshold_x: f32,
    pub gravity: f32,
    pub floor_height_ratio: f32,
    pub long_press_ms: u64,
    pub allowable_movement: f32,
    pub show_stats: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            jump_impulse: 40.0,
            tux_mass: 0.06,
            tux_size: [64.0, 80.0],
            walk_distance: 800.0,
            walk_duration_s: 8.0,
            walk_frame_ms: 100,
            scroll_step: 2.0,
            facing_threshold_x: 0.0,
            // 9.8 m/s^2 at 150 points per metre.
            gravity: -1470.0,
            floor_height_ratio: 0.84,
            long_press_ms: 500,
            allowable_movement: 10.0,
            show_stats: true,
        }
    }
}

impl GameConfig {
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            min_press_duration_us: self.long_press_ms * 1000,
            allowable_movement: self.allowable_movement,
        }
    }

    pub fn walk_frame_us(&self) -> u64 {
        self.walk_frame_ms * 1000
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_version("game config", &self.version)?;

        let positive = [
            ("jump_impulse", self.jump_impulse),
            ("tux_mass", self.tux_mass),
            ("tux_size[0]", self.tux_size[0]),
            ("tux_size[1]", self.tux_size[1]),
            ("walk_distance", self.walk_distance),
            ("walk_duration_s", self.walk_duration_s),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(
                    "game config",
                    format!("{field} must be > 0, got {value}"),
                ));
            }
        }
        if !self.scroll_step.is_finite() || self.scroll_step < 0.0 {
            return Err(ConfigError::invalid(
                "game config",
                "scroll_step must be >= 0",
            ));
        }
        if !self.gravity.is_finite() || self.gravity >= 0.0 {
            return Err(ConfigError::invalid(
                "game config",
                "gravity must pull downward (< 0)",
            ));
        }
        if !(self.floor_height_ratio > 0.0 && self.floor_height_ratio <= 1.0) {
            return Err(ConfigError::invalid(
                "game config",
                "floor_height_ratio must be in (0, 1]",
            ));
        }
        if self.walk_frame_ms == 0 {
            return Err(ConfigError::invalid(
                "game config",
                "walk_frame_ms must be > 0",
            ));
        }
        if self.long_press_ms == 0 {
            return Err(ConfigError::invalid(
                "game config",
                "long_press_ms must be > 0",
            ));
        }
        if !self.facing_threshold_x.is_finite() {
            return Err(ConfigError::invalid(
                "game config",
                "facing_threshold_x must be finite",
            ));
        }
        if !self.allowable_movement.is_finite() || self.allowable_movement < 0.0 {
            return Err(ConfigError::invalid(
                "game config",
                "allowable_movement must be >= 0",
            ));
        }
        Ok(())
    }
}

pub fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let config: GameConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tux_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_are_valid() {
        GameConfig::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "version": "0.1", "jump_impulse": 55.0 }"#).expect("write");

        let config = load_game_config(&path).expect("partial config should load");
        assert_eq!(config.jump_impulse, 55.0);
        assert_eq!(config.walk_distance, 800.0);
        assert_eq!(config.walk_frame_us(), 100_000);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let path = temp_file_path("unknown");
        fs::write(&path, r#"{ "version": "0.1", "jump_impluse": 55.0 }"#).expect("write");

        let err = load_game_config(&path).expect_err("typo should be rejected");
        assert!(matches!(err, ConfigError::Parse { .. }));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = temp_file_path("missing");
        let err = load_game_config(&path).expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn rejects_unsupported_version() {
        let config = GameConfig {
            version: "2.0".to_string(),
            ..GameConfig::default()
        };
        let err = config.validate().expect_err("version should fail");
        assert!(err.to_string().contains("unsupported version"));
    }

    #[test]
    fn rejects_non_positive_mass() {
        let config = GameConfig {
            tux_mass: 0.0,
            ..GameConfig::default()
        };
        let err = config.validate().expect_err("zero mass should fail");
        assert!(err.to_string().contains("tux_mass"));
    }

    #[test]
    fn rejects_upward_gravity() {
        let config = GameConfig {
            gravity: 9.8,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn gesture_config_converts_to_microseconds() {
        let gestures = GameConfig::default().gesture_config();
        assert_eq!(gestures.min_press_duration_us, 500_000);
        assert_eq!(gestures.allowable_movement, 10.0);
    }

    #[test]
    fn viewport_rejects_empty_size() {
        assert!(ViewportConfig::new(0.0, 600.0).is_err());
        assert!(ViewportConfig::new(800.0, f32::NAN).is_err());
        let viewport = ViewportConfig::new(800.0, 600.0).expect("valid viewport");
        assert_eq!(viewport.width, 800.0);
    }
}
