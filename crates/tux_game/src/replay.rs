use serde::Deserialize;
use std::fs;
use std::path::Path;

use tux_core::input::Gesture;

use crate::scene::GameScene;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt_us")]
    pub fixed_dt_us: u64,
    pub frames: Vec<ReplayFrame>,
}

/// Gestures are delivered before the first of `repeat` ticks.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub gestures: Vec<Gesture>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn run(&self, scene: &mut GameScene) {
        for frame in &self.frames {
            for gesture in &frame.gestures {
                scene.handle_gesture(*gesture);
            }
            for _ in 0..frame.repeat.max(1) {
                scene.tick(self.fixed_dt_us);
            }
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat.max(1))).sum()
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt_us == 0 {
        return Err("Replay validation failed: fixed_dt_us must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt_us() -> u64 {
    16_667
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_catalog_file, AssetCatalog};
    use crate::config::{GameConfig, ViewportConfig};
    use crate::controller::{Direction, MotionState};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tux_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn new_scene() -> GameScene {
        let catalog = AssetCatalog::from_file(sample_catalog_file()).expect("catalog");
        let viewport = ViewportConfig::new(1024.0, 768.0).expect("viewport");
        GameScene::new(&GameConfig::default(), viewport, catalog).expect("scene")
    }

    const SCRIPT: &str = r#"{
      "fixed_dt_us": 16667,
      "frames": [
        { "repeat": 30 },
        { "gestures": [{ "kind": "touch_began", "x": 200.0 }, { "kind": "tap" }], "repeat": 10 },
        { "gestures": [{ "kind": "touch_began", "x": 200.0 }, { "kind": "long_press_began" }], "repeat": 90 },
        { "gestures": [{ "kind": "tap" }], "repeat": 20 },
        { "gestures": [{ "kind": "long_press_ended" }], "repeat": 80 },
        { "gestures": [{ "kind": "touch_began", "x": -50.0 }, { "kind": "tap" }], "repeat": 45 }
      ]
    }"#;

    #[test]
    fn replay_file_parses_gesture_kinds() {
        let path = temp_file_path("parse");
        fs::write(&path, SCRIPT).expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.frames.len(), 6);
        assert_eq!(replay.tick_count(), 275);
        assert_eq!(
            replay.frames[2].gestures,
            vec![Gesture::TouchBegan { x: 200.0 }, Gesture::LongPressBegan]
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_script() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty script should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(&path, SCRIPT).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");

        let mut run_a = new_scene();
        let mut run_b = new_scene();
        replay.run(&mut run_a);
        replay.run(&mut run_b);

        assert_eq!(run_a.tux_position(), run_b.tux_position());
        assert_eq!(run_a.tux_velocity(), run_b.tux_velocity());
        assert_eq!(run_a.character(), run_b.character());
        assert_eq!(
            run_a.background().tile_positions(),
            run_b.background().tile_positions()
        );
        assert_eq!(run_a.nodes(), run_b.nodes());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_walks_jumps_and_ends_mid_air_facing_left() {
        let replay: ReplaySequence = serde_json::from_str(SCRIPT).expect("parse script");
        let mut scene = new_scene();
        let start_x = scene.tux_position().x;
        replay.run(&mut scene);

        assert!(scene.begun());
        // Walked right for 110 ticks (90 on foot, 20 in the air).
        assert!(scene.tux_position().x > start_x + 100.0);
        // The final tap launched a jump 45 ticks ago; still airborne.
        assert_eq!(scene.state(), MotionState::Jumping);
        assert_eq!(scene.facing(), Direction::Left);
        assert!(!scene.is_moving());
    }
}
