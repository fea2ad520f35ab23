//! Asset catalog: which textures draw the background and each Tux pose.
//!
//! The catalog file lists one entry per (motion state, direction) pair, each
//! with a non-empty list of frame textures. All six pairs must be present;
//! a gap is a startup error rather than a missing sprite mid-run.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use tux_core::animation::AnimationClip;

use crate::config::{check_version, read_json, ConfigError};
use crate::controller::{Direction, MotionState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub version: String,
    pub background: String,
    pub tux: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub state: MotionState,
    pub direction: Direction,
    pub frames: Vec<String>,
}

const POSE_COUNT: usize = MotionState::ALL.len() * Direction::ALL.len();

fn slot(state: MotionState, direction: Direction) -> usize {
    let state_index = match state {
        MotionState::Standing => 0,
        MotionState::Walking => 1,
        MotionState::Jumping => 2,
    };
    let direction_index = match direction {
        Direction::Left => 0,
        Direction::Right => 1,
    };
    state_index * Direction::ALL.len() + direction_index
}

/// Validated catalog. Every pose has at least one frame.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    background: String,
    poses: [Vec<String>; POSE_COUNT],
}

impl AssetCatalog {
    pub fn from_file(file: CatalogFile) -> Result<Self, ConfigError> {
        check_version("asset catalog", &file.version)?;
        if file.background.trim().is_empty() {
            return Err(ConfigError::invalid(
                "asset catalog",
                "background texture path is empty",
            ));
        }

        let mut poses: [Vec<String>; POSE_COUNT] = Default::default();
        for entry in file.tux {
            let pose = format!("{}/{}", entry.state.label(), entry.direction.label());
            if entry.frames.is_empty() {
                return Err(ConfigError::invalid(
                    "asset catalog",
                    format!("pose {pose} has no frames"),
                ));
            }
            if entry.frames.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    "asset catalog",
                    format!("pose {pose} has an empty frame path"),
                ));
            }
            let target = &mut poses[slot(entry.state, entry.direction)];
            if !target.is_empty() {
                return Err(ConfigError::invalid(
                    "asset catalog",
                    format!("duplicate pose {pose}"),
                ));
            }
            *target = entry.frames;
        }

        for state in MotionState::ALL {
            for direction in Direction::ALL {
                if poses[slot(state, direction)].is_empty() {
                    return Err(ConfigError::invalid(
                        "asset catalog",
                        format!("missing pose {}/{}", state.label(), direction.label()),
                    ));
                }
            }
        }

        Ok(Self {
            background: file.background,
            poses,
        })
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn frames(&self, state: MotionState, direction: Direction) -> &[String] {
        &self.poses[slot(state, direction)]
    }

    /// Still texture for a pose.
    pub fn first_frame(&self, state: MotionState, direction: Direction) -> &str {
        &self.frames(state, direction)[0]
    }

    pub fn clip(
        &self,
        state: MotionState,
        direction: Direction,
        frame_duration_us: u64,
        looping: bool,
    ) -> AnimationClip {
        AnimationClip::uniform(
            self.frames(state, direction).iter().cloned(),
            frame_duration_us,
            looping,
        )
    }

    /// Every texture the catalog references, sorted and deduplicated.
    pub fn texture_paths(&self) -> BTreeSet<&str> {
        let mut paths = BTreeSet::new();
        paths.insert(self.background.as_str());
        for frames in &self.poses {
            paths.extend(frames.iter().map(String::as_str));
        }
        paths
    }

    /// Fails on the first referenced texture that is not a file under `root`.
    pub fn preflight(&self, root: &Path) -> Result<(), ConfigError> {
        for path in self.texture_paths() {
            if !root.join(path).is_file() {
                return Err(ConfigError::invalid(
                    "asset catalog",
                    format!("texture '{path}' not found"),
                ));
            }
        }
        Ok(())
    }
}

pub fn load_catalog(path: &Path) -> Result<AssetCatalog, ConfigError> {
    let file: CatalogFile = read_json(path)?;
    AssetCatalog::from_file(file)
}

#[cfg(test)]
pub(crate) fn sample_catalog_file() -> CatalogFile {
    let mut tux = Vec::new();
    for state in MotionState::ALL {
        for direction in Direction::ALL {
            let count = if state == MotionState::Walking { 3 } else { 1 };
            let frames = (0..count)
                .map(|i| format!("tux_{}_{}_{i}.png", state.label(), direction.label()))
                .collect();
            tux.push(CatalogEntry {
                state,
                direction,
                frames,
            });
        }
    }
    CatalogFile {
        version: "0.1".to_string(),
        background: "background.png".to_string(),
        tux,
    }
}
