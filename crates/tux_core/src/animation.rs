//! Frame-cycle sprite animation.
//!
//! A clip is an ordered list of texture keys with a per-frame duration. Timing
//! is integer microseconds so a clip advanced by the fixed simulation step
//! lands on the same frame on every run.

#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub texture: String,
    pub duration_us: u64,
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
    pub looping: bool,
}

impl AnimationClip {
    /// Build a clip where every frame is shown for the same duration.
    pub fn uniform<I, S>(textures: I, frame_duration_us: u64, looping: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let frames = textures
            .into_iter()
            .map(|texture| AnimationFrame {
                texture: texture.into(),
                duration_us: frame_duration_us,
            })
            .collect();
        Self { frames, looping }
    }

    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }

    pub fn first_texture(&self) -> Option<&str> {
        self.frames.first().map(|f| f.texture.as_str())
    }
}

/// Playback cursor for one running clip.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart(&mut self) {
        *self = Self::default();
    }

    /// Advance by `dt_us` and return the texture of the frame now showing.
    pub fn tick<'a>(&mut self, dt_us: u64, clip: &'a AnimationClip) -> &'a str {
        if clip.frames.is_empty() {
            return "";
        }
        if self.finished {
            return current_texture(clip, self.frame_index);
        }

        self.elapsed_us += dt_us;
        loop {
            let duration = clip.frames[self.frame_index].duration_us;
            // Zero-length frames would spin forever.
            if duration == 0 || self.elapsed_us < duration {
                break;
            }
            self.elapsed_us -= duration;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        &clip.frames[self.frame_index].texture
    }
}

fn current_texture(clip: &AnimationClip, index: usize) -> &str {
    clip.frames
        .get(index)
        .or(clip.frames.last())
        .map(|f| f.texture.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_clip() -> AnimationClip {
        AnimationClip::uniform(["walk_0", "walk_1", "walk_2"], 100_000, true)
    }

    #[test]
    fn tick_advances_one_frame_per_duration() {
        let clip = walk_clip();
        let mut state = AnimationState::new();

        assert_eq!(state.tick(0, &clip), "walk_0");
        assert_eq!(state.tick(99_999, &clip), "walk_0");
        assert_eq!(state.tick(1, &clip), "walk_1");
        assert_eq!(state.tick(100_000, &clip), "walk_2");
    }

    #[test]
    fn looping_clip_wraps_indefinitely() {
        let clip = walk_clip();
        let mut state = AnimationState::new();
        // 10 full cycles plus one frame.
        assert_eq!(state.tick(3_100_000, &clip), "walk_1");
        assert!(!state.finished);
    }

    #[test]
    fn one_shot_clip_holds_last_frame() {
        let clip = AnimationClip::uniform(["a", "b"], 100_000, false);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(500_000, &clip), "b");
        assert!(state.finished);
        assert_eq!(state.tick(100_000, &clip), "b");
    }

    #[test]
    fn restart_returns_to_first_frame() {
        let clip = walk_clip();
        let mut state = AnimationState::new();
        state.tick(250_000, &clip);
        assert_eq!(state.frame_index, 2);

        state.restart();
        assert_eq!(state.frame_index, 0);
        assert_eq!(state.elapsed_us, 0);
        assert_eq!(state.tick(0, &clip), "walk_0");
    }

    #[test]
    fn fixed_step_ticks_are_deterministic() {
        let clip = walk_clip();
        let mut a = AnimationState::new();
        let mut b = AnimationState::new();
        for _ in 0..200 {
            assert_eq!(a.tick(16_667, &clip), b.tick(16_667, &clip));
        }
        assert_eq!(a.frame_index, b.frame_index);
        assert_eq!(a.elapsed_us, b.elapsed_us);
    }

    #[test]
    fn empty_clip_yields_empty_texture() {
        let clip = AnimationClip::uniform(Vec::<String>::new(), 100_000, true);
        let mut state = AnimationState::new();
        assert_eq!(state.tick(10_000, &clip), "");
        assert_eq!(clip.first_texture(), None);
    }

    #[test]
    fn total_duration_sums_frames() {
        assert_eq!(walk_clip().total_duration_us(), 300_000);
    }
}
