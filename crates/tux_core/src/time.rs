//! Fixed-timestep frame clock.
//!
//! The host loop calls `begin_frame()` once per redraw, then drains whole
//! simulation steps with `next_step()`. Simulated time only moves in
//! `fixed_dt_us` increments, so gesture timestamps and animation ticks taken
//! from `sim_time_us()` are reproducible regardless of the display rate.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;
const DEFAULT_FIXED_DT_US: u64 = 16_667;
const MAX_FRAME_US: u64 = 250_000;

pub struct FrameClock {
    fixed_dt_us: u64,
    accumulator_us: u64,
    sim_time_us: u64,
    pub step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    last_instant: Instant,

    fps_samples: [u64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_step(DEFAULT_FIXED_DT_US)
    }

    pub fn with_step(fixed_dt_us: u64) -> Self {
        let fixed_dt_us = fixed_dt_us.max(1);
        Self {
            fixed_dt_us,
            accumulator_us: 0,
            sim_time_us: 0,
            step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            last_instant: Instant::now(),
            fps_samples: [fixed_dt_us; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1_000_000.0 / fixed_dt_us as f64,
            smoothed_frame_time_ms: fixed_dt_us as f64 / 1000.0,
        }
    }

    pub fn fixed_dt_us(&self) -> u64 {
        self.fixed_dt_us
    }

    /// Simulated time at the end of the last consumed step.
    pub fn sim_time_us(&self) -> u64 {
        self.sim_time_us
    }

    /// Measure wall-clock time since the previous frame and bank it.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed_us = now.duration_since(self.last_instant).as_micros() as u64;
        self.last_instant = now;
        self.advance(elapsed_us);
    }

    /// Bank `elapsed_us` of real time. Long stalls are clamped so a hitch
    /// cannot queue up seconds of catch-up steps.
    pub fn advance(&mut self, elapsed_us: u64) {
        let elapsed_us = if elapsed_us > MAX_FRAME_US {
            log::warn!(
                "Frame took {:.1}ms, clamping to {}ms",
                elapsed_us as f64 / 1000.0,
                MAX_FRAME_US / 1000
            );
            MAX_FRAME_US
        } else {
            elapsed_us
        };

        self.accumulator_us += elapsed_us;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = elapsed_us;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_us = self.fps_samples.iter().sum::<u64>() as f64 / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_us / 1000.0;
        self.smoothed_fps = if avg_us > 0.0 { 1_000_000.0 / avg_us } else { 0.0 };
    }

    /// Consume one fixed step if enough time is banked.
    pub fn next_step(&mut self) -> bool {
        if self.accumulator_us < self.fixed_dt_us {
            return false;
        }
        self.accumulator_us -= self.fixed_dt_us;
        self.sim_time_us += self.fixed_dt_us;
        self.step_count += 1;
        self.steps_this_frame += 1;
        true
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
