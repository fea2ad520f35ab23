//! Scripted horizontal moves, independent of physics velocity.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMove {
    start_x: f32,
    dx: f32,
    duration: f32,
    elapsed: f32,
    done: bool,
}

impl TimedMove {
    /// A non-positive duration lands on the target at the first `advance`.
    pub fn new(start_x: f32, dx: f32, duration: f32) -> Self {
        Self {
            start_x,
            dx,
            duration: duration.max(0.0),
            elapsed: 0.0,
            done: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    pub fn target_x(&self) -> f32 {
        self.start_x + self.dx
    }

    /// Returns the X for this step, or `None` once the move has completed.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        if self.done {
            return None;
        }
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        if self.elapsed >= self.duration {
            self.done = true;
            return Some(self.target_x());
        }
        let t = self.elapsed / self.duration;
        Some(self.start_x + self.dx * t)
    }
}

/// Holds at most one running move for the scene.
#[derive(Debug, Default)]
pub struct MoveRunner {
    current: Option<TimedMove>,
}

impl MoveRunner {
    pub fn start(&mut self, start_x: f32, dx: f32, duration: f32) {
        self.current = Some(TimedMove::new(start_x, dx, duration));
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        let current = self.current.as_mut()?;
        let step = current.advance(dt);
        if current.is_finished() {
            self.current = None;
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_linearly_to_target() {
        let mut mv = TimedMove::new(-100.0, 800.0, 8.0);
        assert_eq!(mv.advance(2.0), Some(100.0));
        assert_eq!(mv.advance(2.0), Some(300.0));
        assert_eq!(mv.advance(10.0), Some(700.0));
        assert!(mv.is_finished());
        assert_eq!(mv.advance(1.0), None);
    }

    #[test]
    fn negative_dx_moves_left() {
        let mut mv = TimedMove::new(0.0, -800.0, 8.0);
        assert_eq!(mv.advance(4.0), Some(-400.0));
        assert_eq!(mv.target_x(), -800.0);
    }

    #[test]
    fn zero_duration_jumps_to_target_once() {
        let mut mv = TimedMove::new(10.0, 5.0, 0.0);
        assert_eq!(mv.advance(0.016), Some(15.0));
        assert_eq!(mv.advance(0.016), None);
    }

    #[test]
    fn runner_stop_cancels_and_finish_clears() {
        let mut runner = MoveRunner::default();
        runner.start(0.0, 10.0, 1.0);
        assert!(runner.is_running());
        runner.stop();
        assert!(!runner.is_running());
        assert_eq!(runner.advance(0.5), None);

        runner.start(0.0, 10.0, 1.0);
        assert_eq!(runner.advance(0.5), Some(5.0));
        assert!(runner.is_running());
        assert_eq!(runner.advance(0.5), Some(10.0));
        assert!(!runner.is_running());
        assert_eq!(runner.advance(0.1), None);
    }

    #[test]
    fn restart_replaces_the_running_move() {
        let mut runner = MoveRunner::default();
        runner.start(0.0, 100.0, 1.0);
        runner.advance(0.5);
        runner.start(50.0, -100.0, 1.0);
        assert_eq!(runner.advance(0.5), Some(0.0));
    }
}
