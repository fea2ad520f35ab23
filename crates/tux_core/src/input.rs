//! Pointer gesture recognition: tap, long press, and touch-began location.
//!
//! Raw pointer transitions (`press` / `moved` / `release`) come from the window
//! layer in scene coordinates. The recognizer turns them into the small set of
//! gestures the game reacts to:
//!
//! - **TouchBegan:** emitted immediately on every press, carrying the X position.
//! - **Tap:** released before the long-press threshold was reached.
//! - **LongPressBegan / LongPressEnded:** the press was held for at least
//!   `min_press_duration_us`; the end is reported on release.
//!
//! A pointer that wanders further than `allowable_movement` before the long
//! press is recognized cancels the gesture: no tap, no long press. Once the long
//! press has begun, movement no longer matters.
//!
//! Time is passed in explicitly as integer microseconds so recognition is
//! deterministic under replay.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    TouchBegan { x: f32 },
    Tap,
    LongPressBegan,
    LongPressEnded,
}

#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    pub min_press_duration_us: u64,
    pub allowable_movement: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_press_duration_us: 500_000,
            allowable_movement: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PressPhase {
    Pending,
    LongPress,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct ActivePress {
    origin: (f32, f32),
    started_us: u64,
    phase: PressPhase,
}

pub struct GestureRecognizer {
    config: GestureConfig,
    active: Option<ActivePress>,
    pending: Vec<Gesture>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            active: None,
            pending: Vec::new(),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.active.is_some()
    }

    pub fn press(&mut self, x: f32, y: f32, now_us: u64) {
        // Single-pointer recognizer: a second finger is ignored until release.
        if self.active.is_some() {
            return;
        }
        self.active = Some(ActivePress {
            origin: (x, y),
            started_us: now_us,
            phase: PressPhase::Pending,
        });
        self.pending.push(Gesture::TouchBegan { x });
    }

    pub fn moved(&mut self, x: f32, y: f32) {
        let Some(press) = self.active.as_mut() else {
            return;
        };
        if press.phase != PressPhase::Pending {
            return;
        }
        let dx = x - press.origin.0;
        let dy = y - press.origin.1;
        let distance = dx.hypot(dy);
        if distance > self.config.allowable_movement {
            press.phase = PressPhase::Cancelled;
            log::trace!("Gesture cancelled: pointer moved {:.1} points", distance);
        }
    }

    /// Promote a held press to a long press once the threshold elapses.
    pub fn update(&mut self, now_us: u64) {
        let Some(press) = self.active.as_mut() else {
            return;
        };
        if press.phase == PressPhase::Pending
            && now_us.saturating_sub(press.started_us) >= self.config.min_press_duration_us
        {
            press.phase = PressPhase::LongPress;
            self.pending.push(Gesture::LongPressBegan);
        }
    }

    pub fn release(&mut self, now_us: u64) {
        // A release can arrive before the next update; recognize the long press first.
        self.update(now_us);
        let Some(press) = self.active.take() else {
            return;
        };
        match press.phase {
            PressPhase::Pending => self.pending.push(Gesture::Tap),
            PressPhase::LongPress => self.pending.push(Gesture::LongPressEnded),
            PressPhase::Cancelled => {}
        }
    }

    /// The platform withdrew the pointer. A pending press yields nothing; a
    /// running long press still reports its end.
    pub fn cancel(&mut self) {
        if let Some(press) = self.active.take() {
            if press.phase == PressPhase::LongPress {
                self.pending.push(Gesture::LongPressEnded);
            }
        }
    }

    /// Take every gesture recognized since the last drain, in order.
    pub fn drain(&mut self) -> Vec<Gesture> {
        std::mem::take(&mut self.pending)
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
