//! Tux's motion state machine.
//!
//! The controller never touches physics or rendering directly. Each input or
//! contact event goes through `transition`, a pure function of the current
//! character and the event, which returns the next character plus the effects
//! the scene must carry out (impulses, scripted moves, visual swaps,
//! animation start/stop). `CharacterController` commits the result and logs
//! state changes.
//!
//! Priority rules where gestures overlap:
//!  - A tap while walking jumps; the scripted walk keeps running in the air.
//!  - A long press that begins mid-jump is ignored; the jump must land first.
//!  - Releasing a long press mid-jump stops the walk but keeps `Jumping`
//!    until ground contact.

use glam::Vec2;
use serde::Deserialize;

use crate::config::GameConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Left, Direction::Right];

    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Standing,
    Walking,
    Jumping,
}

impl MotionState {
    pub const ALL: [MotionState; 3] = [
        MotionState::Standing,
        MotionState::Walking,
        MotionState::Jumping,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Standing => "standing",
            Self::Walking => "walking",
            Self::Jumping => "jumping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    Tap,
    LongPressBegan,
    LongPressEnded,
    TouchBegan { x: f32 },
    GroundContact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Replace the character's visual node with one bound to this pair.
    CreateVisual {
        state: MotionState,
        direction: Direction,
    },
    ApplyImpulse(Vec2),
    /// Scripted horizontal move by `dx` points over `duration` seconds.
    RunTimedMove {
        dx: f32,
        duration: f32,
    },
    StopMove,
    StartAnimation {
        state: MotionState,
        direction: Direction,
        looping: bool,
    },
    StopAnimation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Character {
    pub state: MotionState,
    pub facing: Direction,
    /// True while a long press is driving a sustained walk.
    pub walking: bool,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            state: MotionState::Standing,
            facing: Direction::Right,
            walking: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerTuning {
    pub jump_impulse: f32,
    pub walk_distance: f32,
    pub walk_duration: f32,
    pub facing_threshold_x: f32,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

impl From<&GameConfig> for ControllerTuning {
    fn from(config: &GameConfig) -> Self {
        Self {
            jump_impulse: config.jump_impulse,
            walk_distance: config.walk_distance,
            walk_duration: config.walk_duration_s,
            facing_threshold_x: config.facing_threshold_x,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Character,
    pub effects: Vec<Effect>,
}

pub fn transition(
    character: &Character,
    event: ControllerEvent,
    tuning: &ControllerTuning,
) -> Transition {
    use ControllerEvent as E;
    use MotionState as S;

    let mut next = *character;
    let mut effects = Vec::new();

    match (character.state, event) {
        (_, E::TouchBegan { x }) => {
            next.facing = if x > tuning.facing_threshold_x {
                Direction::Right
            } else {
                Direction::Left
            };
        }

        (S::Jumping, E::Tap) => {}
        (S::Standing | S::Walking, E::Tap) => {
            next.state = S::Jumping;
            effects.push(visual(next));
            effects.push(Effect::ApplyImpulse(Vec2::new(0.0, tuning.jump_impulse)));
        }

        (S::Standing, E::LongPressBegan) => {
            next.state = S::Walking;
            next.walking = true;
            effects.push(visual(next));
            effects.push(Effect::RunTimedMove {
                dx: next.facing.sign() * tuning.walk_distance,
                duration: tuning.walk_duration,
            });
            effects.push(walk_animation(next));
        }
        (S::Walking | S::Jumping, E::LongPressBegan) => {}

        (S::Walking, E::LongPressEnded) => {
            next.state = S::Standing;
            next.walking = false;
            effects.push(Effect::StopMove);
            effects.push(Effect::StopAnimation);
            effects.push(visual(next));
        }
        (S::Jumping, E::LongPressEnded) => {
            if next.walking {
                next.walking = false;
                effects.push(Effect::StopMove);
            }
        }
        (S::Standing, E::LongPressEnded) => {
            next.walking = false;
        }

        (S::Jumping, E::GroundContact) => {
            if next.walking {
                next.state = S::Walking;
                effects.push(visual(next));
                effects.push(walk_animation(next));
            } else {
                next.state = S::Standing;
                effects.push(visual(next));
            }
        }
        (S::Walking, E::GroundContact) => {
            if !next.walking {
                next.state = S::Standing;
                effects.push(Effect::StopAnimation);
                effects.push(visual(next));
            }
        }
        (S::Standing, E::GroundContact) => {}
    }

    Transition { next, effects }
}

fn visual(character: Character) -> Effect {
    Effect::CreateVisual {
        state: character.state,
        direction: character.facing,
    }
}

fn walk_animation(character: Character) -> Effect {
    Effect::StartAnimation {
        state: character.state,
        direction: character.facing,
        looping: true,
    }
}

pub struct CharacterController {
    character: Character,
    tuning: ControllerTuning,
}

impl CharacterController {
    pub fn new(tuning: ControllerTuning) -> Self {
        Self {
            character: Character::default(),
            tuning,
        }
    }

    pub fn character(&self) -> Character {
        self.character
    }

    pub fn state(&self) -> MotionState {
        self.character.state
    }

    pub fn facing(&self) -> Direction {
        self.character.facing
    }

    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Effect> {
        let Transition { next, effects } = transition(&self.character, event, &self.tuning);
        if next.state != self.character.state {
            log::debug!(
                "Tux {} -> {} ({:?}, facing {})",
                self.character.state.label(),
                next.state.label(),
                event,
                next.facing.label()
            );
        }
        self.character = next;
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> ControllerTuning {
        ControllerTuning {
            jump_impulse: 40.0,
            walk_distance: 800.0,
            walk_duration: 8.0,
            facing_threshold_x: 0.0,
        }
    }

    fn character(state: MotionState, walking: bool) -> Character {
        Character {
            state,
            facing: Direction::Right,
            walking,
        }
    }

    fn impulses(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::ApplyImpulse(_)))
            .count()
    }

    #[test]
    fn starts_standing_facing_right() {
        let controller = CharacterController::new(tuning());
        assert_eq!(controller.state(), MotionState::Standing);
        assert_eq!(controller.facing(), Direction::Right);
        assert!(!controller.character().walking);
    }

    #[test]
    fn tap_while_standing_jumps_with_one_upward_impulse() {
        let t = transition(&character(MotionState::Standing, false), ControllerEvent::Tap, &tuning());
        assert_eq!(t.next.state, MotionState::Jumping);
        assert_eq!(impulses(&t.effects), 1);
        assert!(t.effects.contains(&Effect::ApplyImpulse(Vec2::new(0.0, 40.0))));
        assert!(t.effects.contains(&Effect::CreateVisual {
            state: MotionState::Jumping,
            direction: Direction::Right,
        }));
    }

    #[test]
    fn tap_while_jumping_never_double_jumps() {
        for walking in [false, true] {
            let before = character(MotionState::Jumping, walking);
            let t = transition(&before, ControllerEvent::Tap, &tuning());
            assert_eq!(t.next, before);
            assert_eq!(impulses(&t.effects), 0);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn repeated_taps_apply_exactly_one_impulse_until_landing() {
        let mut controller = CharacterController::new(tuning());
        let mut total = 0;
        for _ in 0..5 {
            total += impulses(&controller.handle(ControllerEvent::Tap));
        }
        assert_eq!(total, 1);

        controller.handle(ControllerEvent::GroundContact);
        assert_eq!(controller.state(), MotionState::Standing);
        assert_eq!(impulses(&controller.handle(ControllerEvent::Tap)), 1);
    }

    #[test]
    fn long_press_walks_in_facing_direction_and_release_stands() {
        let mut controller = CharacterController::new(tuning());
        controller.handle(ControllerEvent::TouchBegan { x: -120.0 });

        let effects = controller.handle(ControllerEvent::LongPressBegan);
        assert_eq!(controller.state(), MotionState::Walking);
        assert!(controller.character().walking);
        assert!(effects.contains(&Effect::RunTimedMove {
            dx: -800.0,
            duration: 8.0,
        }));
        assert!(effects.contains(&Effect::StartAnimation {
            state: MotionState::Walking,
            direction: Direction::Left,
            looping: true,
        }));

        let effects = controller.handle(ControllerEvent::LongPressEnded);
        assert_eq!(controller.state(), MotionState::Standing);
        assert!(!controller.character().walking);
        assert!(effects.contains(&Effect::StopMove));
        assert!(effects.contains(&Effect::StopAnimation));
        assert!(effects.contains(&Effect::CreateVisual {
            state: MotionState::Standing,
            direction: Direction::Left,
        }));
    }

    #[test]
    fn every_state_change_recreates_the_visual_once() {
        let mut controller = CharacterController::new(tuning());
        let script = [
            ControllerEvent::LongPressBegan,
            ControllerEvent::LongPressEnded,
            ControllerEvent::Tap,
            ControllerEvent::GroundContact,
        ];
        for event in script {
            let before = controller.state();
            let effects = controller.handle(event);
            let visuals = effects
                .iter()
                .filter(|e| matches!(e, Effect::CreateVisual { .. }))
                .count();
            let expected = usize::from(before != controller.state());
            assert_eq!(visuals, expected, "event {event:?}");
        }
    }

    #[test]
    fn touch_position_sets_facing_in_every_state() {
        for state in MotionState::ALL {
            for walking in [false, true] {
                let before = character(state, walking);

                let right = transition(&before, ControllerEvent::TouchBegan { x: 0.5 }, &tuning());
                assert_eq!(right.next.facing, Direction::Right);
                assert_eq!(right.next.state, state);

                let at = transition(&before, ControllerEvent::TouchBegan { x: 0.0 }, &tuning());
                assert_eq!(at.next.facing, Direction::Left);
                assert_eq!(at.next.state, state);

                let left = transition(&before, ControllerEvent::TouchBegan { x: -300.0 }, &tuning());
                assert_eq!(left.next.facing, Direction::Left);
                assert!(left.effects.is_empty());
            }
        }
    }

    #[test]
    fn facing_threshold_is_configurable() {
        let tuning = ControllerTuning {
            facing_threshold_x: 100.0,
            ..tuning()
        };
        let t = transition(
            &Character::default(),
            ControllerEvent::TouchBegan { x: 50.0 },
            &tuning,
        );
        assert_eq!(t.next.facing, Direction::Left);
    }

    #[test]
    fn ground_contact_while_walking_without_hold_stands() {
        let t = transition(
            &character(MotionState::Walking, false),
            ControllerEvent::GroundContact,
            &tuning(),
        );
        assert_eq!(t.next.state, MotionState::Standing);
        assert!(t.effects.contains(&Effect::StopAnimation));
    }

    #[test]
    fn ground_contact_while_walking_and_holding_keeps_walking() {
        let before = character(MotionState::Walking, true);
        let t = transition(&before, ControllerEvent::GroundContact, &tuning());
        assert_eq!(t.next, before);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn landing_returns_to_standing_or_walking() {
        let t = transition(
            &character(MotionState::Jumping, false),
            ControllerEvent::GroundContact,
            &tuning(),
        );
        assert_eq!(t.next.state, MotionState::Standing);

        let t = transition(
            &character(MotionState::Jumping, true),
            ControllerEvent::GroundContact,
            &tuning(),
        );
        assert_eq!(t.next.state, MotionState::Walking);
        assert!(t
            .effects
            .iter()
            .any(|e| matches!(e, Effect::StartAnimation { looping: true, .. })));
    }

    #[test]
    fn long_press_mid_jump_is_ignored() {
        let before = character(MotionState::Jumping, false);
        let t = transition(&before, ControllerEvent::LongPressBegan, &tuning());
        assert_eq!(t.next, before);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn tap_mid_walk_jumps_and_keeps_the_walk() {
        let mut controller = CharacterController::new(tuning());
        controller.handle(ControllerEvent::LongPressBegan);
        let effects = controller.handle(ControllerEvent::Tap);
        assert_eq!(controller.state(), MotionState::Jumping);
        assert!(controller.character().walking);
        assert_eq!(impulses(&effects), 1);
        assert!(!effects.contains(&Effect::StopMove));

        // Still holding on landing: back to walking.
        controller.handle(ControllerEvent::GroundContact);
        assert_eq!(controller.state(), MotionState::Walking);
    }

    #[test]
    fn release_mid_jump_stops_walk_but_stays_airborne() {
        let mut controller = CharacterController::new(tuning());
        controller.handle(ControllerEvent::LongPressBegan);
        controller.handle(ControllerEvent::Tap);

        let effects = controller.handle(ControllerEvent::LongPressEnded);
        assert_eq!(controller.state(), MotionState::Jumping);
        assert!(!controller.character().walking);
        assert_eq!(effects, vec![Effect::StopMove]);

        controller.handle(ControllerEvent::GroundContact);
        assert_eq!(controller.state(), MotionState::Standing);
    }

    #[test]
    fn impulses_and_visuals_follow_state_changes_for_every_pair() {
        let events = [
            ControllerEvent::Tap,
            ControllerEvent::LongPressBegan,
            ControllerEvent::LongPressEnded,
            ControllerEvent::TouchBegan { x: 1.0 },
            ControllerEvent::GroundContact,
        ];
        for state in MotionState::ALL {
            for walking in [false, true] {
                for facing in Direction::ALL {
                    let before = Character {
                        state,
                        facing,
                        walking,
                    };
                    for event in events {
                        let t = transition(&before, event, &tuning());
                        let jumped = event == ControllerEvent::Tap && state != MotionState::Jumping;
                        assert_eq!(impulses(&t.effects), usize::from(jumped));

                        let visuals = t
                            .effects
                            .iter()
                            .filter(|e| matches!(e, Effect::CreateVisual { .. }))
                            .count();
                        assert_eq!(visuals, usize::from(t.next.state != state));
                    }
                }
            }
        }
    }
}
