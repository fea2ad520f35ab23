//! The playable scene: background loop, invisible floor, and Tux.
//!
//! `GameScene` owns every mutable piece of the simulation. Input arrives as
//! recognized gestures through `handle_gesture`; time advances through
//! `tick`. Both paths run the controller and apply the effects it returns
//! (physics impulses, scripted moves, visual swaps, animation changes), so the
//! controller itself stays free of scene knowledge.
//!
//! The scene starts idle. The first tap begins the run instead of jumping;
//! until then all other gestures are dropped and the background holds still.
//! Physics runs from the first tick so Tux settles onto the floor.

use glam::Vec2;

use tux_core::animation::{AnimationClip, AnimationState};
use tux_core::input::Gesture;

use crate::actions::MoveRunner;
use crate::background::BackgroundLoop;
use crate::catalog::AssetCatalog;
use crate::config::{ConfigError, GameConfig, ViewportConfig};
use crate::controller::{
    Character, CharacterController, ControllerEvent, ControllerTuning, Direction, Effect,
    MotionState,
};
use crate::physics::{validate_categories, Aabb, Body, BodyId, Category, PhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Background(usize),
    Floor,
    Tux,
}

/// One drawable rectangle. Nodes are kept in draw order, back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub texture: String,
    pub center: Vec2,
    pub size: Vec2,
    pub visible: bool,
}

pub struct GameScene {
    viewport: ViewportConfig,
    catalog: AssetCatalog,
    controller: CharacterController,
    physics: PhysicsWorld,
    tux_body: BodyId,
    tux_size: Vec2,
    mover: MoveRunner,
    background: BackgroundLoop,
    scroll_step: f32,
    walk_frame_us: u64,
    // Clip of the running animation; `anim_cursor` restarts with each new clip.
    animation: Option<AnimationClip>,
    anim_cursor: AnimationState,
    nodes: Vec<SceneNode>,
    begun: bool,
}

impl GameScene {
    pub fn new(
        config: &GameConfig,
        viewport: ViewportConfig,
        catalog: AssetCatalog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_categories().map_err(|e| ConfigError::invalid("collision categories", e))?;

        let ViewportConfig { width, height } = viewport;
        let mut physics = PhysicsWorld::new(Vec2::new(0.0, config.gravity));
        let floor_size = Vec2::new(width, height * config.floor_height_ratio);
        let floor_center = Vec2::new(0.0, -height / 2.0);
        physics.add(Body::fixed(
            Category::Ground,
            Aabb::from_size(floor_center, floor_size),
        ));

        let tux_size = Vec2::from(config.tux_size);
        let tux_start = Vec2::new(-width / 2.5, 0.0);
        let tux_body = physics.add(Body::dynamic(
            Category::Player,
            Aabb::from_size(tux_start, tux_size),
            config.tux_mass,
        ));

        let background = BackgroundLoop::new(width);
        let mut nodes = Vec::with_capacity(background.tile_positions().len() + 2);
        for (index, x) in background.tile_positions().iter().enumerate() {
            nodes.push(SceneNode {
                kind: NodeKind::Background(index),
                texture: catalog.background().to_string(),
                center: Vec2::new(*x, 0.0),
                size: Vec2::new(width, height),
                visible: true,
            });
        }
        nodes.push(SceneNode {
            kind: NodeKind::Floor,
            texture: String::new(),
            center: floor_center,
            size: floor_size,
            visible: false,
        });

        let controller = CharacterController::new(ControllerTuning::from(config));
        let character = controller.character();
        nodes.push(SceneNode {
            kind: NodeKind::Tux,
            texture: catalog
                .first_frame(character.state, character.facing)
                .to_string(),
            center: tux_start,
            size: tux_size,
            visible: true,
        });

        log::info!(
            "Scene ready: {}x{} points, {} nodes",
            width,
            height,
            nodes.len()
        );

        Ok(Self {
            viewport,
            catalog,
            controller,
            physics,
            tux_body,
            tux_size,
            mover: MoveRunner::default(),
            background,
            scroll_step: config.scroll_step,
            walk_frame_us: config.walk_frame_us(),
            animation: None,
            anim_cursor: AnimationState::new(),
            nodes,
            begun: false,
        })
    }

    pub fn begun(&self) -> bool {
        self.begun
    }

    pub fn character(&self) -> Character {
        self.controller.character()
    }

    pub fn state(&self) -> MotionState {
        self.controller.state()
    }

    pub fn facing(&self) -> Direction {
        self.controller.facing()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tux_position(&self) -> Vec2 {
        self.physics.body(self.tux_body).aabb.center
    }

    pub fn tux_velocity(&self) -> Vec2 {
        self.physics.body(self.tux_body).velocity
    }

    #[cfg(test)]
    pub fn tux_node(&self) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Tux)
    }

    #[cfg(test)]
    pub fn background(&self) -> &BackgroundLoop {
        &self.background
    }

    pub fn is_moving(&self) -> bool {
        self.mover.is_running()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) {
        if !self.begun {
            if gesture == Gesture::Tap {
                self.begun = true;
                log::info!("Run started");
            }
            return;
        }

        let event = match gesture {
            Gesture::TouchBegan { x } => ControllerEvent::TouchBegan { x },
            Gesture::Tap => ControllerEvent::Tap,
            Gesture::LongPressBegan => ControllerEvent::LongPressBegan,
            Gesture::LongPressEnded => ControllerEvent::LongPressEnded,
        };
        self.dispatch(event);
    }

    /// One fixed simulation step of `dt_us` microseconds.
    pub fn tick(&mut self, dt_us: u64) {
        let dt = dt_us as f32 / 1_000_000.0;

        if let Some(x) = self.mover.advance(dt) {
            let x = self.clamp_to_viewport(x);
            self.physics.set_position_x(self.tux_body, x);
        }

        let contacts = self.physics.step(dt);
        let mut landed = false;
        for contact in contacts {
            let involves_tux = contact.a == self.tux_body || contact.b == self.tux_body;
            if involves_tux && contact.is_between(Category::Player, Category::Ground) {
                self.dispatch(ControllerEvent::GroundContact);
                landed = true;
            }
        }
        // A jump too weak to leave the floor never ends its contact.
        if !landed
            && self.controller.state() == MotionState::Jumping
            && self.physics.is_resting(self.tux_body)
        {
            log::debug!("Jump never left the ground, landing");
            self.dispatch(ControllerEvent::GroundContact);
        }

        if self.begun {
            self.background.scroll(self.scroll_step);
        }

        let frame = match &self.animation {
            Some(clip) => Some(self.anim_cursor.tick(dt_us, clip).to_string()),
            None => None,
        };
        if let Some(texture) = frame {
            self.set_tux_texture(texture);
        }

        self.sync_nodes();
    }

    fn dispatch(&mut self, event: ControllerEvent) {
        for effect in self.controller.handle(event) {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CreateVisual { state, direction } => {
                self.nodes.retain(|n| n.kind != NodeKind::Tux);
                // A fresh node carries no running animation.
                self.animation = None;
                self.nodes.push(SceneNode {
                    kind: NodeKind::Tux,
                    texture: self.catalog.first_frame(state, direction).to_string(),
                    center: self.tux_position(),
                    size: self.tux_size,
                    visible: true,
                });
            }
            Effect::ApplyImpulse(impulse) => {
                self.physics.apply_impulse(self.tux_body, impulse);
            }
            Effect::RunTimedMove { dx, duration } => {
                let start_x = self.tux_position().x;
                self.mover.start(start_x, dx, duration);
            }
            Effect::StopMove => self.mover.stop(),
            Effect::StartAnimation {
                state,
                direction,
                looping,
            } => {
                let clip = self
                    .catalog
                    .clip(state, direction, self.walk_frame_us, looping);
                if let Some(first) = clip.first_texture() {
                    let first = first.to_string();
                    self.set_tux_texture(first);
                }
                self.anim_cursor.restart();
                self.animation = Some(clip);
            }
            Effect::StopAnimation => self.animation = None,
        }
    }

    fn clamp_to_viewport(&self, x: f32) -> f32 {
        let limit = (self.viewport.width - self.tux_size.x).max(0.0) / 2.0;
        x.clamp(-limit, limit)
    }

    fn set_tux_texture(&mut self, texture: String) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.kind == NodeKind::Tux) {
            node.texture = texture;
        }
    }

    fn sync_nodes(&mut self) {
        let tux_center = self.tux_position();
        let tiles = *self.background.tile_positions();
        for node in &mut self.nodes {
            match node.kind {
                NodeKind::Background(index) => node.center.x = tiles[index],
                NodeKind::Tux => node.center = tux_center,
                NodeKind::Floor => {}
            }
        }
    }
}
