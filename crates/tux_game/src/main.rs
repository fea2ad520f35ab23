//! Tux Runner -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Pointer
//! and touch events feed the gesture recognizer as they arrive; all simulation
//! runs inside `RedrawRequested` on a **fixed timestep** (see `FrameClock`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while next_step()` -- promote long presses, deliver gestures, tick scene
//!   3. Rebuild the sprite batch from the scene's nodes
//!   4. Upload camera uniform, issue draw calls, composite the stats overlay
//!
//! Configuration, the asset catalog, and every texture it names are checked
//! before the window opens. Any failure there is fatal and exits non-zero.

mod actions;
mod background;
mod catalog;
mod config;
mod controller;
mod physics;
#[cfg(test)]
mod replay;
mod scene;

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use glam::Vec2;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use catalog::{load_catalog, AssetCatalog};
use config::{load_game_config, ConfigError, GameConfig, ViewportConfig};
use scene::GameScene;
use tux_core::input::GestureRecognizer;
use tux_core::time::FrameClock;
use tux_devtools::{DebugOverlay, OverlayStats};
use tux_platform::window::PlatformConfig;
use tux_render::{
    Camera2D, GpuContext, GpuError, MeshBuffers, QuadSpec, SpriteBatch, SpritePipeline, Texture,
};

const GAME_CONFIG_PATH: &str = "assets/config/tux.json";
const CATALOG_PATH: &str = "assets/catalog/tux.json";
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.392,
    g: 0.584,
    b: 0.929,
    a: 1.0,
};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU initialisation failed: {0}")]
    Gpu(#[from] GpuError),
    #[error("failed to load texture '{path}': {message}")]
    Texture { path: String, message: String },
}

struct GpuSpriteTexture {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Everything validated before a window exists.
struct Content {
    config: GameConfig,
    catalog: AssetCatalog,
}

impl Content {
    fn load() -> Result<Self, ConfigError> {
        let config = load_game_config(Path::new(GAME_CONFIG_PATH))?;
        let catalog = load_catalog(Path::new(CATALOG_PATH))?;
        catalog.preflight(Path::new("."))?;
        log::info!(
            "Loaded {} and {} ({} textures)",
            GAME_CONFIG_PATH,
            CATALOG_PATH,
            catalog.texture_paths().len()
        );
        Ok(Self { config, catalog })
    }
}

/// All mutable engine state. Constructed in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    gestures: GestureRecognizer,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    scene: GameScene,
    textures: HashMap<String, GpuSpriteTexture>,
    cursor: PhysicalPosition<f64>,

    // The batch is rebuilt on the CPU each frame and streamed into `mesh`.
    batch: SpriteBatch,
    mesh: MeshBuffers,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl EngineState {
    fn new(window: Arc<Window>, content: &Content) -> Result<Self, StartupError> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(
            &gpu.device,
            gpu.surface_format,
            &window,
            content.config.show_stats,
        );

        // The scene keeps the size the window had at startup.
        let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
        let viewport = ViewportConfig::new(logical.width, logical.height)?;
        let scene = GameScene::new(&content.config, viewport, content.catalog.clone())?;

        let mut textures = HashMap::new();
        for path in content.catalog.texture_paths() {
            let texture = load_texture_asset(&gpu.device, &gpu.queue, &sprite_pipeline, path)?;
            textures.insert(path.to_string(), texture);
        }

        let camera = Camera2D::new(viewport.width, viewport.height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let mesh = MeshBuffers::new(&gpu.device);

        let mut state = Self {
            window,
            gpu,
            clock: FrameClock::new(),
            gestures: GestureRecognizer::new(content.config.gesture_config()),
            camera,
            sprite_pipeline,
            debug_overlay,
            scene,
            textures,
            cursor: PhysicalPosition::new(0.0, 0.0),
            batch: SpriteBatch::with_capacity(8),
            mesh,
            camera_buffer,
            camera_bind_group,
        };
        state.rebuild_batch();
        Ok(state)
    }

    /// Map a physical window position onto the fixed scene, whatever the
    /// current window size.
    fn to_scene(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let (width, height) = self.gpu.size;
        let fraction = Vec2::new(
            position.x as f32 / width.max(1) as f32,
            position.y as f32 / height.max(1) as f32,
        );
        self.camera.screen_to_world(fraction * self.camera.viewport)
    }

    fn pointer_down(&mut self, position: PhysicalPosition<f64>) {
        let at = self.to_scene(position);
        self.gestures.press(at.x, at.y, self.clock.sim_time_us());
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        if self.gestures.is_pressed() {
            let at = self.to_scene(position);
            self.gestures.moved(at.x, at.y);
        }
    }

    fn pointer_up(&mut self) {
        self.gestures.release(self.clock.sim_time_us());
    }

    fn step_simulation(&mut self) {
        self.clock.begin_frame();
        while self.clock.next_step() {
            self.gestures.update(self.clock.sim_time_us());
            for gesture in self.gestures.drain() {
                log::trace!("Gesture {:?}", gesture);
                self.scene.handle_gesture(gesture);
            }
            self.scene.tick(self.clock.fixed_dt_us());
        }
    }

    fn rebuild_batch(&mut self) {
        self.batch = SpriteBatch::with_capacity(self.scene.node_count());
        for node in self.scene.nodes().iter().filter(|n| n.visible) {
            self.batch.push_quad(QuadSpec {
                texture_key: &node.texture,
                center_x: node.center.x,
                center_y: node.center.y,
                width: node.size.x,
                height: node.size.y,
                color: [1.0; 4],
            });
        }
        self.mesh
            .upload(&self.gpu.device, &self.gpu.queue, &self.batch);
    }

    fn overlay_stats(&self) -> OverlayStats {
        let position = self.scene.tux_position();
        let velocity = self.scene.tux_velocity();
        OverlayStats {
            node_count: self.scene.node_count(),
            draw_calls: self.batch.draw_calls.len() as u32,
            motion_state: self.scene.state().label(),
            facing: self.scene.facing().label(),
            walking: self.scene.character().walking,
            moving: self.scene.is_moving(),
            animating: self.scene.is_animating(),
            position: position.to_array(),
            velocity: velocity.to_array(),
            begun: self.scene.begun(),
        }
    }

    fn render(&mut self) {
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some(frame) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let overlay = self
            .debug_overlay
            .prepare(&self.window, &self.clock, &stats);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.batch.draw_calls {
                let Some(texture) = self.textures.get(&*draw.texture_key) else {
                    log::warn!("No texture loaded for '{}'", draw.texture_key);
                    continue;
                };
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &frame.view,
            overlay,
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

struct App {
    platform: PlatformConfig,
    content: Content,
    state: Option<EngineState>,
    failed: bool,
}

impl App {
    fn new(content: Content) -> Self {
        Self {
            platform: PlatformConfig::default(),
            content,
            state: None,
            failed: false,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), StartupError> {
        let window = tux_platform::window::create_window(event_loop, &self.platform)?;
        log::info!(
            "Window created: {}x{}",
            self.platform.width,
            self.platform.height
        );
        self.state = Some(EngineState::new(window, &self.content)?);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.failed {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("Startup failed: {err}");
            self.failed = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => {
                        log::info!("Escape pressed, exiting.");
                        event_loop.exit();
                    }
                    PhysicalKey::Code(KeyCode::F3) => state.debug_overlay.toggle(),
                    _ => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = position;
                state.pointer_moved(position);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed if !egui_consumed => state.pointer_down(state.cursor),
                ElementState::Released => state.pointer_up(),
                _ => {}
            },

            WindowEvent::Touch(touch) => match touch.phase {
                TouchPhase::Started => state.pointer_down(touch.location),
                TouchPhase::Moved => state.pointer_moved(touch.location),
                TouchPhase::Ended => state.pointer_up(),
                TouchPhase::Cancelled => state.gestures.cancel(),
            },

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                state.step_simulation();
                if state.clock.steps_this_frame > 0 {
                    state.rebuild_batch();
                }
                state.render();
            }

            _ => {}
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Tux Runner starting...");

    let content = match Content::load() {
        Ok(content) => content,
        Err(err) => {
            log::error!("Configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(content);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        return ExitCode::FAILURE;
    }
    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_texture_asset(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    asset_path: &str,
) -> Result<GpuSpriteTexture, StartupError> {
    let bytes = std::fs::read(asset_path).map_err(|e| StartupError::Texture {
        path: asset_path.to_string(),
        message: e.to_string(),
    })?;
    let texture = Texture::from_bytes(device, queue, &bytes, asset_path).map_err(|message| {
        StartupError::Texture {
            path: asset_path.to_string(),
            message,
        }
    })?;
    let bind_group = pipeline.create_texture_bind_group(device, &texture);
    Ok(GpuSpriteTexture {
        _texture: texture,
        bind_group,
    })
}
