//! Stats overlay drawn with egui over the finished scene.
//!
//! `prepare()` runs the UI and tessellates it into an `OverlayFrame`;
//! `render()` uploads that frame and paints it in its own pass on top of the
//! scene. The window is only built while `visible` (F3 toggles it), but input
//! is always routed through egui so a shown overlay can take clicks.

use tux_core::time::FrameClock;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub node_count: usize,
    pub draw_calls: u32,
    pub motion_state: &'static str,
    pub facing: &'static str,
    pub walking: bool,
    pub moving: bool,
    pub animating: bool,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub begun: bool,
}

/// Text rows shown in the overlay, top to bottom.
pub fn stat_lines(clock: &FrameClock, stats: &OverlayStats) -> Vec<String> {
    vec![
        format!("FPS: {:.1}", clock.smoothed_fps),
        format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms),
        format!("Nodes: {}", stats.node_count),
        format!("Draw calls: {}", stats.draw_calls),
        format!(
            "Tux: {} ({}){}",
            stats.motion_state,
            stats.facing,
            if stats.walking { ", holding" } else { "" }
        ),
        format!(
            "Pos: ({:.1}, {:.1})  Vel: ({:.1}, {:.1})",
            stats.position[0], stats.position[1], stats.velocity[0], stats.velocity[1]
        ),
        format!(
            "Move: {}  Anim: {}",
            if stats.moving { "on" } else { "off" },
            if stats.animating { "on" } else { "off" }
        ),
        if stats.begun {
            "Run: started".to_string()
        } else {
            "Run: tap to start".to_string()
        },
    ]
}

/// One tessellated overlay, ready for `DebugOverlay::render`.
pub struct OverlayFrame {
    primitives: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    screen: egui_wgpu::ScreenDescriptor,
}

pub struct DebugOverlay {
    egui_ctx: egui::Context,
    egui_winit_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
        visible: bool,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state
            .on_window_event(window, event)
            .consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Stats overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: &OverlayStats,
    ) -> OverlayFrame {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new("Stats")
                .default_pos([10.0, 10.0])
                .resizable(false)
                .collapsible(false)
                .show(ctx, |ui| {
                    for line in stat_lines(clock, stats) {
                        ui.monospace(line);
                    }
                });
        });
        self.egui_winit_state
            .handle_platform_output(window, output.platform_output);

        let size = window.inner_size();
        OverlayFrame {
            primitives: self.egui_ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: output.pixels_per_point,
            },
        }
    }

    /// Paint `frame` over whatever `view` already holds.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: OverlayFrame,
    ) {
        for (id, delta) in &frame.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, &frame.primitives, &frame.screen);

        {
            // egui_wgpu wants a 'static pass; the encoder borrow ends with this block.
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &frame.primitives, &frame.screen);
        }

        for id in &frame.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
