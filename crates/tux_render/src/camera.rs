use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over a Y-up world whose origin sits at the viewport
/// centre. `viewport` is measured in logical points, the same unit as the
/// scene, so one world unit is one point at zoom 1.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: Vec2,
}

impl Camera2D {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(viewport_width, viewport_height),
        }
    }

    fn half_extent(&self) -> Vec2 {
        self.viewport / (2.0 * self.zoom)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extent();
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );
        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }

    /// Convert a window position (logical points, origin top-left, Y down)
    /// into world coordinates.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let centered = Vec2::new(
            screen.x - self.viewport.x * 0.5,
            self.viewport.y * 0.5 - screen.y,
        );
        self.position + centered / self.zoom
    }
}
