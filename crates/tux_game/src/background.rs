//! Endless horizontal scroll from four viewport-sized tiles.
//!
//! Tiles start edge to edge at `x = i * width` (centres, scene coordinates).
//! Each scroll moves every tile left; a tile that passes `-width` is advanced
//! by exactly `3 * width`.

pub const TILE_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct BackgroundLoop {
    width: f32,
    tiles: [f32; TILE_COUNT],
}

impl BackgroundLoop {
    pub fn new(width: f32) -> Self {
        let mut tiles = [0.0; TILE_COUNT];
        for (index, x) in tiles.iter_mut().enumerate() {
            *x = index as f32 * width;
        }
        Self { width, tiles }
    }

    pub fn tile_positions(&self) -> &[f32; TILE_COUNT] {
        &self.tiles
    }

    pub fn scroll(&mut self, step: f32) {
        for x in &mut self.tiles {
            *x -= step;
            if *x < -self.width {
                *x += self.width * 3.0;
            }
        }
    }
}
