//! CPU-side sprite batching and the GPU buffers it streams into.
//!
//! The game rebuilds one mesh per frame: every visible node becomes a quad,
//! appended in draw order. Consecutive quads sharing a texture collapse into a
//! single draw call, so a scene drawn back-to-front with few textures costs
//! only a handful of `draw_indexed` calls.

use std::sync::Arc;

use crate::vertex::SpriteVertex;

/// A contiguous run of indices that share one texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct QuadSpec<'a> {
    pub texture_key: &'a str,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(8),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn push_quad(&mut self, spec: QuadSpec<'_>) {
        let half_w = spec.width * 0.5;
        let half_h = spec.height * 0.5;
        let base_index = self.vertices.len() as u32;

        let corners = [
            ([-half_w, -half_h], [0.0, 1.0]),
            ([half_w, -half_h], [1.0, 1.0]),
            ([half_w, half_h], [1.0, 0.0]),
            ([-half_w, half_h], [0.0, 0.0]),
        ];
        for (offset, tex_coords) in corners {
            self.vertices.push(SpriteVertex {
                position: [spec.center_x + offset[0], spec.center_y + offset[1]],
                tex_coords,
                color: spec.color,
            });
        }

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
        self.push_draw_call(spec.texture_key, draw_start, 6);
    }

    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }
}

/// Vertex/index buffers that grow (power of two) but never shrink.
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            vertex_buffer: create_vertex_buffer(device, 4),
            index_buffer: create_index_buffer(device, 6),
            vertex_capacity: 4,
            index_capacity: 6,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.vertex_capacity * std::mem::size_of::<SpriteVertex>()
            + self.index_capacity * std::mem::size_of::<u32>()
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &SpriteBatch) {
        if batch.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = batch.vertices.len().next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        if batch.indices.len() > self.index_capacity {
            self.index_capacity = batch.indices.len().next_power_of_two();
            self.index_buffer = create_index_buffer(device, self.index_capacity);
        }

        if !batch.vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&batch.vertices));
        }
        if !batch.indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&batch.indices));
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
