use ash::prelude::VkResult;
use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{vec2, vec3, Vec2, Vec3};
use log::trace;

use super::VkBuffer;
use crate::vk_ctx::GpuDeviceRef;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vertex {
  pub position: Vec3,
  pub normal: Vec3,
  pub tangent: Vec3,
  pub bitangent: Vec3,
  pub uv: Vec2,
}

unsafe impl Zeroable for Vertex {}
unsafe impl Pod for Vertex {}

impl Vertex {
  pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
    Self {
      position,
      normal,
      uv,
      ..Default::default()
    }
  }

  pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
      binding: 0,
      stride: std::mem::size_of::<Vertex>() as u32,
      input_rate: vk::VertexInputRate::VERTEX,
    }]
  }

  pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
    let vec3_size = std::mem::size_of::<Vec3>() as u32;
    let attr = |location: u32, format: vk::Format, offset: u32| vk::VertexInputAttributeDescription {
      location,
      binding: 0,
      format,
      offset,
    };
    vec![
      attr(0, vk::Format::R32G32B32_SFLOAT, 0),             // position
      attr(1, vk::Format::R32G32B32_SFLOAT, vec3_size),     // normal
      attr(2, vk::Format::R32G32B32_SFLOAT, vec3_size * 2), // tangent
      attr(3, vk::Format::R32G32B32_SFLOAT, vec3_size * 3), // bitangent
      attr(4, vk::Format::R32G32_SFLOAT, vec3_size * 4),    // uv
    ]
  }
}

/// Unit quad in XZ plane, normal points up (-Y, world is y-down). Floor of the demo scene.
pub fn quad_vertices() -> (Vec<Vertex>, Vec<u32>) {
  let up = vec3(0.0, -1.0, 0.0);
  let mut vertices = vec![
    Vertex::new(vec3(-0.5, 0.0, -0.5), up, vec2(0.0, 0.0)),
    Vertex::new(vec3(0.5, 0.0, -0.5), up, vec2(1.0, 0.0)),
    Vertex::new(vec3(0.5, 0.0, 0.5), up, vec2(1.0, 1.0)),
    Vertex::new(vec3(-0.5, 0.0, 0.5), up, vec2(0.0, 1.0)),
  ];
  vertices.iter_mut().for_each(|v| {
    v.tangent = vec3(1.0, 0.0, 0.0);
    v.bitangent = vec3(0.0, 0.0, 1.0);
  });
  (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// GPU-side mesh: vertex buffer and optional index buffer.
pub struct Model {
  device: GpuDeviceRef,
  pub name: String,
  vertex_buffer: VkBuffer,
  vertex_count: u32,
  index_buffer: Option<VkBuffer>,
  index_count: u32,
}

impl Model {
  pub fn new(
    device: &GpuDeviceRef,
    name: &str,
    vertices: &[Vertex],
    indices: &[u32],
  ) -> VkResult<Self> {
    assert!(
      vertices.len() >= 3,
      "Model '{}' needs at least 3 vertices, got {}",
      name,
      vertices.len()
    );

    let vertex_buffer = VkBuffer::from_data(
      device,
      format!("{}_vertex_buffer", name),
      bytemuck::cast_slice(vertices),
      vk::BufferUsageFlags::VERTEX_BUFFER,
    )?;
    let index_buffer = if indices.is_empty() {
      None
    } else {
      Some(VkBuffer::from_data(
        device,
        format!("{}_index_buffer", name),
        bytemuck::cast_slice(indices),
        vk::BufferUsageFlags::INDEX_BUFFER,
      )?)
    };
    trace!(
      "Model '{}' has {} vertices, {} indices",
      name,
      vertices.len(),
      indices.len()
    );

    Ok(Self {
      device: device.clone(),
      name: name.to_string(),
      vertex_buffer,
      vertex_count: vertices.len() as u32,
      index_buffer,
      index_count: indices.len() as u32,
    })
  }

  pub fn has_index_buffer(&self) -> bool {
    self.index_buffer.is_some()
  }

  pub fn bind(&self, command_buffer: vk::CommandBuffer) {
    self
      .device
      .cmd_bind_vertex_buffer(command_buffer, self.vertex_buffer.buffer);
    if let Some(index_buffer) = &self.index_buffer {
      self
        .device
        .cmd_bind_index_buffer(command_buffer, index_buffer.buffer);
    }
  }

  pub fn draw(&self, command_buffer: vk::CommandBuffer) {
    if self.has_index_buffer() {
      self
        .device
        .cmd_draw_indexed(command_buffer, self.index_count, 1, 0);
    } else {
      self
        .device
        .cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vk_ctx::{RecordingDevice, TestCall};
  use std::rc::Rc;

  #[test]
  fn vertex_layout_matches_attributes() {
    assert_eq!(std::mem::size_of::<Vertex>(), 14 * 4);
    let attrs = Vertex::attribute_descriptions();
    assert_eq!(attrs.len(), 5);
    assert_eq!(attrs[4].offset, 48);
    assert_eq!(
      Vertex::binding_descriptions()[0].stride as usize,
      std::mem::size_of::<Vertex>()
    );
  }

  #[test]
  fn indexed_model_draws_indexed() {
    let recording = Rc::new(RecordingDevice::new());
    let device: GpuDeviceRef = recording.clone();
    let (vertices, indices) = quad_vertices();
    let model = Model::new(&device, "quad", &vertices, &indices).unwrap();

    model.bind(vk::CommandBuffer::null());
    model.draw(vk::CommandBuffer::null());

    let calls = recording.calls();
    assert!(calls
      .iter()
      .any(|c| matches!(c, TestCall::BindIndexBuffer(_))));
    assert!(calls.contains(&TestCall::DrawIndexed {
      index_count: 6,
      instance_count: 1,
      first_index: 0,
    }));
  }

  #[test]
  fn model_without_indices_draws_vertices() {
    let recording = Rc::new(RecordingDevice::new());
    let device: GpuDeviceRef = recording.clone();
    let (vertices, _) = quad_vertices();
    let model = Model::new(&device, "tris", &vertices[0..3], &[]).unwrap();

    model.bind(vk::CommandBuffer::null());
    model.draw(vk::CommandBuffer::null());

    let calls = recording.calls();
    assert!(!calls
      .iter()
      .any(|c| matches!(c, TestCall::BindIndexBuffer(_))));
    assert!(calls.contains(&TestCall::Draw {
      vertex_count: 3,
      instance_count: 1,
      first_vertex: 0,
      first_instance: 0,
    }));
  }

  #[test]
  #[should_panic(expected = "at least 3 vertices")]
  fn model_needs_a_triangle() {
    let device: GpuDeviceRef = Rc::new(RecordingDevice::new());
    let (vertices, _) = quad_vertices();
    let _ = Model::new(&device, "line", &vertices[0..2], &[]);
  }
}
