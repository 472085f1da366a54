use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::scene::{Camera, GameObjectManager};
use crate::vk_utils::DescriptorPool;

/// Must match `MAX_LIGHTS` in the shaders
pub const MAX_LIGHTS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct PointLight {
  /// w is ignored
  pub position: Vec4,
  /// w is intensity
  pub color: Vec4,
}

unsafe impl Zeroable for PointLight {}
unsafe impl Pod for PointLight {}

/// Set 0, binding 0 in every pipeline. Written once per frame, before any
/// render system records commands.
///
/// Layout follows std140, so keep fields 16-byte aligned.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct GlobalUbo {
  pub projection: Mat4,
  pub view: Mat4,
  pub inverse_view: Mat4,
  /// w is intensity
  pub ambient_light_color: Vec4,
  pub point_lights: [PointLight; MAX_LIGHTS],
  pub num_lights: i32,
  pub _padding: [u32; 3],
}

unsafe impl Zeroable for GlobalUbo {}
unsafe impl Pod for GlobalUbo {}

impl Default for GlobalUbo {
  fn default() -> Self {
    Self {
      projection: Mat4::IDENTITY,
      view: Mat4::IDENTITY,
      inverse_view: Mat4::IDENTITY,
      ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
      point_lights: [PointLight::default(); MAX_LIGHTS],
      num_lights: 0,
      _padding: [0; 3],
    }
  }
}

impl GlobalUbo {
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::bytes_of(self)
  }
}

/// Everything a render system needs to record one frame. Lives on the
/// stack for the duration of a single frame.
pub struct FrameInfo<'a> {
  /// Frame-in-flight slot, NOT the swapchain image index
  pub frame_index: usize,
  /// Seconds since previous frame
  pub frame_time: f32,
  pub command_buffer: vk::CommandBuffer,
  pub camera: &'a Camera,
  /// Set 0 for this frame slot, points to its `GlobalUbo`
  pub global_descriptor_set: vk::DescriptorSet,
  /// Arena for per-object descriptor sets, reset when this slot comes around again
  pub frame_pool: &'a DescriptorPool,
  pub game_objects: &'a GameObjectManager,
  /// Main color attachment of the acquired image, input of the tonemap subpass
  pub main_color_view: vk::ImageView,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn global_ubo_has_std140_size() {
    assert_eq!(std::mem::size_of::<PointLight>(), 32);
    assert_eq!(std::mem::size_of::<GlobalUbo>(), 3 * 64 + 16 + MAX_LIGHTS * 32 + 16);
    assert_eq!(std::mem::size_of::<GlobalUbo>() % 16, 0);
  }

  #[test]
  fn default_ubo_has_dim_white_ambient_and_no_lights() {
    let ubo = GlobalUbo::default();
    assert_eq!(ubo.ambient_light_color, Vec4::new(1.0, 1.0, 1.0, 0.02));
    assert_eq!(ubo.num_lights, 0);
    assert_eq!(ubo.as_bytes().len(), std::mem::size_of::<GlobalUbo>());
  }
}
