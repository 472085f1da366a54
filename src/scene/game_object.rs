use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::trace;

use crate::vk_ctx::GpuDeviceRef;
use crate::vk_utils::{Model, VkBuffer, VkMemoryPreference, VkTexture};

pub type GameObjectId = u32;

pub const MAX_GAME_OBJECTS: usize = 1000;
pub const DEFAULT_LIGHT_INTENSITY: f32 = 10.0;
pub const DEFAULT_LIGHT_RADIUS: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformComponent {
  pub translation: Vec3,
  pub scale: Vec3,
  /// Euler angles in radians, applied Y then X then Z
  pub rotation: Vec3,
}

impl Default for TransformComponent {
  fn default() -> Self {
    Self {
      translation: Vec3::ZERO,
      scale: Vec3::ONE,
      rotation: Vec3::ZERO,
    }
  }
}

impl TransformComponent {
  fn rotation_yxz(&self) -> Mat4 {
    Mat4::from_rotation_y(self.rotation.y)
      * Mat4::from_rotation_x(self.rotation.x)
      * Mat4::from_rotation_z(self.rotation.z)
  }

  /// `translate * Ry * Rx * Rz * scale`
  pub fn mat4(&self) -> Mat4 {
    Mat4::from_translation(self.translation) * self.rotation_yxz() * Mat4::from_scale(self.scale)
  }

  /// Inverse-transpose of the model matrix, so normals survive non-uniform scale
  pub fn normal_matrix(&self) -> Mat3 {
    let inv_scale = Vec3::ONE / self.scale;
    Mat3::from_mat4(self.rotation_yxz() * Mat4::from_scale(inv_scale))
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightComponent {
  pub light_intensity: f32,
}

/// Per-object data in the frame's object buffer, also pushed as constants
/// by the mesh systems. `normal_matrix` is stored as mat4 to keep std140 simple.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct ObjectBufferData {
  pub model_matrix: Mat4,
  pub normal_matrix: Mat4,
}

unsafe impl Zeroable for ObjectBufferData {}
unsafe impl Pod for ObjectBufferData {}

impl ObjectBufferData {
  pub fn from_transform(transform: &TransformComponent) -> Self {
    Self {
      model_matrix: transform.mat4(),
      normal_matrix: Mat4::from_mat3(transform.normal_matrix()),
    }
  }
}

pub struct GameObject {
  id: GameObjectId,
  pub color: Vec3,
  pub transform: TransformComponent,
  pub model: Option<Rc<Model>>,
  pub diffuse_map: Rc<VkTexture>,
  pub normal_map: Rc<VkTexture>,
  pub roughness_map: Rc<VkTexture>,
  pub metallic_map: Rc<VkTexture>,
  /// Storage image written by the irradiance compute pass
  pub env_map: Option<Rc<VkTexture>>,
  pub point_light: Option<PointLightComponent>,
}

impl GameObject {
  pub fn id(&self) -> GameObjectId {
    self.id
  }
}

fn align_to(size: u64, alignment: u64) -> u64 {
  if alignment > 0 {
    (size + alignment - 1) & !(alignment - 1)
  } else {
    size
  }
}

/// Owns every game object. Ids are dense indices, objects are never removed.
///
/// Also owns one object buffer per frame in flight, each object gets a
/// slot at `id * aligned_size`.
pub struct GameObjectManager {
  objects: Vec<GameObject>,
  object_buffers: Vec<VkBuffer>,
  /// `ObjectBufferData` size rounded up to the uniform offset alignment
  aligned_size: u64,
  default_texture: Rc<VkTexture>,
}

impl GameObjectManager {
  pub fn new(device: &GpuDeviceRef, frames_in_flight: usize) -> VkResult<Self> {
    let aligned_size = align_to(
      std::mem::size_of::<ObjectBufferData>() as u64,
      device.min_uniform_buffer_offset_alignment(),
    );
    let object_buffers = (0..frames_in_flight)
      .map(|i| {
        VkBuffer::empty(
          device,
          format!("GameObjects_{}", i),
          aligned_size * MAX_GAME_OBJECTS as u64,
          vk::BufferUsageFlags::UNIFORM_BUFFER,
          VkMemoryPreference::GpuMappable,
        )
      })
      .collect::<VkResult<Vec<_>>>()?;
    let default_texture = Rc::new(VkTexture::default_white(device)?);

    Ok(Self {
      objects: Vec::new(),
      object_buffers,
      aligned_size,
      default_texture,
    })
  }

  pub fn create_game_object(&mut self) -> &mut GameObject {
    assert!(
      self.objects.len() < MAX_GAME_OBJECTS,
      "Max game object count exceeded ({})",
      MAX_GAME_OBJECTS
    );
    let id = self.objects.len() as GameObjectId;
    let tex = &self.default_texture;
    self.objects.push(GameObject {
      id,
      color: Vec3::ONE,
      transform: TransformComponent::default(),
      model: None,
      diffuse_map: tex.clone(),
      normal_map: tex.clone(),
      roughness_map: tex.clone(),
      metallic_map: tex.clone(),
      env_map: None,
      point_light: None,
    });
    trace!("Created game object {}", id);
    &mut self.objects[id as usize]
  }

  pub fn make_point_light(&mut self, intensity: f32, radius: f32, color: Vec3) -> &mut GameObject {
    let obj = self.create_game_object();
    obj.color = color;
    obj.transform.scale.x = radius;
    obj.point_light = Some(PointLightComponent {
      light_intensity: intensity,
    });
    obj
  }

  pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
    self.objects.get(id as usize)
  }

  pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
    self.objects.get_mut(id as usize)
  }

  /// In id order
  pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
    self.objects.iter()
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
    self.objects.iter_mut()
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  pub fn default_texture(&self) -> &Rc<VkTexture> {
    &self.default_texture
  }

  /// Write model/normal matrices of every object into this frame's buffer.
  /// Call before recording, the renderer only reads them.
  pub fn update_buffer(&self, frame_index: usize) {
    let buffer = &self.object_buffers[frame_index];
    for obj in self.objects.iter() {
      let data = ObjectBufferData::from_transform(&obj.transform);
      buffer.write_at(obj.id as u64 * self.aligned_size, bytemuck::bytes_of(&data));
    }
  }

  /// `(buffer, offset, range)` of the object's slot in this frame's buffer
  pub fn buffer_info(&self, frame_index: usize, id: GameObjectId) -> (vk::Buffer, u64, u64) {
    self.object_buffers[frame_index].descriptor_range(
      id as u64 * self.aligned_size,
      std::mem::size_of::<ObjectBufferData>() as u64,
    )
  }
}
