use std::cell::Cell;

use ash::prelude::VkResult;
use ash::vk;
use log::trace;

use crate::vk_ctx::{DescriptorPoolDesc, GpuDeviceRef};

/*
////////////////////////////////////////
/// NOTES FOR DESCRIPTOR SETS
////////////////////////////////////////

https://vulkan-tutorial.com/Uniform_buffers/Descriptor_layout_and_buffer <3

You cannot bind a single shader resource to a buffer/texture. You can only bind a group
of resources as descriptor sets.

Set 0 is the global set (one per frame in flight, holds GlobalUbo). Set 1 is
allocated per object per frame from the frame's pool, see `FrameDescriptorPools`.

In shader:
layout(set=0, binding=0) uniform GlobalUbo;
layout(set=1, binding=0) uniform ObjectData;
layout(set=1, binding=1) uniform sampler2D albedoMap;
*/

////////////////////////////////
/// Layout utils
////////////////////////////////

fn create_binding(
  binding: u32,
  descriptor_type: vk::DescriptorType,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  vk::DescriptorSetLayoutBinding::builder()
    .binding(binding)
    .descriptor_type(descriptor_type)
    .descriptor_count(1)
    .stage_flags(stage_flags)
    .build()
}

/// Create layout for a single uniform buffer object.
/// That layout will be one of layouts gathered in DescriptorSetLayout.
pub fn create_ubo_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  create_binding(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
}

/// Create layout for a single texture/sampler object.
pub fn create_texture_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  create_binding(
    binding,
    vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    stage_flags,
  )
}

/// Image written from compute shader (`imageStore`)
pub fn create_storage_image_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  create_binding(binding, vk::DescriptorType::STORAGE_IMAGE, stage_flags)
}

/// `subpassInput` - attachment written by previous subpass
pub fn create_input_attachment_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  create_binding(binding, vk::DescriptorType::INPUT_ATTACHMENT, stage_flags)
}

pub struct DescriptorSetLayout {
  device: GpuDeviceRef,
  pub layout: vk::DescriptorSetLayout,
  bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayout {
  pub fn new(
    device: &GpuDeviceRef,
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
  ) -> VkResult<Self> {
    let layout = device.create_descriptor_set_layout(&bindings)?;
    Ok(Self {
      device: device.clone(),
      layout,
      bindings,
    })
  }

  pub fn binding(&self, binding: u32) -> Option<&vk::DescriptorSetLayoutBinding> {
    self.bindings.iter().find(|b| b.binding == binding)
  }
}

impl Drop for DescriptorSetLayout {
  fn drop(&mut self) {
    self.device.destroy_descriptor_set_layout(self.layout);
  }
}

////////////////////////////////
/// Pools
////////////////////////////////

pub struct DescriptorPool {
  device: GpuDeviceRef,
  pub pool: vk::DescriptorPool,
  max_sets: u32,
  /// Sets handed out since the last reset
  allocated: Cell<u32>,
}

impl DescriptorPool {
  pub fn new(device: &GpuDeviceRef, desc: DescriptorPoolDesc) -> VkResult<Self> {
    let pool = device.create_descriptor_pool(&desc)?;
    trace!(
      "Created descriptor pool (max_sets={}, sizes={:?})",
      desc.max_sets,
      desc.pool_sizes
    );
    Ok(Self {
      device: device.clone(),
      pool,
      max_sets: desc.max_sets,
      allocated: Cell::new(0),
    })
  }

  pub fn max_sets(&self) -> u32 {
    self.max_sets
  }

  pub fn allocated_count(&self) -> u32 {
    self.allocated.get()
  }

  pub fn allocate(&self, layout: &DescriptorSetLayout) -> VkResult<vk::DescriptorSet> {
    let set = self.device.allocate_descriptor_set(self.pool, layout.layout)?;
    self.allocated.set(self.allocated.get() + 1);
    Ok(set)
  }

  /// Invalidates every set allocated from this pool
  pub fn reset(&self) -> VkResult<()> {
    self.device.reset_descriptor_pool(self.pool)?;
    self.allocated.set(0);
    Ok(())
  }
}

impl Drop for DescriptorPool {
  fn drop(&mut self) {
    self.device.destroy_descriptor_pool(self.pool);
  }
}

////////////////////////////////
/// Resource binding
////////////////////////////////

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BindableResource {
  /// Uniform buffer range
  Buffer {
    binding: u32,
    buffer: vk::Buffer,
    offset: u64,
    range: u64,
  },
  Texture {
    binding: u32,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    layout: vk::ImageLayout,
  },
  StorageImage {
    binding: u32,
    image_view: vk::ImageView,
  },
  InputAttachment {
    binding: u32,
    image_view: vk::ImageView,
  },
}

impl BindableResource {
  pub fn binding(&self) -> u32 {
    match *self {
      BindableResource::Buffer { binding, .. } => binding,
      BindableResource::Texture { binding, .. } => binding,
      BindableResource::StorageImage { binding, .. } => binding,
      BindableResource::InputAttachment { binding, .. } => binding,
    }
  }

  pub fn descriptor_type(&self) -> vk::DescriptorType {
    match self {
      BindableResource::Buffer { .. } => vk::DescriptorType::UNIFORM_BUFFER,
      BindableResource::Texture { .. } => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
      BindableResource::StorageImage { .. } => vk::DescriptorType::STORAGE_IMAGE,
      BindableResource::InputAttachment { .. } => vk::DescriptorType::INPUT_ATTACHMENT,
    }
  }
}

/// Collects resources for a single descriptor set, then allocates and fills
/// it in one go. Every write is checked against the layout's binding type.
pub struct DescriptorWriter<'a> {
  layout: &'a DescriptorSetLayout,
  pool: &'a DescriptorPool,
  resources: Vec<BindableResource>,
}

impl<'a> DescriptorWriter<'a> {
  pub fn new(layout: &'a DescriptorSetLayout, pool: &'a DescriptorPool) -> Self {
    Self {
      layout,
      pool,
      resources: Vec::with_capacity(8),
    }
  }

  pub fn write(mut self, resource: BindableResource) -> Self {
    let binding = resource.binding();
    let layout_binding = self.layout.binding(binding);
    assert!(
      layout_binding.is_some(),
      "Layout does not contain binding {}",
      binding
    );
    let expected_type = layout_binding.map(|b| b.descriptor_type);
    assert_eq!(
      expected_type,
      Some(resource.descriptor_type()),
      "Descriptor type mismatch for binding {}",
      binding
    );
    self.resources.push(resource);
    self
  }

  pub fn build(self) -> VkResult<vk::DescriptorSet> {
    let set = self.pool.allocate(self.layout)?;
    self.pool.device.update_descriptor_set(set, &self.resources);
    Ok(set)
  }
}
