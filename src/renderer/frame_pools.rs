use ash::vk;
use log::trace;

use super::GlobalUbo;
use crate::error::{EngineResult, VkResultExt};
use crate::vk_ctx::{DescriptorPoolDesc, GpuDeviceRef};
use crate::vk_utils::{
  create_ubo_binding, BindableResource, DescriptorPool, DescriptorSetLayout,
  DescriptorWriter, VkBuffer, VkMemoryPreference,
};

pub const FRAME_POOL_MAX_SETS: u32 = 1000;

fn pool_size(ty: vk::DescriptorType, descriptor_count: u32) -> vk::DescriptorPoolSize {
  vk::DescriptorPoolSize {
    ty,
    descriptor_count,
  }
}

fn frame_pool_desc() -> DescriptorPoolDesc {
  DescriptorPoolDesc {
    max_sets: FRAME_POOL_MAX_SETS,
    pool_sizes: vec![
      pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1000),
      pool_size(vk::DescriptorType::UNIFORM_BUFFER, 1000),
      pool_size(vk::DescriptorType::STORAGE_IMAGE, 100),
      pool_size(vk::DescriptorType::INPUT_ATTACHMENT, 100),
    ],
    flags: vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET,
  }
}

/// Arena of descriptor sets, one pool per frame in flight.
///
/// Render systems allocate a fresh set per object per frame and never free it.
/// The whole pool is reset when its frame slot comes around again, which is
/// safe only after that slot's fence was waited on (i.e. after `begin_frame`).
pub struct FrameDescriptorPools {
  pools: Vec<DescriptorPool>,
}

impl FrameDescriptorPools {
  pub fn new(device: &GpuDeviceRef, frames_in_flight: usize) -> EngineResult<Self> {
    let pools = (0..frames_in_flight)
      .map(|_| DescriptorPool::new(device, frame_pool_desc()))
      .collect::<Result<Vec<_>, _>>()
      .context("vkCreateDescriptorPool")?;
    Ok(Self { pools })
  }

  /// Invalidates every set handed out for this slot during its previous frame
  pub fn begin_frame(&self, frame_index: usize) -> EngineResult<&DescriptorPool> {
    let pool = self.pool(frame_index);
    trace!(
      "Frame slot {}: resetting descriptor pool, {} sets were allocated",
      frame_index,
      pool.allocated_count()
    );
    pool.reset().context("vkResetDescriptorPool")?;
    Ok(pool)
  }

  pub fn pool(&self, frame_index: usize) -> &DescriptorPool {
    assert!(
      frame_index < self.pools.len(),
      "Requested descriptor pool for frame {}, there are only {}",
      frame_index,
      self.pools.len()
    );
    &self.pools[frame_index]
  }

  pub fn allocated_this_frame(&self, frame_index: usize) -> u32 {
    self.pool(frame_index).allocated_count()
  }
}

/// Set 0 of every pipeline: one `GlobalUbo` buffer and one set per frame in flight.
pub struct GlobalDescriptors {
  // drop order: sets die with the pool, pool before its layout
  pool: DescriptorPool,
  layout: DescriptorSetLayout,
  sets: Vec<vk::DescriptorSet>,
  ubo_buffers: Vec<VkBuffer>,
}

impl GlobalDescriptors {
  pub fn new(device: &GpuDeviceRef, frames_in_flight: usize) -> EngineResult<Self> {
    let frames = frames_in_flight as u32;
    let pool = DescriptorPool::new(
      device,
      DescriptorPoolDesc {
        max_sets: frames,
        pool_sizes: vec![pool_size(vk::DescriptorType::UNIFORM_BUFFER, frames)],
        flags: vk::DescriptorPoolCreateFlags::empty(),
      },
    )
    .context("vkCreateDescriptorPool")?;
    let layout = DescriptorSetLayout::new(
      device,
      vec![create_ubo_binding(0, vk::ShaderStageFlags::ALL_GRAPHICS)],
    )
    .context("vkCreateDescriptorSetLayout")?;

    let ubo_size = std::mem::size_of::<GlobalUbo>() as u64;
    let mut ubo_buffers = Vec::with_capacity(frames_in_flight);
    let mut sets = Vec::with_capacity(frames_in_flight);
    for i in 0..frames_in_flight {
      let buffer = VkBuffer::empty(
        device,
        format!("GlobalUbo_{}", i),
        ubo_size,
        vk::BufferUsageFlags::UNIFORM_BUFFER,
        VkMemoryPreference::GpuMappable,
      )
      .context("Allocate GlobalUbo buffer")?;
      buffer.write_to_mapped(GlobalUbo::default().as_bytes());

      let set = DescriptorWriter::new(&layout, &pool)
        .write(BindableResource::Buffer {
          binding: 0,
          buffer: buffer.buffer,
          offset: 0,
          range: ubo_size,
        })
        .build()
        .context("vkAllocateDescriptorSets")?;

      ubo_buffers.push(buffer);
      sets.push(set);
    }

    Ok(Self {
      pool,
      layout,
      sets,
      ubo_buffers,
    })
  }

  pub fn layout(&self) -> &DescriptorSetLayout {
    &self.layout
  }

  pub fn set(&self, frame_index: usize) -> vk::DescriptorSet {
    self.sets[frame_index]
  }

  pub fn ubo_buffer(&self, frame_index: usize) -> &VkBuffer {
    &self.ubo_buffers[frame_index]
  }

  /// Only call for the slot that `begin_frame` just returned, other slots may still be read by the GPU
  pub fn write_ubo(&self, frame_index: usize, ubo: &GlobalUbo) {
    self.ubo_buffers[frame_index].write_to_mapped(ubo.as_bytes());
  }
}
