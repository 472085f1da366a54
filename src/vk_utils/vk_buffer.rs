use ash::prelude::VkResult;
use ash::vk;
use log::trace;

use super::VkMemoryPreference;
use crate::vk_ctx::{GpuBuffer, GpuDeviceRef};

// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/quick_start.html
// https://github.com/expenses/vulkan-base/blob/main/ash-helpers/src/lib.rs

fn fmt_buf_name(name: &str, size: u64) -> String {
  format!("Buffer '{}' ({} bytes)", name, size)
}

/// Buffer that is released when dropped
pub struct VkBuffer {
  device: GpuDeviceRef,
  // For debugging
  pub name: String,
  /// Size in bytes
  pub size: u64,
  /// Native Vulkan buffer
  pub buffer: vk::Buffer,
  raw: GpuBuffer,
  memory: VkMemoryPreference,
}

impl VkBuffer {
  /// Allocate empty vulkan buffer
  pub fn empty(
    device: &GpuDeviceRef,
    name: String,
    size: u64,
    usage: vk::BufferUsageFlags,
    memory: VkMemoryPreference,
  ) -> VkResult<Self> {
    let raw = device.create_buffer(size, usage, memory)?;
    trace!("Allocated {}", fmt_buf_name(&name, size));

    Ok(Self {
      device: device.clone(),
      name,
      size,
      buffer: raw.buffer,
      raw,
      memory,
    })
  }

  /// Allocate mappable vulkan buffer and fill it with data
  pub fn from_data(
    device: &GpuDeviceRef,
    name: String,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
  ) -> VkResult<Self> {
    let buffer = VkBuffer::empty(
      device,
      name,
      bytes.len() as u64,
      usage,
      VkMemoryPreference::GpuMappable,
    )?;
    buffer.write_to_mapped(bytes);
    Ok(buffer)
  }

  pub fn write_to_mapped(&self, bytes: &[u8]) {
    self.write_at(0, bytes);
  }

  pub fn write_at(&self, offset: u64, bytes: &[u8]) {
    assert!(
      self.memory != VkMemoryPreference::GpuOnly,
      "Tried to write {} bytes to unmapped {}",
      bytes.len(),
      self.long_name()
    );
    assert!(
      offset + bytes.len() as u64 <= self.size,
      "Write of {} bytes at offset {} overflows {}",
      bytes.len(),
      offset,
      self.long_name()
    );
    self.device.write_buffer(&self.raw, offset, bytes);
  }

  /// Sub-range of this buffer to be used in a descriptor write
  pub fn descriptor_range(&self, offset: u64, range: u64) -> (vk::Buffer, u64, u64) {
    assert!(
      offset + range <= self.size,
      "Descriptor range [{}, {}) outside of {}",
      offset,
      offset + range,
      self.long_name()
    );
    (self.buffer, offset, range)
  }

  pub fn long_name(&self) -> String {
    fmt_buf_name(&self.name, self.size)
  }
}

impl Drop for VkBuffer {
  fn drop(&mut self) {
    self.device.destroy_buffer(&self.raw);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vk_ctx::RecordingDevice;
  use std::rc::Rc;

  #[test]
  fn from_data_writes_bytes() {
    let recording = Rc::new(RecordingDevice::new());
    let device: GpuDeviceRef = recording.clone();
    let buffer = VkBuffer::from_data(
      &device,
      "test".to_string(),
      &[1, 2, 3, 4],
      vk::BufferUsageFlags::VERTEX_BUFFER,
    )
    .unwrap();
    assert_eq!(recording.buffer_contents(buffer.buffer), vec![1, 2, 3, 4]);
  }

  #[test]
  #[should_panic(expected = "unmapped")]
  fn write_to_gpu_only_buffer_panics() {
    let device: GpuDeviceRef = Rc::new(RecordingDevice::new());
    let buffer = VkBuffer::empty(
      &device,
      "gpu".to_string(),
      16,
      vk::BufferUsageFlags::VERTEX_BUFFER,
      VkMemoryPreference::GpuOnly,
    )
    .unwrap();
    buffer.write_to_mapped(&[0; 4]);
  }

  #[test]
  fn drop_releases_buffer() {
    let recording = Rc::new(RecordingDevice::new());
    let device: GpuDeviceRef = recording.clone();
    {
      let _buffer = VkBuffer::empty(
        &device,
        "tmp".to_string(),
        16,
        vk::BufferUsageFlags::UNIFORM_BUFFER,
        VkMemoryPreference::GpuMappable,
      )
      .unwrap();
      assert_eq!(recording.live_object_count(), 1);
    }
    assert_eq!(recording.live_object_count(), 0);
  }
}
