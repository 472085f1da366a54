use ash::prelude::VkResult;
use ash::vk;

use crate::vk_ctx::GpuDeviceRef;

/// Synchronization objects, one of each per frame in flight.
///
/// https://www.khronos.org/assets/uploads/developers/library/2016-vulkan-devday-uk/7-Keeping-your-GPU-fed.pdf
pub struct FrameSync {
  device: GpuDeviceRef,
  /// Signaled by acquire, waited on by submit
  pub image_available_semaphores: Vec<vk::Semaphore>,
  /// Signaled by submit, waited on by present
  pub render_finished_semaphores: Vec<vk::Semaphore>,
  /// Signaled when the GPU finished the frame's command buffer
  pub in_flight_fences: Vec<vk::Fence>,
}

impl FrameSync {
  pub fn new(device: &GpuDeviceRef, frames_in_flight: usize) -> VkResult<Self> {
    assert!(frames_in_flight > 0, "Need at least 1 frame in flight");

    // filled in place, so whatever was created before a failure is released by `Drop`
    let mut sync = Self {
      device: device.clone(),
      image_available_semaphores: Vec::with_capacity(frames_in_flight),
      render_finished_semaphores: Vec::with_capacity(frames_in_flight),
      in_flight_fences: Vec::with_capacity(frames_in_flight),
    };
    for _ in 0..frames_in_flight {
      sync
        .image_available_semaphores
        .push(device.create_semaphore()?);
      sync
        .render_finished_semaphores
        .push(device.create_semaphore()?);
      // signaled, so the first wait for each frame does not block
      sync.in_flight_fences.push(device.create_fence(true)?);
    }

    Ok(sync)
  }

  pub fn frames_in_flight(&self) -> usize {
    self.in_flight_fences.len()
  }
}

impl Drop for FrameSync {
  fn drop(&mut self) {
    for obj in &self.image_available_semaphores {
      self.device.destroy_semaphore(*obj);
    }
    for obj in &self.render_finished_semaphores {
      self.device.destroy_semaphore(*obj);
    }
    for obj in &self.in_flight_fences {
      self.device.destroy_fence(*obj);
    }
  }
}
