use ash::vk;
use log::{info, trace};

use super::FrameSync;
use crate::error::{EngineError, EngineResult, VkResultExt};
use crate::vk_ctx::{GpuDeviceRef, GpuImage, ImageDesc, SubmitDesc, SwapchainDesc};
use crate::vk_utils::{
  choose_swapchain_settings, main_and_tonemap_layout, DEPTH_FORMAT_CANDIDATES,
  SWAPCHAIN_IMAGE_USAGE,
};

/// Result of asking for the next presentable image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
  Image { index: u32, suboptimal: bool },
  /// Swapchain no longer matches the surface, it has to be recreated
  OutOfDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentOutcome {
  Presented { suboptimal: bool },
  OutOfDate,
}

/// Per swapchain image: the image we present and the attachments
/// the main pass renders into before tonemapping.
struct SwapchainImage {
  /// Owned by the swapchain, destroyed with it
  #[allow(dead_code)]
  image: vk::Image,
  image_view: vk::ImageView,
  main_color: GpuImage,
  depth: GpuImage,
  framebuffer: vk::Framebuffer,
}

fn has_stencil(format: vk::Format) -> bool {
  format == vk::Format::D32_SFLOAT_S8_UINT || format == vk::Format::D24_UNORM_S8_UINT
}

/// Presentable images, their attachments and framebuffers, the render pass
/// they are compatible with and the per-frame-in-flight sync objects.
///
/// Never mutated on resize, a new one is built with `from_previous` instead.
pub struct Swapchain {
  device: GpuDeviceRef,
  swapchain: vk::SwapchainKHR,
  surface_format: vk::SurfaceFormatKHR,
  present_mode: vk::PresentModeKHR,
  extent: vk::Extent2D,
  depth_format: vk::Format,
  render_pass: vk::RenderPass,
  images: Vec<SwapchainImage>,
  sync: FrameSync,
  /// Fence of the frame that last rendered into each image. `null` if none did yet.
  images_in_flight: Vec<vk::Fence>,
  current_frame: usize,
}

impl Swapchain {
  pub fn new(
    device: &GpuDeviceRef,
    window_extent: vk::Extent2D,
    frames_in_flight: usize,
  ) -> EngineResult<Self> {
    Swapchain::create(device, window_extent, frames_in_flight, vk::SwapchainKHR::null())
  }

  /// Hands `previous` to the driver so presentation can continue during the swap.
  /// The caller drops `previous` afterwards. Fails if the color or depth format
  /// changed, every pipeline was created against the old render pass.
  pub fn from_previous(
    device: &GpuDeviceRef,
    window_extent: vk::Extent2D,
    frames_in_flight: usize,
    previous: &Swapchain,
  ) -> EngineResult<Self> {
    let next = Swapchain::create(device, window_extent, frames_in_flight, previous.swapchain)?;
    if !next.compare_formats(previous) {
      return Err(EngineError::SwapchainFormatChanged {
        old_color: previous.image_format(),
        new_color: next.image_format(),
        old_depth: previous.depth_format(),
        new_depth: next.depth_format(),
      });
    }
    Ok(next)
  }

  fn create(
    device: &GpuDeviceRef,
    window_extent: vk::Extent2D,
    frames_in_flight: usize,
    old_swapchain: vk::SwapchainKHR,
  ) -> EngineResult<Self> {
    let support = device
      .surface_support()
      .context("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
    let choice =
      choose_swapchain_settings(&support, window_extent).ok_or(EngineError::NoSurfaceFormat)?;
    let depth_format = device
      .find_supported_format(
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
      )
      .ok_or_else(|| EngineError::NoDepthFormat(DEPTH_FORMAT_CANDIDATES.to_vec()))?;

    let sync = FrameSync::new(device, frames_in_flight).context("Create frame sync objects")?;
    let swapchain = device
      .create_swapchain(&SwapchainDesc {
        surface_format: choice.surface_format,
        present_mode: choice.present_mode,
        extent: choice.extent,
        min_image_count: choice.image_count,
        image_usage: SWAPCHAIN_IMAGE_USAGE,
        pre_transform: choice.pre_transform,
        old_swapchain,
      })
      .context("vkCreateSwapchainKHR")?;

    // from here on `Drop` cleans up whatever got created
    let mut result = Self {
      device: device.clone(),
      swapchain,
      surface_format: choice.surface_format,
      present_mode: choice.present_mode,
      extent: choice.extent,
      depth_format,
      render_pass: vk::RenderPass::null(),
      images: Vec::new(),
      sync,
      images_in_flight: Vec::new(),
      current_frame: 0,
    };
    result.create_render_pass()?;
    result.create_images()?;
    result.images_in_flight = vec![vk::Fence::null(); result.images.len()];

    info!(
      "Created swapchain {}x{}, {} images, color {:?}, depth {:?}",
      result.extent.width,
      result.extent.height,
      result.images.len(),
      result.surface_format.format,
      result.depth_format
    );
    Ok(result)
  }

  fn create_render_pass(&mut self) -> EngineResult<()> {
    let layout = main_and_tonemap_layout(self.surface_format.format, self.depth_format);
    self.render_pass = self
      .device
      .create_render_pass(&layout)
      .context("vkCreateRenderPass")?;
    Ok(())
  }

  fn create_images(&mut self) -> EngineResult<()> {
    let device = self.device.clone();
    let format = self.surface_format.format;
    let raw_images = device
      .swapchain_images(self.swapchain)
      .context("vkGetSwapchainImagesKHR")?;

    for (idx, &image) in raw_images.iter().enumerate() {
      trace!("Creating resources for swapchain image {}", idx);
      let image_view = device
        .create_image_view(image, format, vk::ImageAspectFlags::COLOR)
        .context("vkCreateImageView")?;
      let main_color = match device.create_image(&ImageDesc {
        extent: self.extent,
        format,
        usage: SWAPCHAIN_IMAGE_USAGE,
        aspect: vk::ImageAspectFlags::COLOR,
      }) {
        Ok(img) => img,
        Err(e) => {
          device.destroy_image_view(image_view);
          return Err(e).context("Create main color image");
        }
      };
      let depth_aspect = if has_stencil(self.depth_format) {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
      } else {
        vk::ImageAspectFlags::DEPTH
      };
      let depth = match device.create_image(&ImageDesc {
        extent: self.extent,
        format: self.depth_format,
        usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        aspect: depth_aspect,
      }) {
        Ok(img) => img,
        Err(e) => {
          device.destroy_image(&main_color);
          device.destroy_image_view(image_view);
          return Err(e).context("Create depth image");
        }
      };
      // order matches ATTACHMENT_MAIN_COLOR, ATTACHMENT_MAIN_DEPTH, ATTACHMENT_SWAPCHAIN_COLOR
      let attachments = [main_color.view, depth.view, image_view];
      let framebuffer = match device.create_framebuffer(self.render_pass, &attachments, self.extent)
      {
        Ok(fb) => fb,
        Err(e) => {
          device.destroy_image(&depth);
          device.destroy_image(&main_color);
          device.destroy_image_view(image_view);
          return Err(e).context("vkCreateFramebuffer");
        }
      };

      self.images.push(SwapchainImage {
        image,
        image_view,
        main_color,
        depth,
        framebuffer,
      });
    }

    Ok(())
  }

  ////////////////////////////////
  /// Frame cycle
  ////////////////////////////////

  /// Blocks until the current frame slot is free, then asks for the next image.
  pub fn acquire_next_image(&self) -> EngineResult<AcquireOutcome> {
    let fence = self.sync.in_flight_fences[self.current_frame];
    self
      .device
      .wait_for_fence(fence, u64::MAX)
      .context("vkWaitForFences")?;

    let semaphore = self.sync.image_available_semaphores[self.current_frame];
    match self.device.acquire_next_image(self.swapchain, semaphore) {
      Ok((index, suboptimal)) => Ok(AcquireOutcome::Image { index, suboptimal }),
      Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
      Err(e) => Err(e).context("vkAcquireNextImageKHR"),
    }
  }

  /// Submit the recorded `command_buffer` for `image_index`, present it and
  /// move to the next frame slot.
  pub fn submit(
    &mut self,
    command_buffer: vk::CommandBuffer,
    image_index: u32,
  ) -> EngineResult<PresentOutcome> {
    let idx = image_index as usize;
    assert!(
      idx < self.images.len(),
      "Swapchain image index {} out of range, there are {} images",
      idx,
      self.images.len()
    );
    let frame = self.current_frame;
    let fence = self.sync.in_flight_fences[frame];

    // image count can differ from frames in flight, so an older frame may still own it
    let image_fence = self.images_in_flight[idx];
    if image_fence != vk::Fence::null() {
      self
        .device
        .wait_for_fence(image_fence, u64::MAX)
        .context("vkWaitForFences")?;
    }
    self.images_in_flight[idx] = fence;

    let render_finished = self.sync.render_finished_semaphores[frame];
    self.device.reset_fence(fence).context("vkResetFences")?;
    self
      .device
      .queue_submit(&SubmitDesc {
        command_buffer,
        wait_semaphore: self.sync.image_available_semaphores[frame],
        wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        signal_semaphore: render_finished,
        fence,
      })
      .context("vkQueueSubmit")?;

    let present = self
      .device
      .queue_present(self.swapchain, image_index, render_finished);
    self.current_frame = (self.current_frame + 1) % self.sync.frames_in_flight();

    match present {
      Ok(suboptimal) => Ok(PresentOutcome::Presented { suboptimal }),
      Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
      Err(e) => Err(e).context("vkQueuePresentKHR"),
    }
  }

  ////////////////////////////////
  /// Getters
  ////////////////////////////////

  /// Same color and depth format, so render passes are compatible
  pub fn compare_formats(&self, other: &Swapchain) -> bool {
    self.image_format() == other.image_format() && self.depth_format() == other.depth_format()
  }

  pub fn image_count(&self) -> usize {
    self.images.len()
  }

  pub fn frames_in_flight(&self) -> usize {
    self.sync.frames_in_flight()
  }

  /// Frame slot the next acquire/submit uses
  pub fn current_frame(&self) -> usize {
    self.current_frame
  }

  pub fn extent(&self) -> vk::Extent2D {
    self.extent
  }

  pub fn aspect_ratio(&self) -> f32 {
    self.extent.width as f32 / self.extent.height as f32
  }

  pub fn render_pass(&self) -> vk::RenderPass {
    self.render_pass
  }

  pub fn framebuffer(&self, image_index: usize) -> vk::Framebuffer {
    self.images[image_index].framebuffer
  }

  /// Attachment the main subpass renders into, read by tonemapping
  pub fn main_color_view(&self, image_index: usize) -> vk::ImageView {
    self.images[image_index].main_color.view
  }

  pub fn image_format(&self) -> vk::Format {
    self.surface_format.format
  }

  pub fn depth_format(&self) -> vk::Format {
    self.depth_format
  }

  pub fn present_mode(&self) -> vk::PresentModeKHR {
    self.present_mode
  }
}

impl Drop for Swapchain {
  fn drop(&mut self) {
    for img in self.images.drain(..) {
      self.device.destroy_framebuffer(img.framebuffer);
      self.device.destroy_image(&img.depth);
      self.device.destroy_image(&img.main_color);
      // presentable images are destroyed together with the swapchain
      self.device.destroy_image_view(img.image_view);
    }
    if self.render_pass != vk::RenderPass::null() {
      self.device.destroy_render_pass(self.render_pass);
    }
    self.device.destroy_swapchain(self.swapchain);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vk_ctx::{RecordingDevice, TestCall};
  use std::rc::Rc;

  fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
  }

  fn setup() -> (Rc<RecordingDevice>, GpuDeviceRef) {
    let recording = Rc::new(RecordingDevice::new());
    let device: GpuDeviceRef = recording.clone();
    (recording, device)
  }

  #[test]
  fn acquire_after_construct_returns_valid_index() {
    let (_, device) = setup();
    for &(w, h) in &[(1, 1), (800, 600), (4096, 4096), (5000, 20)] {
      let swapchain = Swapchain::new(&device, extent(w, h), 2).unwrap();
      match swapchain.acquire_next_image().unwrap() {
        AcquireOutcome::Image { index, .. } => {
          assert!((index as usize) < swapchain.image_count())
        }
        other => panic!("unexpected acquire result {:?}", other),
      }
    }
  }

  #[test]
  fn extent_is_clamped_and_image_count_is_min_plus_one() {
    let (recording, device) = setup();
    let swapchain = Swapchain::new(&device, extent(5000, 20), 2).unwrap();
    assert_eq!(swapchain.extent(), extent(4096, 20));
    assert_eq!(swapchain.image_count(), 3);
    assert!(recording.calls().contains(&TestCall::CreateSwapchain {
      swapchain: swapchain.swapchain,
      old_swapchain: vk::SwapchainKHR::null(),
      extent: (4096, 20),
      min_image_count: 3,
    }));
  }

  #[test]
  fn acquire_waits_on_frame_fence_first() {
    let (recording, device) = setup();
    let swapchain = Swapchain::new(&device, extent(800, 600), 2).unwrap();
    recording.clear_calls();

    swapchain.acquire_next_image().unwrap();

    let calls = recording.calls();
    assert_eq!(
      calls[0],
      TestCall::WaitForFence(swapchain.sync.in_flight_fences[0])
    );
    assert!(matches!(calls[1], TestCall::AcquireNextImage { .. }));
  }

  #[test]
  fn submit_waits_on_fence_of_frame_that_used_the_image() {
    let (recording, device) = setup();
    let mut swapchain = Swapchain::new(&device, extent(800, 600), 2).unwrap();
    let cmd = vk::CommandBuffer::null();
    let fence_0 = swapchain.sync.in_flight_fences[0];

    swapchain.submit(cmd, 1).unwrap();
    swapchain.submit(cmd, 0).unwrap();
    recording.clear_calls();
    // frame slot 0 again, image 1 was last rendered by slot 0
    swapchain.submit(cmd, 1).unwrap();

    let calls = recording.calls();
    assert_eq!(calls[0], TestCall::WaitForFence(fence_0));
    assert_eq!(calls[1], TestCall::ResetFence(fence_0));
    assert!(matches!(calls[2], TestCall::QueueSubmit { fence, .. } if fence == fence_0));
    assert!(matches!(
      calls[3],
      TestCall::QueuePresent { image_index: 1, .. }
    ));
  }

  #[test]
  fn submit_advances_frame_cursor_modulo_frames_in_flight() {
    let (_, device) = setup();
    for frames in 1..=3usize {
      let mut swapchain = Swapchain::new(&device, extent(800, 600), frames).unwrap();
      for i in 0..frames {
        assert_eq!(swapchain.current_frame(), i);
        swapchain.submit(vk::CommandBuffer::null(), 0).unwrap();
      }
      assert_eq!(swapchain.current_frame(), 0);
    }
  }

  #[test]
  fn stale_swapchain_is_reported_not_failed() {
    let (recording, device) = setup();
    let mut swapchain = Swapchain::new(&device, extent(800, 600), 2).unwrap();

    recording.push_acquire_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR));
    assert_eq!(
      swapchain.acquire_next_image().unwrap(),
      AcquireOutcome::OutOfDate
    );

    recording.push_present_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR));
    assert_eq!(
      swapchain.submit(vk::CommandBuffer::null(), 0).unwrap(),
      PresentOutcome::OutOfDate
    );

    recording.push_acquire_result(Err(vk::Result::ERROR_DEVICE_LOST));
    assert!(matches!(
      swapchain.acquire_next_image(),
      Err(EngineError::Vulkan {
        result: vk::Result::ERROR_DEVICE_LOST,
        ..
      })
    ));
  }

  #[test]
  fn recreation_passes_old_swapchain_and_keeps_formats() {
    let (recording, device) = setup();
    let first = Swapchain::new(&device, extent(800, 600), 2).unwrap();
    let second = Swapchain::from_previous(&device, extent(1024, 768), 2, &first).unwrap();

    assert!(second.compare_formats(&first));
    assert!(recording.calls().iter().any(|c| matches!(
      c,
      TestCall::CreateSwapchain { old_swapchain, .. } if *old_swapchain == first.swapchain
    )));
  }

  #[test]
  fn recreation_with_different_format_fails() {
    let (recording, device) = setup();
    let first = Swapchain::new(&device, extent(800, 600), 2).unwrap();
    recording.set_surface_formats(vec![vk::SurfaceFormatKHR {
      format: vk::Format::R8G8B8A8_UNORM,
      color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }]);

    let result = Swapchain::from_previous(&device, extent(800, 600), 2, &first);
    match result {
      Err(EngineError::SwapchainFormatChanged {
        old_color,
        new_color,
        ..
      }) => {
        assert_eq!(old_color, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(new_color, vk::Format::R8G8B8A8_UNORM);
      }
      _ => panic!("expected format mismatch"),
    }
  }

  #[test]
  fn recreation_with_different_depth_format_fails() {
    let (recording, device) = setup();
    let first = Swapchain::new(&device, extent(800, 600), 2).unwrap();
    recording.set_depth_format(Some(vk::Format::D24_UNORM_S8_UINT));

    let result = Swapchain::from_previous(&device, extent(800, 600), 2, &first);
    assert!(matches!(
      result,
      Err(EngineError::SwapchainFormatChanged { .. })
    ));
  }

  #[test]
  fn missing_formats_are_setup_errors() {
    let (recording, device) = setup();
    recording.set_depth_format(None);
    assert!(matches!(
      Swapchain::new(&device, extent(800, 600), 2),
      Err(EngineError::NoDepthFormat(_))
    ));

    recording.set_depth_format(Some(vk::Format::D32_SFLOAT));
    recording.set_surface_formats(vec![]);
    assert!(matches!(
      Swapchain::new(&device, extent(800, 600), 2),
      Err(EngineError::NoSurfaceFormat)
    ));
  }

  #[test]
  fn drop_releases_everything() {
    let (recording, device) = setup();
    {
      let swapchain = Swapchain::new(&device, extent(800, 600), 2).unwrap();
      assert!(recording.live_object_count() > 0);
      let _next = Swapchain::from_previous(&device, extent(640, 480), 2, &swapchain).unwrap();
    }
    assert_eq!(recording.live_object_count(), 0);
  }
}
