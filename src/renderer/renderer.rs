use ash::vk;
use log::{error, info, warn};

use super::{AcquireOutcome, PresentOutcome, Swapchain};
use crate::config::Config;
use crate::error::{EngineResult, VkResultExt};
use crate::vk_ctx::{GpuDeviceRef, RenderPassBegin};
use crate::vk_utils::{size_to_rect_vk, SUBPASS_MAIN, SUBPASS_TONEMAP};
use crate::window::{is_degenerate, AppWindow};

/// Drives the frame cycle: acquire, record, submit, present.
///
/// Two states: idle and frame-in-progress. `begin_frame` moves to
/// frame-in-progress, `end_frame` back to idle. Everything that records
/// commands is only valid in between, anything else is a bug in the caller.
pub struct Renderer {
  device: GpuDeviceRef,
  swapchain: Swapchain,
  /// One per frame in flight
  command_buffers: Vec<vk::CommandBuffer>,
  clear_values: Vec<vk::ClearValue>,
  /// Returned by acquire, NOT sequential
  current_image_index: u32,
  /// Frame-in-flight slot, `[0, frames_in_flight)`
  current_frame_index: usize,
  is_frame_started: bool,
  /// Subpass being recorded, `None` outside of the render pass
  current_subpass: Option<u32>,
  /// Recreation was requested while the window was minimized
  recreate_pending: bool,
  swapchain_generation: u64,
}

impl Renderer {
  pub fn new(
    device: &GpuDeviceRef,
    window: &dyn AppWindow,
    config: &Config,
  ) -> EngineResult<Self> {
    let frames_in_flight = config.frames_in_flight;
    let swapchain = Swapchain::new(device, window.extent(), frames_in_flight)?;
    let command_buffers = device
      .allocate_command_buffers(frames_in_flight as u32)
      .context("vkAllocateCommandBuffers")?;
    info!(
      "Renderer created: {} frames in flight, {} swapchain images",
      frames_in_flight,
      swapchain.image_count()
    );

    Ok(Self {
      device: device.clone(),
      swapchain,
      command_buffers,
      clear_values: config.clear_values(),
      current_image_index: 0,
      current_frame_index: 0,
      is_frame_started: false,
      current_subpass: None,
      recreate_pending: false,
      swapchain_generation: 0,
    })
  }

  fn recreate_swapchain(&mut self, window: &mut dyn AppWindow) -> EngineResult<()> {
    let extent = window.extent();
    if is_degenerate(extent) {
      // minimized, keep the old one until there is something to render to
      window.wait_events();
      self.recreate_pending = true;
      return Ok(());
    }

    self.device.wait_idle().context("vkDeviceWaitIdle")?;
    let next = Swapchain::from_previous(
      &self.device,
      extent,
      self.command_buffers.len(),
      &self.swapchain,
    )?;
    // drops the old swapchain, only after the new one took over
    self.swapchain = next;
    self.swapchain_generation += 1;
    self.recreate_pending = false;
    window.reset_resized_flag();
    info!(
      "Swapchain recreated ({}x{}, generation {})",
      extent.width, extent.height, self.swapchain_generation
    );
    Ok(())
  }

  ////////////////////////////////
  /// Frame cycle
  ////////////////////////////////

  /// Returns `None` if there is nothing to render this time (window is
  /// minimized or the swapchain had to be recreated). Try again next frame.
  /// A recreation deferred by a minimized window runs here once the window
  /// has a size again.
  pub fn begin_frame(
    &mut self,
    window: &mut dyn AppWindow,
  ) -> EngineResult<Option<vk::CommandBuffer>> {
    assert!(
      !self.is_frame_started,
      "Can't call begin_frame while already in progress"
    );

    if is_degenerate(window.extent()) {
      window.wait_events();
      self.recreate_pending = true;
      return Ok(None);
    }
    if self.recreate_pending {
      self.recreate_swapchain(window)?;
      return Ok(None);
    }

    let image_index = match self.swapchain.acquire_next_image()? {
      AcquireOutcome::OutOfDate => {
        self.recreate_swapchain(window)?;
        return Ok(None);
      }
      // suboptimal is still presentable, `end_frame` will recreate
      AcquireOutcome::Image { index, .. } => index,
    };

    self.current_image_index = image_index;
    self.is_frame_started = true;

    let command_buffer = self.command_buffers[self.current_frame_index];
    self
      .device
      .begin_command_buffer(command_buffer)
      .context("vkBeginCommandBuffer")?;
    Ok(Some(command_buffer))
  }

  pub fn end_frame(&mut self, window: &mut dyn AppWindow) -> EngineResult<()> {
    assert!(
      self.is_frame_started,
      "Can't call end_frame while frame is not in progress"
    );
    let command_buffer = self.current_command_buffer();
    self
      .device
      .end_command_buffer(command_buffer)
      .context("vkEndCommandBuffer")?;

    let outcome = self
      .swapchain
      .submit(command_buffer, self.current_image_index);
    // the frame is over regardless of how presentation went
    self.is_frame_started = false;
    self.current_frame_index = (self.current_frame_index + 1) % self.command_buffers.len();

    let needs_recreate = match outcome? {
      PresentOutcome::OutOfDate => true,
      PresentOutcome::Presented { suboptimal } => suboptimal || window.was_resized(),
    };
    // the resized flag is only cleared once a new swapchain exists
    if needs_recreate {
      self.recreate_swapchain(window)?;
    }
    Ok(())
  }

  fn assert_recording(&self, command_buffer: vk::CommandBuffer, op: &str) {
    assert!(
      self.is_frame_started,
      "Can't call {} if frame is not in progress",
      op
    );
    assert_eq!(
      command_buffer,
      self.current_command_buffer(),
      "Can't {} on command buffer from a different frame",
      op
    );
  }

  /// Begins the main subpass, with viewport and scissor covering the whole swapchain
  pub fn begin_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
    self.assert_recording(command_buffer, "begin_render_pass");
    self.current_subpass = Some(SUBPASS_MAIN);

    let extent = self.swapchain.extent();
    let render_area = size_to_rect_vk(&extent);
    self.device.cmd_begin_render_pass(
      command_buffer,
      &RenderPassBegin {
        render_pass: self.swapchain.render_pass(),
        framebuffer: self
          .swapchain
          .framebuffer(self.current_image_index as usize),
        render_area,
        clear_values: self.clear_values.clone(),
      },
    );

    let viewport = vk::Viewport {
      x: 0.0,
      y: 0.0,
      width: extent.width as f32,
      height: extent.height as f32,
      min_depth: 0.0,
      max_depth: 1.0,
    };
    self.device.cmd_set_viewport(command_buffer, viewport);
    self.device.cmd_set_scissor(command_buffer, render_area);
  }

  /// Main subpass -> tonemap subpass
  pub fn next_subpass(&mut self, command_buffer: vk::CommandBuffer) {
    self.assert_recording(command_buffer, "next_subpass");
    self.current_subpass = self.current_subpass.map(|subpass| subpass + 1);
    self.device.cmd_next_subpass(command_buffer);
  }

  pub fn end_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
    self.assert_recording(command_buffer, "end_render_pass");
    self.current_subpass = None;
    self.device.cmd_end_render_pass(command_buffer);
  }

  /// Error path of frame recording. Closes the render pass if it is still
  /// open and submits whatever was recorded, so the frame slot fence and the
  /// acquired image are handed back. Leaves the renderer idle.
  pub fn abort_frame(&mut self, window: &mut dyn AppWindow) -> EngineResult<()> {
    if !self.is_frame_started {
      return Ok(());
    }
    let command_buffer = self.current_command_buffer();
    if let Some(subpass) = self.current_subpass.take() {
      // a render pass can only end in its last subpass
      for _ in subpass..SUBPASS_TONEMAP {
        self.device.cmd_next_subpass(command_buffer);
      }
      self.device.cmd_end_render_pass(command_buffer);
    }
    warn!("Frame aborted, submitting partial command buffer");
    self.end_frame(window)
  }

  ////////////////////////////////
  /// Getters
  ////////////////////////////////

  pub fn is_frame_in_progress(&self) -> bool {
    self.is_frame_started
  }

  pub fn current_command_buffer(&self) -> vk::CommandBuffer {
    assert!(
      self.is_frame_started,
      "Cannot get command buffer when frame not in progress"
    );
    self.command_buffers[self.current_frame_index]
  }

  pub fn frame_index(&self) -> usize {
    assert!(
      self.is_frame_started,
      "Cannot get frame index when frame not in progress"
    );
    self.current_frame_index
  }

  /// Main color attachment of the image acquired for the current frame
  pub fn main_color_view(&self) -> vk::ImageView {
    assert!(
      self.is_frame_started,
      "Cannot get attachments when frame not in progress"
    );
    self
      .swapchain
      .main_color_view(self.current_image_index as usize)
  }

  pub fn frames_in_flight(&self) -> usize {
    self.command_buffers.len()
  }

  pub fn render_pass(&self) -> vk::RenderPass {
    self.swapchain.render_pass()
  }

  pub fn aspect_ratio(&self) -> f32 {
    self.swapchain.aspect_ratio()
  }

  pub fn extent(&self) -> vk::Extent2D {
    self.swapchain.extent()
  }

  pub fn image_count(&self) -> usize {
    self.swapchain.image_count()
  }

  /// Increments on every swapchain recreation
  pub fn swapchain_generation(&self) -> u64 {
    self.swapchain_generation
  }
}

impl Drop for Renderer {
  fn drop(&mut self) {
    // GPU may still use command buffers and the swapchain
    if let Err(e) = self.device.wait_idle() {
      error!("vkDeviceWaitIdle failed during renderer teardown: {}", e);
    }
    self.device.free_command_buffers(&self.command_buffers);
  }
}
