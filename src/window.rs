use ash::vk;
use log::info;
use winit::event::WindowEvent;
use winit::window::Window;

/// What the renderer needs from the window.
pub trait AppWindow {
  /// Current drawable size in pixels. Zero when minimized.
  fn extent(&self) -> vk::Extent2D;
  fn was_resized(&self) -> bool;
  fn reset_resized_flag(&mut self);
  /// Block until the next input event. Only used while the extent is zero.
  fn wait_events(&mut self);
}

pub fn is_degenerate(extent: vk::Extent2D) -> bool {
  extent.width == 0 || extent.height == 0
}

/// `winit` window + resize tracking.
///
/// `winit` owns the event loop, so `wait_events` cannot block here. It asks
/// the loop to switch to `ControlFlow::Wait` instead, see `take_wait_request`.
pub struct WinitWindow {
  window: Window,
  framebuffer_resized: bool,
  wait_requested: bool,
}

impl WinitWindow {
  pub fn new(window: Window) -> Self {
    Self {
      window,
      framebuffer_resized: false,
      wait_requested: false,
    }
  }

  pub fn raw(&self) -> &Window {
    &self.window
  }

  pub fn handle_event(&mut self, event: &WindowEvent) {
    if let WindowEvent::Resized(next_size) = event {
      info!("Window resized to {}x{}", next_size.width, next_size.height);
      self.framebuffer_resized = true;
    }
  }

  /// `true` once after `wait_events` was called
  pub fn take_wait_request(&mut self) -> bool {
    std::mem::replace(&mut self.wait_requested, false)
  }
}

impl AppWindow for WinitWindow {
  fn extent(&self) -> vk::Extent2D {
    let size = self.window.inner_size();
    vk::Extent2D {
      width: size.width,
      height: size.height,
    }
  }

  fn was_resized(&self) -> bool {
    self.framebuffer_resized
  }

  fn reset_resized_flag(&mut self) {
    self.framebuffer_resized = false;
  }

  fn wait_events(&mut self) {
    self.wait_requested = true;
  }
}

/// Window with a scripted size. Each `wait_events` moves to the next extent.
#[cfg(test)]
pub struct TestWindow {
  pub extents: std::collections::VecDeque<vk::Extent2D>,
  pub current: vk::Extent2D,
  pub resized: bool,
  pub wait_count: usize,
}

#[cfg(test)]
impl TestWindow {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      extents: Default::default(),
      current: vk::Extent2D { width, height },
      resized: false,
      wait_count: 0,
    }
  }

  pub fn resize(&mut self, width: u32, height: u32) {
    self.current = vk::Extent2D { width, height };
    self.resized = true;
  }
}

#[cfg(test)]
impl AppWindow for TestWindow {
  fn extent(&self) -> vk::Extent2D {
    self.current
  }

  fn was_resized(&self) -> bool {
    self.resized
  }

  fn reset_resized_flag(&mut self) {
    self.resized = false;
  }

  fn wait_events(&mut self) {
    self.wait_count += 1;
    if let Some(next) = self.extents.pop_front() {
      self.current = next;
    }
  }
}
