use std::time::Instant;

use crate::utils::get_simple_type_name;

/// Longest frame time handed to the simulation. Dragging the window or a
/// breakpoint would otherwise teleport the camera.
pub const MAX_FRAME_TIME: f32 = 0.1;

pub type FrameIdx = u64;

/// Heavily inspired by:
/// - https://github.com/EmbarkStudios/kajiya/blob/main/crates/lib/kajiya-simple/src/main_loop.rs#L329
pub struct FrameTimer {
  frame_idx: FrameIdx,
  last_frame_start: Instant,
  delta_time: f32,
}

impl FrameTimer {
  pub fn new() -> Self {
    Self::starting_at(Instant::now())
  }

  fn starting_at(now: Instant) -> Self {
    Self {
      frame_idx: 0,
      last_frame_start: now,
      delta_time: 0.0,
    }
  }

  /// Frames started so far
  pub fn frame_idx(&self) -> FrameIdx {
    self.frame_idx
  }

  /// @return delta time in seconds
  pub fn mark_start_frame(&mut self) -> f32 {
    self.mark_start_frame_at(Instant::now())
  }

  fn mark_start_frame_at(&mut self, now: Instant) -> f32 {
    self.inc_frame_idx();
    let dt = now.saturating_duration_since(self.last_frame_start);
    self.last_frame_start = now;
    self.delta_time = dt.as_secs_f32().min(MAX_FRAME_TIME);
    self.delta_time
  }

  fn inc_frame_idx(&mut self) {
    match self.frame_idx.checked_add(1) {
      Some(e) => self.frame_idx = e,
      _ => panic!(
        "Integer overflow in {}.inc_frame_idx(). How long did the app run?!",
        get_simple_type_name::<Self>()
      ),
    }
  }

  pub fn delta_time(&self) -> f32 {
    self.delta_time
  }

  pub fn delta_time_ms(&self) -> f32 {
    self.delta_time * 1000.0
  }
}
