use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

/// Fatal engine failures. Contract violations (calling frame-scoped
/// operations out of order, exceeding fixed capacities) are not errors,
/// they panic.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("{call} failed: {result}")]
  Vulkan {
    call: &'static str,
    result: vk::Result,
  },

  #[error(
    "Swapchain formats changed on recreation (color {old_color:?} -> {new_color:?}, depth {old_depth:?} -> {new_depth:?})"
  )]
  SwapchainFormatChanged {
    old_color: vk::Format,
    new_color: vk::Format,
    old_depth: vk::Format,
    new_depth: vk::Format,
  },

  #[error("Surface reports no formats")]
  NoSurfaceFormat,

  #[error("None of the depth formats {0:?} is supported")]
  NoDepthFormat(Vec<vk::Format>),

  #[error("No physical device with graphics+present queue found")]
  NoSuitableDevice,

  #[error("Failed to load Vulkan library: {0}")]
  Loading(#[from] ash::LoadingError),

  #[error("Asset '{path}': {reason}")]
  Asset { path: PathBuf, reason: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Attach the name of the failing Vulkan call to a raw `vk::Result`.
pub trait VkResultExt<T> {
  fn context(self, call: &'static str) -> EngineResult<T>;
}

impl<T> VkResultExt<T> for Result<T, vk::Result> {
  fn context(self, call: &'static str) -> EngineResult<T> {
    self.map_err(|result| EngineError::Vulkan { call, result })
  }
}
