use std::rc::Rc;

mod gpu_device;
#[cfg(test)]
mod recording_device;
mod vk_ctx;
mod vk_ctx_initialize;

pub use gpu_device::*;
#[cfg(test)]
pub use recording_device::*;
pub use vk_ctx::*;
pub use vk_ctx_initialize::*;

/// Shared handle to the device. Every RAII wrapper keeps one so it can
/// release its resources in `Drop`.
pub type GpuDeviceRef = Rc<dyn GpuDevice>;
