pub use self::frame_info::*;
pub use self::frame_pools::*;
pub use self::frame_sync::*;
pub use self::renderer::*;
pub use self::swapchain::*;

mod frame_info;
mod frame_pools;
mod frame_sync;
mod renderer;
mod swapchain;
