// mostly inspired by:
// - https://github.com/zeux/niagara/tree/master/src
// - https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L256
// - https://vulkan-tutorial.com/

pub use self::create_barrier::*;
pub use self::create_framebuffer::*;
pub use self::create_image_view::*;
pub use self::create_sampler::*;
pub use self::load_shader::*;
pub use self::model::*;
pub use self::pipeline::*;
pub use self::render_pass::*;
pub use self::setup_cmd_buf::*;
pub use self::swapchain::*;
pub use self::uniforms::*;
pub use self::vk_buffer::*;
pub use self::vk_memory_resource::*;
pub use self::vk_texture::*;

mod create_barrier;
mod create_framebuffer;
mod create_image_view;
mod create_sampler;
pub mod debug;
mod load_shader;
mod model;
mod pipeline;
mod render_pass;
mod setup_cmd_buf;
mod swapchain;
mod uniforms;
mod vk_buffer;
mod vk_memory_resource;
mod vk_texture;
