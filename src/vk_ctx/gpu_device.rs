use std::path::PathBuf;

use ash::prelude::VkResult;
use ash::vk;

use crate::error::EngineResult;
use crate::vk_utils::{BindableResource, PipelineConfig, RenderPassLayout, VkMemoryPreference};

/// What the surface can do. Queried before every swapchain (re)creation.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSupport {
  pub capabilities: vk::SurfaceCapabilitiesKHR,
  pub formats: Vec<vk::SurfaceFormatKHR>,
  pub present_modes: Vec<vk::PresentModeKHR>,
}

#[derive(Clone, Copy, Debug)]
pub struct SwapchainDesc {
  pub surface_format: vk::SurfaceFormatKHR,
  pub present_mode: vk::PresentModeKHR,
  pub extent: vk::Extent2D,
  pub min_image_count: u32,
  pub image_usage: vk::ImageUsageFlags,
  pub pre_transform: vk::SurfaceTransformFlagsKHR,
  /// Previous swapchain, `null` on first creation
  pub old_swapchain: vk::SwapchainKHR,
}

/// 2D image with a single mip and a view covering it.
#[derive(Clone, Copy, Debug)]
pub struct ImageDesc {
  pub extent: vk::Extent2D,
  pub format: vk::Format,
  pub usage: vk::ImageUsageFlags,
  pub aspect: vk::ImageAspectFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuImage {
  pub image: vk::Image,
  pub view: vk::ImageView,
  pub format: vk::Format,
  pub extent: vk::Extent2D,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuBuffer {
  pub buffer: vk::Buffer,
  /// Size in bytes
  pub size: u64,
}

#[derive(Clone, Debug)]
pub struct DescriptorPoolDesc {
  pub max_sets: u32,
  pub pool_sizes: Vec<vk::DescriptorPoolSize>,
  pub flags: vk::DescriptorPoolCreateFlags,
}

#[derive(Clone, Debug)]
pub struct GraphicsPipelineDesc {
  pub vertex_shader: PathBuf,
  pub fragment_shader: PathBuf,
  pub config: PipelineConfig,
  pub layout: vk::PipelineLayout,
  pub render_pass: vk::RenderPass,
}

#[derive(Clone, Debug)]
pub struct ComputePipelineDesc {
  pub compute_shader: PathBuf,
  pub layout: vk::PipelineLayout,
}

#[derive(Clone, Copy, Debug)]
pub struct SubmitDesc {
  pub command_buffer: vk::CommandBuffer,
  pub wait_semaphore: vk::Semaphore,
  pub wait_stage: vk::PipelineStageFlags,
  pub signal_semaphore: vk::Semaphore,
  pub fence: vk::Fence,
}

// `vk::ClearValue` is a union, no `Debug`
#[derive(Clone)]
pub struct RenderPassBegin {
  pub render_pass: vk::RenderPass,
  pub framebuffer: vk::Framebuffer,
  pub render_area: vk::Rect2D,
  pub clear_values: Vec<vk::ClearValue>,
}

/// Every GPU operation the renderer core needs. Implemented by `VkCtx` on
/// top of ash + vma, and by a recording fake in tests.
///
/// Handles are raw `vk::*` handles. Ownership is NOT tracked here, the RAII
/// wrappers (`VkBuffer`, `Swapchain`, `DescriptorPool`, ...) pair every
/// `create_*` with a `destroy_*` in their `Drop`.
pub trait GpuDevice {
  ////////////////////////////////
  /// Surface & device
  ////////////////////////////////

  fn surface_support(&self) -> VkResult<SurfaceSupport>;

  /// First of `candidates` whose tiling supports all `features`.
  fn find_supported_format(
    &self,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
  ) -> Option<vk::Format>;

  fn wait_idle(&self) -> VkResult<()>;

  ////////////////////////////////
  /// Swapchain & presentation
  ////////////////////////////////

  fn create_swapchain(&self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR>;
  fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
  fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

  /// Returns `(image_index, is_suboptimal)`. Stale swapchain is
  /// `Err(vk::Result::ERROR_OUT_OF_DATE_KHR)`.
  fn acquire_next_image(
    &self,
    swapchain: vk::SwapchainKHR,
    signal_semaphore: vk::Semaphore,
  ) -> VkResult<(u32, bool)>;

  fn queue_submit(&self, submit: &SubmitDesc) -> VkResult<()>;

  /// Returns `is_suboptimal`.
  fn queue_present(
    &self,
    swapchain: vk::SwapchainKHR,
    image_index: u32,
    wait_semaphore: vk::Semaphore,
  ) -> VkResult<bool>;

  ////////////////////////////////
  /// Images
  ////////////////////////////////

  fn create_image_view(
    &self,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
  ) -> VkResult<vk::ImageView>;
  fn destroy_image_view(&self, view: vk::ImageView);

  /// Allocate device-local image and its view
  fn create_image(&self, desc: &ImageDesc) -> VkResult<GpuImage>;
  /// Copy tightly packed pixels into `image` and leave it in `final_layout`
  /// (`SHADER_READ_ONLY_OPTIMAL` for textures, `GENERAL` for storage images).
  fn upload_image(
    &self,
    image: &GpuImage,
    pixels: &[u8],
    final_layout: vk::ImageLayout,
  ) -> VkResult<()>;
  fn destroy_image(&self, image: &GpuImage);

  fn create_sampler(&self) -> VkResult<vk::Sampler>;
  fn destroy_sampler(&self, sampler: vk::Sampler);

  ////////////////////////////////
  /// Render pass & framebuffers
  ////////////////////////////////

  fn create_render_pass(&self, layout: &RenderPassLayout) -> VkResult<vk::RenderPass>;
  fn destroy_render_pass(&self, render_pass: vk::RenderPass);

  fn create_framebuffer(
    &self,
    render_pass: vk::RenderPass,
    attachments: &[vk::ImageView],
    extent: vk::Extent2D,
  ) -> VkResult<vk::Framebuffer>;
  fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

  ////////////////////////////////
  /// Synchronization
  ////////////////////////////////

  fn create_semaphore(&self) -> VkResult<vk::Semaphore>;
  fn destroy_semaphore(&self, semaphore: vk::Semaphore);
  fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence>;
  fn destroy_fence(&self, fence: vk::Fence);
  fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> VkResult<()>;
  fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;

  ////////////////////////////////
  /// Command buffers
  ////////////////////////////////

  fn allocate_command_buffers(&self, count: u32) -> VkResult<Vec<vk::CommandBuffer>>;
  fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]);
  fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
  fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;

  ////////////////////////////////
  /// Buffers
  ////////////////////////////////

  fn create_buffer(
    &self,
    size: u64,
    usage: vk::BufferUsageFlags,
    memory: VkMemoryPreference,
  ) -> VkResult<GpuBuffer>;
  /// Write into mapped memory. Writing to a buffer that is not host-visible
  /// is a programming error.
  fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, bytes: &[u8]);
  fn destroy_buffer(&self, buffer: &GpuBuffer);

  /// Alignment every dynamic sub-range of a uniform buffer has to respect
  fn min_uniform_buffer_offset_alignment(&self) -> u64;

  ////////////////////////////////
  /// Descriptors
  ////////////////////////////////

  fn create_descriptor_set_layout(
    &self,
    bindings: &[vk::DescriptorSetLayoutBinding],
  ) -> VkResult<vk::DescriptorSetLayout>;
  fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);

  fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> VkResult<vk::DescriptorPool>;
  fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()>;
  fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

  fn allocate_descriptor_set(
    &self,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
  ) -> VkResult<vk::DescriptorSet>;
  fn update_descriptor_set(&self, set: vk::DescriptorSet, resources: &[BindableResource]);

  ////////////////////////////////
  /// Pipelines
  ////////////////////////////////

  fn create_pipeline_layout(
    &self,
    set_layouts: &[vk::DescriptorSetLayout],
    push_constant_ranges: &[vk::PushConstantRange],
  ) -> VkResult<vk::PipelineLayout>;
  fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

  /// Shader binaries are read from disk, so this can also fail with an asset error
  fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> EngineResult<vk::Pipeline>;
  fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> EngineResult<vk::Pipeline>;
  fn destroy_pipeline(&self, pipeline: vk::Pipeline);

  ////////////////////////////////
  /// Command recording
  ////////////////////////////////

  fn cmd_begin_render_pass(&self, command_buffer: vk::CommandBuffer, begin: &RenderPassBegin);
  fn cmd_next_subpass(&self, command_buffer: vk::CommandBuffer);
  fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);
  fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport);
  fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D);

  fn cmd_bind_pipeline(
    &self,
    command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
  );
  fn cmd_bind_descriptor_set(
    &self,
    command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    layout: vk::PipelineLayout,
    set_index: u32,
    set: vk::DescriptorSet,
  );
  fn cmd_push_constants(
    &self,
    command_buffer: vk::CommandBuffer,
    layout: vk::PipelineLayout,
    stages: vk::ShaderStageFlags,
    bytes: &[u8],
  );

  fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer);
  fn cmd_bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer);
  fn cmd_draw(
    &self,
    command_buffer: vk::CommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
  );
  fn cmd_draw_indexed(
    &self,
    command_buffer: vk::CommandBuffer,
    index_count: u32,
    instance_count: u32,
    first_index: u32,
  );
  fn cmd_dispatch(&self, command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32);
}
