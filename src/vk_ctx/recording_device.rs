use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use ash::prelude::VkResult;
use ash::vk;
use ash::vk::Handle;

use super::*;
use crate::error::{EngineError, EngineResult};
use crate::vk_utils::{BindableResource, RenderPassLayout, VkMemoryPreference};

/// Every command or state change the renderer asked the device for, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum TestCall {
  WaitIdle,
  CreateSwapchain {
    swapchain: vk::SwapchainKHR,
    old_swapchain: vk::SwapchainKHR,
    extent: (u32, u32),
    min_image_count: u32,
  },
  DestroySwapchain(vk::SwapchainKHR),
  AcquireNextImage {
    swapchain: vk::SwapchainKHR,
    semaphore: vk::Semaphore,
  },
  QueueSubmit {
    command_buffer: vk::CommandBuffer,
    wait_semaphore: vk::Semaphore,
    signal_semaphore: vk::Semaphore,
    fence: vk::Fence,
  },
  QueuePresent {
    swapchain: vk::SwapchainKHR,
    image_index: u32,
    wait_semaphore: vk::Semaphore,
  },
  WaitForFence(vk::Fence),
  ResetFence(vk::Fence),
  BeginCommandBuffer(vk::CommandBuffer),
  EndCommandBuffer(vk::CommandBuffer),
  CreateDescriptorPool {
    pool: vk::DescriptorPool,
    max_sets: u32,
  },
  ResetDescriptorPool(vk::DescriptorPool),
  AllocateDescriptorSet {
    pool: vk::DescriptorPool,
  },
  UpdateDescriptorSet(vk::DescriptorSet),
  CreateGraphicsPipeline {
    pipeline: vk::Pipeline,
    vertex_shader: PathBuf,
    subpass: u32,
  },
  CreateComputePipeline {
    pipeline: vk::Pipeline,
    compute_shader: PathBuf,
  },
  BeginRenderPass {
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: (u32, u32),
    clear_value_count: usize,
  },
  NextSubpass,
  EndRenderPass,
  SetViewport {
    width: f32,
    height: f32,
  },
  SetScissor {
    extent: (u32, u32),
  },
  BindPipeline {
    bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
  },
  BindDescriptorSet {
    bind_point: vk::PipelineBindPoint,
    layout: vk::PipelineLayout,
    set_index: u32,
    set: vk::DescriptorSet,
  },
  PushConstants {
    layout: vk::PipelineLayout,
    stages: vk::ShaderStageFlags,
    bytes: Vec<u8>,
  },
  BindVertexBuffer(vk::Buffer),
  BindIndexBuffer(vk::Buffer),
  Draw {
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
  },
  DrawIndexed {
    index_count: u32,
    instance_count: u32,
    first_index: u32,
  },
  Dispatch {
    x: u32,
    y: u32,
    z: u32,
  },
}

struct RecordedBuffer {
  memory: VkMemoryPreference,
  bytes: Vec<u8>,
}

struct RecordedPool {
  max_sets: u32,
  allocated: u32,
}

struct State {
  next_handle: u64,
  calls: Vec<TestCall>,
  /// raw handles that were created and not destroyed yet
  live: HashSet<u64>,
  buffers: HashMap<u64, RecordedBuffer>,
  pools: HashMap<u64, RecordedPool>,
  descriptor_writes: HashMap<u64, Vec<BindableResource>>,
  /// swapchain -> (image count, next image to hand out)
  swapchains: HashMap<u64, (u32, u32)>,
  surface: SurfaceSupport,
  depth_format: Option<vk::Format>,
  acquire_results: VecDeque<VkResult<(u32, bool)>>,
  present_results: VecDeque<VkResult<bool>>,
}

impl State {
  fn mint(&mut self) -> u64 {
    self.next_handle += 1;
    self.next_handle
  }

  fn mint_live(&mut self) -> u64 {
    let raw = self.mint();
    self.live.insert(raw);
    raw
  }

  fn release(&mut self, raw: u64) {
    self.live.remove(&raw);
  }
}

pub fn default_surface_support() -> SurfaceSupport {
  SurfaceSupport {
    capabilities: vk::SurfaceCapabilitiesKHR {
      min_image_count: 2,
      max_image_count: 3,
      // window decides
      current_extent: vk::Extent2D {
        width: u32::MAX,
        height: u32::MAX,
      },
      min_image_extent: vk::Extent2D {
        width: 1,
        height: 1,
      },
      max_image_extent: vk::Extent2D {
        width: 4096,
        height: 4096,
      },
      current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
      ..Default::default()
    },
    formats: vec![vk::SurfaceFormatKHR {
      format: vk::Format::B8G8R8A8_SRGB,
      color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }],
    present_modes: vec![vk::PresentModeKHR::FIFO],
  }
}

/// `GpuDevice` without a GPU. Mints unique handles, records every call and
/// keeps buffer/descriptor contents around so tests can read them back.
/// Acquire and present results can be scripted, otherwise acquire hands out
/// images round-robin and present succeeds.
pub struct RecordingDevice {
  state: RefCell<State>,
}

impl RecordingDevice {
  pub fn new() -> Self {
    Self {
      state: RefCell::new(State {
        next_handle: 0,
        calls: Vec::new(),
        live: HashSet::new(),
        buffers: HashMap::new(),
        pools: HashMap::new(),
        descriptor_writes: HashMap::new(),
        swapchains: HashMap::new(),
        surface: default_surface_support(),
        depth_format: Some(vk::Format::D32_SFLOAT),
        acquire_results: VecDeque::new(),
        present_results: VecDeque::new(),
      }),
    }
  }

  fn record(&self, call: TestCall) {
    self.state.borrow_mut().calls.push(call);
  }

  ////////////////////////////////
  /// Scripting
  ////////////////////////////////

  pub fn set_surface_formats(&self, formats: Vec<vk::SurfaceFormatKHR>) {
    self.state.borrow_mut().surface.formats = formats;
  }

  pub fn set_surface_capabilities(&self, capabilities: vk::SurfaceCapabilitiesKHR) {
    self.state.borrow_mut().surface.capabilities = capabilities;
  }

  pub fn set_present_modes(&self, present_modes: Vec<vk::PresentModeKHR>) {
    self.state.borrow_mut().surface.present_modes = present_modes;
  }

  pub fn set_depth_format(&self, format: Option<vk::Format>) {
    self.state.borrow_mut().depth_format = format;
  }

  /// Returned by the next `acquire_next_image` instead of the round-robin index
  pub fn push_acquire_result(&self, result: VkResult<(u32, bool)>) {
    self.state.borrow_mut().acquire_results.push_back(result);
  }

  /// Returned by the next `queue_present` instead of `Ok(false)`
  pub fn push_present_result(&self, result: VkResult<bool>) {
    self.state.borrow_mut().present_results.push_back(result);
  }

  ////////////////////////////////
  /// Inspection
  ////////////////////////////////

  pub fn calls(&self) -> Vec<TestCall> {
    self.state.borrow().calls.clone()
  }

  pub fn clear_calls(&self) {
    self.state.borrow_mut().calls.clear();
  }

  /// Every `Draw`/`DrawIndexed`/`Dispatch` together with the push constants
  /// that were active when it was issued.
  pub fn draws_with_push_constants(&self) -> Vec<(TestCall, Option<Vec<u8>>)> {
    let mut last_push = None;
    let mut result = Vec::new();
    for call in self.state.borrow().calls.iter() {
      match call {
        TestCall::PushConstants { bytes, .. } => last_push = Some(bytes.clone()),
        TestCall::Draw { .. } | TestCall::DrawIndexed { .. } | TestCall::Dispatch { .. } => {
          result.push((call.clone(), last_push.clone()))
        }
        _ => {}
      }
    }
    result
  }

  pub fn live_object_count(&self) -> usize {
    self.state.borrow().live.len()
  }

  pub fn buffer_contents(&self, buffer: vk::Buffer) -> Vec<u8> {
    self
      .state
      .borrow()
      .buffers
      .get(&buffer.as_raw())
      .map(|b| b.bytes.clone())
      .unwrap_or_default()
  }

  pub fn descriptor_writes(&self, set: vk::DescriptorSet) -> Vec<BindableResource> {
    self
      .state
      .borrow()
      .descriptor_writes
      .get(&set.as_raw())
      .cloned()
      .unwrap_or_default()
  }

  /// Handle that is not backed by anything, for bindings in tests
  pub fn fake_buffer(&self) -> vk::Buffer {
    vk::Buffer::from_raw(self.state.borrow_mut().mint())
  }

  pub fn fake_image_view(&self) -> vk::ImageView {
    vk::ImageView::from_raw(self.state.borrow_mut().mint())
  }
}

impl GpuDevice for RecordingDevice {
  fn surface_support(&self) -> VkResult<SurfaceSupport> {
    Ok(self.state.borrow().surface.clone())
  }

  fn find_supported_format(
    &self,
    candidates: &[vk::Format],
    _tiling: vk::ImageTiling,
    _features: vk::FormatFeatureFlags,
  ) -> Option<vk::Format> {
    let depth_format = self.state.borrow().depth_format?;
    candidates.iter().copied().find(|f| *f == depth_format)
  }

  fn wait_idle(&self) -> VkResult<()> {
    self.record(TestCall::WaitIdle);
    Ok(())
  }

  fn create_swapchain(&self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR> {
    let mut state = self.state.borrow_mut();
    let raw = state.mint_live();
    state.swapchains.insert(raw, (desc.min_image_count, 0));
    let swapchain = vk::SwapchainKHR::from_raw(raw);
    state.calls.push(TestCall::CreateSwapchain {
      swapchain,
      old_swapchain: desc.old_swapchain,
      extent: (desc.extent.width, desc.extent.height),
      min_image_count: desc.min_image_count,
    });
    Ok(swapchain)
  }

  fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
    let mut state = self.state.borrow_mut();
    let count = state
      .swapchains
      .get(&swapchain.as_raw())
      .map(|s| s.0)
      .ok_or(vk::Result::ERROR_SURFACE_LOST_KHR)?;
    Ok((0..count).map(|_| vk::Image::from_raw(state.mint())).collect())
  }

  fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
    let mut state = self.state.borrow_mut();
    state.swapchains.remove(&swapchain.as_raw());
    state.release(swapchain.as_raw());
    state.calls.push(TestCall::DestroySwapchain(swapchain));
  }

  fn acquire_next_image(
    &self,
    swapchain: vk::SwapchainKHR,
    signal_semaphore: vk::Semaphore,
  ) -> VkResult<(u32, bool)> {
    let mut state = self.state.borrow_mut();
    state.calls.push(TestCall::AcquireNextImage {
      swapchain,
      semaphore: signal_semaphore,
    });
    if let Some(result) = state.acquire_results.pop_front() {
      return result;
    }
    let entry = state
      .swapchains
      .get_mut(&swapchain.as_raw())
      .ok_or(vk::Result::ERROR_OUT_OF_DATE_KHR)?;
    let image_index = entry.1;
    entry.1 = (entry.1 + 1) % entry.0;
    Ok((image_index, false))
  }

  fn queue_submit(&self, submit: &SubmitDesc) -> VkResult<()> {
    self.record(TestCall::QueueSubmit {
      command_buffer: submit.command_buffer,
      wait_semaphore: submit.wait_semaphore,
      signal_semaphore: submit.signal_semaphore,
      fence: submit.fence,
    });
    Ok(())
  }

  fn queue_present(
    &self,
    swapchain: vk::SwapchainKHR,
    image_index: u32,
    wait_semaphore: vk::Semaphore,
  ) -> VkResult<bool> {
    let mut state = self.state.borrow_mut();
    state.calls.push(TestCall::QueuePresent {
      swapchain,
      image_index,
      wait_semaphore,
    });
    state.present_results.pop_front().unwrap_or(Ok(false))
  }

  fn create_image_view(
    &self,
    _image: vk::Image,
    _format: vk::Format,
    _aspect: vk::ImageAspectFlags,
  ) -> VkResult<vk::ImageView> {
    Ok(vk::ImageView::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_image_view(&self, view: vk::ImageView) {
    self.state.borrow_mut().release(view.as_raw());
  }

  fn create_image(&self, desc: &ImageDesc) -> VkResult<GpuImage> {
    let mut state = self.state.borrow_mut();
    let image = vk::Image::from_raw(state.mint_live());
    let view = vk::ImageView::from_raw(state.mint_live());
    Ok(GpuImage {
      image,
      view,
      format: desc.format,
      extent: desc.extent,
    })
  }

  fn upload_image(
    &self,
    _image: &GpuImage,
    _pixels: &[u8],
    _final_layout: vk::ImageLayout,
  ) -> VkResult<()> {
    Ok(())
  }

  fn destroy_image(&self, image: &GpuImage) {
    let mut state = self.state.borrow_mut();
    state.release(image.view.as_raw());
    state.release(image.image.as_raw());
  }

  fn create_sampler(&self) -> VkResult<vk::Sampler> {
    Ok(vk::Sampler::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_sampler(&self, sampler: vk::Sampler) {
    self.state.borrow_mut().release(sampler.as_raw());
  }

  fn create_render_pass(&self, _layout: &RenderPassLayout) -> VkResult<vk::RenderPass> {
    Ok(vk::RenderPass::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
    self.state.borrow_mut().release(render_pass.as_raw());
  }

  fn create_framebuffer(
    &self,
    _render_pass: vk::RenderPass,
    _attachments: &[vk::ImageView],
    _extent: vk::Extent2D,
  ) -> VkResult<vk::Framebuffer> {
    Ok(vk::Framebuffer::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
    self.state.borrow_mut().release(framebuffer.as_raw());
  }

  fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
    Ok(vk::Semaphore::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
    self.state.borrow_mut().release(semaphore.as_raw());
  }

  fn create_fence(&self, _signaled: bool) -> VkResult<vk::Fence> {
    Ok(vk::Fence::from_raw(self.state.borrow_mut().mint_live()))
  }

  fn destroy_fence(&self, fence: vk::Fence) {
    self.state.borrow_mut().release(fence.as_raw());
  }

  fn wait_for_fence(&self, fence: vk::Fence, _timeout: u64) -> VkResult<()> {
    self.record(TestCall::WaitForFence(fence));
    Ok(())
  }

  fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
    self.record(TestCall::ResetFence(fence));
    Ok(())
  }

  fn allocate_command_buffers(&self, count: u32) -> VkResult<Vec<vk::CommandBuffer>> {
    let mut state = self.state.borrow_mut();
    Ok(
      (0..count)
        .map(|_| vk::CommandBuffer::from_raw(state.mint_live()))
        .collect(),
    )
  }

  fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
    let mut state = self.state.borrow_mut();
    command_buffers
      .iter()
      .for_each(|cmd| state.release(cmd.as_raw()));
  }

  fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
    self.record(TestCall::BeginCommandBuffer(command_buffer));
    Ok(())
  }

  fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
    self.record(TestCall::EndCommandBuffer(command_buffer));
    Ok(())
  }

  fn create_buffer(
    &self,
    size: u64,
    _usage: vk::BufferUsageFlags,
    memory: VkMemoryPreference,
  ) -> VkResult<GpuBuffer> {
    let mut state = self.state.borrow_mut();
    let raw = state.mint_live();
    state.buffers.insert(
      raw,
      RecordedBuffer {
        memory,
        bytes: vec![0; size as usize],
      },
    );
    Ok(GpuBuffer {
      buffer: vk::Buffer::from_raw(raw),
      size,
    })
  }

  fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, bytes: &[u8]) {
    let mut state = self.state.borrow_mut();
    let recorded = state
      .buffers
      .get_mut(&buffer.buffer.as_raw())
      .expect("Write to unknown buffer");
    assert!(
      recorded.memory != VkMemoryPreference::GpuOnly,
      "Write to unmapped buffer"
    );
    let start = offset as usize;
    recorded.bytes[start..start + bytes.len()].copy_from_slice(bytes);
  }

  fn destroy_buffer(&self, buffer: &GpuBuffer) {
    let mut state = self.state.borrow_mut();
    state.buffers.remove(&buffer.buffer.as_raw());
    state.release(buffer.buffer.as_raw());
  }

  fn min_uniform_buffer_offset_alignment(&self) -> u64 {
    256
  }

  fn create_descriptor_set_layout(
    &self,
    _bindings: &[vk::DescriptorSetLayoutBinding],
  ) -> VkResult<vk::DescriptorSetLayout> {
    Ok(vk::DescriptorSetLayout::from_raw(
      self.state.borrow_mut().mint_live(),
    ))
  }

  fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
    self.state.borrow_mut().release(layout.as_raw());
  }

  fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> VkResult<vk::DescriptorPool> {
    let mut state = self.state.borrow_mut();
    let raw = state.mint_live();
    state.pools.insert(
      raw,
      RecordedPool {
        max_sets: desc.max_sets,
        allocated: 0,
      },
    );
    let pool = vk::DescriptorPool::from_raw(raw);
    state.calls.push(TestCall::CreateDescriptorPool {
      pool,
      max_sets: desc.max_sets,
    });
    Ok(pool)
  }

  fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
    let mut state = self.state.borrow_mut();
    if let Some(p) = state.pools.get_mut(&pool.as_raw()) {
      p.allocated = 0;
    }
    state.calls.push(TestCall::ResetDescriptorPool(pool));
    Ok(())
  }

  fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
    let mut state = self.state.borrow_mut();
    state.pools.remove(&pool.as_raw());
    state.release(pool.as_raw());
  }

  fn allocate_descriptor_set(
    &self,
    pool: vk::DescriptorPool,
    _layout: vk::DescriptorSetLayout,
  ) -> VkResult<vk::DescriptorSet> {
    let mut state = self.state.borrow_mut();
    state.calls.push(TestCall::AllocateDescriptorSet { pool });
    let recorded = state
      .pools
      .get_mut(&pool.as_raw())
      .ok_or(vk::Result::ERROR_UNKNOWN)?;
    if recorded.allocated >= recorded.max_sets {
      return Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
    }
    recorded.allocated += 1;
    // sets die with their pool, do not track them as live
    Ok(vk::DescriptorSet::from_raw(state.mint()))
  }

  fn update_descriptor_set(&self, set: vk::DescriptorSet, resources: &[BindableResource]) {
    let mut state = self.state.borrow_mut();
    state
      .descriptor_writes
      .entry(set.as_raw())
      .or_default()
      .extend_from_slice(resources);
    state.calls.push(TestCall::UpdateDescriptorSet(set));
  }

  fn create_pipeline_layout(
    &self,
    _set_layouts: &[vk::DescriptorSetLayout],
    _push_constant_ranges: &[vk::PushConstantRange],
  ) -> VkResult<vk::PipelineLayout> {
    Ok(vk::PipelineLayout::from_raw(
      self.state.borrow_mut().mint_live(),
    ))
  }

  fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
    self.state.borrow_mut().release(layout.as_raw());
  }

  fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> EngineResult<vk::Pipeline> {
    if desc.render_pass == vk::RenderPass::null() {
      return Err(EngineError::Vulkan {
        call: "vkCreateGraphicsPipelines",
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
      });
    }
    let mut state = self.state.borrow_mut();
    let pipeline = vk::Pipeline::from_raw(state.mint_live());
    state.calls.push(TestCall::CreateGraphicsPipeline {
      pipeline,
      vertex_shader: desc.vertex_shader.clone(),
      subpass: desc.config.subpass,
    });
    Ok(pipeline)
  }

  fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> EngineResult<vk::Pipeline> {
    let mut state = self.state.borrow_mut();
    let pipeline = vk::Pipeline::from_raw(state.mint_live());
    state.calls.push(TestCall::CreateComputePipeline {
      pipeline,
      compute_shader: desc.compute_shader.clone(),
    });
    Ok(pipeline)
  }

  fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
    self.state.borrow_mut().release(pipeline.as_raw());
  }

  fn cmd_begin_render_pass(&self, _command_buffer: vk::CommandBuffer, begin: &RenderPassBegin) {
    self.record(TestCall::BeginRenderPass {
      render_pass: begin.render_pass,
      framebuffer: begin.framebuffer,
      extent: (begin.render_area.extent.width, begin.render_area.extent.height),
      clear_value_count: begin.clear_values.len(),
    });
  }

  fn cmd_next_subpass(&self, _command_buffer: vk::CommandBuffer) {
    self.record(TestCall::NextSubpass);
  }

  fn cmd_end_render_pass(&self, _command_buffer: vk::CommandBuffer) {
    self.record(TestCall::EndRenderPass);
  }

  fn cmd_set_viewport(&self, _command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
    self.record(TestCall::SetViewport {
      width: viewport.width,
      height: viewport.height,
    });
  }

  fn cmd_set_scissor(&self, _command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
    self.record(TestCall::SetScissor {
      extent: (scissor.extent.width, scissor.extent.height),
    });
  }

  fn cmd_bind_pipeline(
    &self,
    _command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
  ) {
    self.record(TestCall::BindPipeline {
      bind_point,
      pipeline,
    });
  }

  fn cmd_bind_descriptor_set(
    &self,
    _command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    layout: vk::PipelineLayout,
    set_index: u32,
    set: vk::DescriptorSet,
  ) {
    self.record(TestCall::BindDescriptorSet {
      bind_point,
      layout,
      set_index,
      set,
    });
  }

  fn cmd_push_constants(
    &self,
    _command_buffer: vk::CommandBuffer,
    layout: vk::PipelineLayout,
    stages: vk::ShaderStageFlags,
    bytes: &[u8],
  ) {
    self.record(TestCall::PushConstants {
      layout,
      stages,
      bytes: bytes.to_vec(),
    });
  }

  fn cmd_bind_vertex_buffer(&self, _command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
    self.record(TestCall::BindVertexBuffer(buffer));
  }

  fn cmd_bind_index_buffer(&self, _command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
    self.record(TestCall::BindIndexBuffer(buffer));
  }

  fn cmd_draw(
    &self,
    _command_buffer: vk::CommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
  ) {
    self.record(TestCall::Draw {
      vertex_count,
      instance_count,
      first_vertex,
      first_instance,
    });
  }

  fn cmd_draw_indexed(
    &self,
    _command_buffer: vk::CommandBuffer,
    index_count: u32,
    instance_count: u32,
    first_index: u32,
  ) {
    self.record(TestCall::DrawIndexed {
      index_count,
      instance_count,
      first_index,
    });
  }

  fn cmd_dispatch(&self, _command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32) {
    self.record(TestCall::Dispatch { x, y, z });
  }
}
