use log::{info, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem::ManuallyDrop;

use ash;
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain};
use ash::prelude::VkResult;
use ash::vk;
use vma::Alloc;

use super::*;
use crate::error::EngineResult;
use crate::vk_utils::*;

/// Allocation backing a `GpuBuffer`, with its persistent mapping if any
pub(super) struct BufferAllocation {
  allocation: vma::Allocation,
  mapped_pointer: Option<MemoryMapPointer>,
}

/// Kitchen sink for Vulkan stuff. Implements `GpuDevice` with ash + vma.
pub struct VkCtx {
  pub entry: ash::Entry,
  pub instance: ash::Instance,
  pub device: ash::Device,
  pub phys_device: vk::PhysicalDevice,
  pub queue_family_index: u32,
  /// Graphics + present
  pub queue: vk::Queue,
  pub command_pool: vk::CommandPool,
  /// Used for one-time uploads
  pub(super) setup_cmd_buf: vk::CommandBuffer,
  pub allocator: ManuallyDrop<vma::Allocator>,
  pub(super) limits: vk::PhysicalDeviceLimits,

  // surface
  pub(super) surface_loader: Surface,
  pub(super) surface_khr: vk::SurfaceKHR,
  pub(super) swapchain_loader: Swapchain,

  // debug
  pub(super) debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,

  // vma allocations of resources handed out by raw handle
  pub(super) buffer_allocations: RefCell<HashMap<vk::Buffer, BufferAllocation>>,
  pub(super) image_allocations: RefCell<HashMap<vk::Image, vma::Allocation>>,
}

impl VkCtx {
  fn with_setup_cb(&self, callback: impl FnOnce(&ash::Device, vk::CommandBuffer)) -> VkResult<()> {
    unsafe { execute_setup_cmd_buf(&self.device, self.queue, self.setup_cmd_buf, callback) }
  }

  fn create_image_raw(
    &self,
    desc: &ImageDesc,
    memory: VkMemoryPreference,
  ) -> VkResult<(vk::Image, vma::Allocation)> {
    let create_info = vk::ImageCreateInfo::builder()
      .image_type(vk::ImageType::TYPE_2D)
      .extent(vk::Extent3D {
        width: desc.extent.width,
        height: desc.extent.height,
        depth: 1,
      })
      .format(desc.format)
      .tiling(vk::ImageTiling::OPTIMAL)
      .usage(desc.usage)
      .initial_layout(vk::ImageLayout::UNDEFINED)
      // verbose properties, but vulkan requires
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .samples(vk::SampleCountFlags::TYPE_1)
      .mip_levels(1)
      .array_layers(1)
      .build();
    let alloc_info = determine_gpu_allocation_info(&memory);
    unsafe { self.allocator.create_image(&create_info, &alloc_info) }
  }
}

impl GpuDevice for VkCtx {
  fn surface_support(&self) -> VkResult<SurfaceSupport> {
    unsafe {
      Ok(SurfaceSupport {
        capabilities: self
          .surface_loader
          .get_physical_device_surface_capabilities(self.phys_device, self.surface_khr)?,
        formats: self
          .surface_loader
          .get_physical_device_surface_formats(self.phys_device, self.surface_khr)?,
        present_modes: self
          .surface_loader
          .get_physical_device_surface_present_modes(self.phys_device, self.surface_khr)?,
      })
    }
  }

  fn find_supported_format(
    &self,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
  ) -> Option<vk::Format> {
    candidates.iter().copied().find(|&format| {
      let props = unsafe {
        self
          .instance
          .get_physical_device_format_properties(self.phys_device, format)
      };
      match tiling {
        vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
        vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
        _ => false,
      }
    })
  }

  fn wait_idle(&self) -> VkResult<()> {
    unsafe { self.device.device_wait_idle() }
  }

  ////////////////////////////////
  /// Swapchain & presentation
  ////////////////////////////////

  fn create_swapchain(&self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR> {
    let create_info = vk::SwapchainCreateInfoKHR::builder()
      .surface(self.surface_khr)
      .min_image_count(desc.min_image_count)
      .image_format(desc.surface_format.format)
      .image_color_space(desc.surface_format.color_space)
      .image_extent(desc.extent)
      .image_array_layers(1)
      .image_usage(desc.image_usage)
      // single queue for graphics and present
      .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
      .pre_transform(desc.pre_transform)
      .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
      .present_mode(desc.present_mode)
      .clipped(true)
      .old_swapchain(desc.old_swapchain)
      .build();
    unsafe { self.swapchain_loader.create_swapchain(&create_info, None) }
  }

  fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
    unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
  }

  fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
    unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) }
  }

  fn acquire_next_image(
    &self,
    swapchain: vk::SwapchainKHR,
    signal_semaphore: vk::Semaphore,
  ) -> VkResult<(u32, bool)> {
    unsafe {
      self.swapchain_loader.acquire_next_image(
        swapchain,
        u64::MAX,
        signal_semaphore,
        vk::Fence::null(),
      )
    }
  }

  fn queue_submit(&self, submit: &SubmitDesc) -> VkResult<()> {
    let wait_semaphores = [submit.wait_semaphore];
    let wait_stages = [submit.wait_stage];
    let command_buffers = [submit.command_buffer];
    let signal_semaphores = [submit.signal_semaphore];
    let submit_info = vk::SubmitInfo::builder()
      .wait_semaphores(&wait_semaphores)
      .wait_dst_stage_mask(&wait_stages)
      .command_buffers(&command_buffers)
      .signal_semaphores(&signal_semaphores)
      .build();
    unsafe {
      self
        .device
        .queue_submit(self.queue, &[submit_info], submit.fence)
    }
  }

  fn queue_present(
    &self,
    swapchain: vk::SwapchainKHR,
    image_index: u32,
    wait_semaphore: vk::Semaphore,
  ) -> VkResult<bool> {
    let wait_semaphores = [wait_semaphore];
    let swapchains = [swapchain];
    let image_indices = [image_index];
    let present_info = vk::PresentInfoKHR::builder()
      .wait_semaphores(&wait_semaphores)
      .swapchains(&swapchains)
      .image_indices(&image_indices)
      .build();
    unsafe { self.swapchain_loader.queue_present(self.queue, &present_info) }
  }

  ////////////////////////////////
  /// Images
  ////////////////////////////////

  fn create_image_view(
    &self,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
  ) -> VkResult<vk::ImageView> {
    unsafe { create_image_view(&self.device, image, format, aspect) }
  }

  fn destroy_image_view(&self, view: vk::ImageView) {
    unsafe { self.device.destroy_image_view(view, None) }
  }

  fn create_image(&self, desc: &ImageDesc) -> VkResult<GpuImage> {
    let (image, mut allocation) = self.create_image_raw(desc, VkMemoryPreference::GpuOnly)?;
    let view = match unsafe { create_image_view(&self.device, image, desc.format, desc.aspect) } {
      Ok(view) => view,
      Err(e) => {
        unsafe { self.allocator.destroy_image(image, &mut allocation) };
        return Err(e);
      }
    };
    self.image_allocations.borrow_mut().insert(image, allocation);
    trace!(
      "Created image {}x{} {:?}",
      desc.extent.width,
      desc.extent.height,
      desc.format
    );

    Ok(GpuImage {
      image,
      view,
      format: desc.format,
      extent: desc.extent,
    })
  }

  fn upload_image(
    &self,
    image: &GpuImage,
    pixels: &[u8],
    final_layout: vk::ImageLayout,
  ) -> VkResult<()> {
    let scratch = self.create_buffer(
      pixels.len() as u64,
      vk::BufferUsageFlags::TRANSFER_SRC,
      VkMemoryPreference::ScratchTransfer,
    )?;
    self.write_buffer(&scratch, 0, pixels);

    let aspect = vk::ImageAspectFlags::COLOR;
    let result = self.with_setup_cb(|device, cmd_buf| unsafe {
      let to_transfer = create_image_barrier(
        image.image,
        aspect,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        vk::AccessFlags::empty(),
        vk::AccessFlags::TRANSFER_WRITE,
      );
      device.cmd_pipeline_barrier(
        cmd_buf,
        vk::PipelineStageFlags::TOP_OF_PIPE,
        vk::PipelineStageFlags::TRANSFER,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[to_transfer],
      );

      let region = vk::BufferImageCopy::builder()
        .image_subresource(vk::ImageSubresourceLayers {
          aspect_mask: aspect,
          mip_level: 0,
          base_array_layer: 0,
          layer_count: 1,
        })
        .image_extent(vk::Extent3D {
          width: image.extent.width,
          height: image.extent.height,
          depth: 1,
        })
        .build();
      device.cmd_copy_buffer_to_image(
        cmd_buf,
        scratch.buffer,
        image.image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        &[region],
      );

      let to_shader_read = create_image_barrier(
        image.image,
        aspect,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        final_layout,
        vk::AccessFlags::TRANSFER_WRITE,
        vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
      );
      // do not do any SHADER_READ before this
      device.cmd_pipeline_barrier(
        cmd_buf,
        vk::PipelineStageFlags::TRANSFER,
        vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[to_shader_read],
      );
    });

    self.destroy_buffer(&scratch);
    result
  }

  fn destroy_image(&self, image: &GpuImage) {
    unsafe { self.device.destroy_image_view(image.view, None) };
    if let Some(mut allocation) = self.image_allocations.borrow_mut().remove(&image.image) {
      unsafe { self.allocator.destroy_image(image.image, &mut allocation) };
    }
  }

  fn create_sampler(&self) -> VkResult<vk::Sampler> {
    // TODO move max anisotropy into Config
    let max_anisotropy = self.limits.max_sampler_anisotropy.min(16.0);
    unsafe { create_sampler(&self.device, Some(max_anisotropy)) }
  }

  fn destroy_sampler(&self, sampler: vk::Sampler) {
    unsafe { self.device.destroy_sampler(sampler, None) }
  }

  ////////////////////////////////
  /// Render pass & framebuffers
  ////////////////////////////////

  fn create_render_pass(&self, layout: &RenderPassLayout) -> VkResult<vk::RenderPass> {
    unsafe { create_render_pass_from_layout(&self.device, layout) }
  }

  fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
    unsafe { self.device.destroy_render_pass(render_pass, None) }
  }

  fn create_framebuffer(
    &self,
    render_pass: vk::RenderPass,
    attachments: &[vk::ImageView],
    extent: vk::Extent2D,
  ) -> VkResult<vk::Framebuffer> {
    unsafe { create_framebuffer(&self.device, render_pass, attachments, &extent) }
  }

  fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
    unsafe { self.device.destroy_framebuffer(framebuffer, None) }
  }

  ////////////////////////////////
  /// Synchronization
  ////////////////////////////////

  fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::builder().build();
    unsafe { self.device.create_semaphore(&create_info, None) }
  }

  fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
    unsafe { self.device.destroy_semaphore(semaphore, None) }
  }

  fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
    let flags = if signaled {
      vk::FenceCreateFlags::SIGNALED
    } else {
      vk::FenceCreateFlags::empty()
    };
    let create_info = vk::FenceCreateInfo::builder().flags(flags).build();
    unsafe { self.device.create_fence(&create_info, None) }
  }

  fn destroy_fence(&self, fence: vk::Fence) {
    unsafe { self.device.destroy_fence(fence, None) }
  }

  fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> VkResult<()> {
    unsafe { self.device.wait_for_fences(&[fence], true, timeout) }
  }

  fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
    unsafe { self.device.reset_fences(&[fence]) }
  }

  ////////////////////////////////
  /// Command buffers
  ////////////////////////////////

  fn allocate_command_buffers(&self, count: u32) -> VkResult<Vec<vk::CommandBuffer>> {
    let create_info = vk::CommandBufferAllocateInfo::builder()
      .command_buffer_count(count)
      .command_pool(self.command_pool)
      .level(vk::CommandBufferLevel::PRIMARY)
      .build();
    unsafe { self.device.allocate_command_buffers(&create_info) }
  }

  fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
    unsafe {
      self
        .device
        .free_command_buffers(self.command_pool, command_buffers)
    }
  }

  fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
    let begin_info = vk::CommandBufferBeginInfo::builder().build();
    unsafe {
      self
        .device
        .begin_command_buffer(command_buffer, &begin_info)
    }
  }

  fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
    unsafe { self.device.end_command_buffer(command_buffer) }
  }

  ////////////////////////////////
  /// Buffers
  ////////////////////////////////

  fn create_buffer(
    &self,
    size: u64,
    usage: vk::BufferUsageFlags,
    memory: VkMemoryPreference,
  ) -> VkResult<GpuBuffer> {
    let queue_family_indices = [self.queue_family_index];
    let buffer_info = vk::BufferCreateInfo::builder()
      .size(size)
      .usage(usage)
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .queue_family_indices(&queue_family_indices)
      .build();
    let alloc_info = determine_gpu_allocation_info(&memory);

    let (buffer, allocation) = unsafe { self.allocator.create_buffer(&buffer_info, &alloc_info)? };
    let mapped_pointer = match memory {
      VkMemoryPreference::GpuOnly => None,
      _ => get_persistently_mapped_pointer(&self.allocator, &allocation),
    };

    self.buffer_allocations.borrow_mut().insert(
      buffer,
      BufferAllocation {
        allocation,
        mapped_pointer,
      },
    );
    Ok(GpuBuffer { buffer, size })
  }

  fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, bytes: &[u8]) {
    let allocations = self.buffer_allocations.borrow();
    let pointer = allocations
      .get(&buffer.buffer)
      .and_then(|alloc| alloc.mapped_pointer);
    match pointer {
      Some(pointer) => {
        assert!(
          offset + bytes.len() as u64 <= buffer.size,
          "Write of {} bytes at offset {} overflows buffer of {} bytes",
          bytes.len(),
          offset,
          buffer.size
        );
        unsafe { pointer.write(offset as usize, bytes) }
      }
      None => panic!(
        "Tried to write {} bytes to unmapped buffer {:?}",
        bytes.len(),
        buffer.buffer
      ),
    }
  }

  fn destroy_buffer(&self, buffer: &GpuBuffer) {
    if let Some(mut slot) = self.buffer_allocations.borrow_mut().remove(&buffer.buffer) {
      unsafe {
        self
          .allocator
          .destroy_buffer(buffer.buffer, &mut slot.allocation)
      };
    }
  }

  fn min_uniform_buffer_offset_alignment(&self) -> u64 {
    self.limits.min_uniform_buffer_offset_alignment
  }

  ////////////////////////////////
  /// Descriptors
  ////////////////////////////////

  fn create_descriptor_set_layout(
    &self,
    bindings: &[vk::DescriptorSetLayoutBinding],
  ) -> VkResult<vk::DescriptorSetLayout> {
    let create_info = vk::DescriptorSetLayoutCreateInfo::builder()
      .bindings(bindings)
      .build();
    unsafe { self.device.create_descriptor_set_layout(&create_info, None) }
  }

  fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
    unsafe { self.device.destroy_descriptor_set_layout(layout, None) }
  }

  fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> VkResult<vk::DescriptorPool> {
    let create_info = vk::DescriptorPoolCreateInfo::builder()
      .flags(desc.flags)
      .max_sets(desc.max_sets)
      .pool_sizes(&desc.pool_sizes)
      .build();
    unsafe { self.device.create_descriptor_pool(&create_info, None) }
  }

  fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
    unsafe {
      self
        .device
        .reset_descriptor_pool(pool, vk::DescriptorPoolResetFlags::empty())
    }
  }

  fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
    unsafe { self.device.destroy_descriptor_pool(pool, None) }
  }

  fn allocate_descriptor_set(
    &self,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
  ) -> VkResult<vk::DescriptorSet> {
    let layouts = [layout];
    let alloc_info = vk::DescriptorSetAllocateInfo::builder()
      .descriptor_pool(pool)
      .set_layouts(&layouts)
      .build();
    let sets = unsafe { self.device.allocate_descriptor_sets(&alloc_info)? };
    sets
      .first()
      .copied()
      .ok_or(vk::Result::ERROR_OUT_OF_POOL_MEMORY)
  }

  fn update_descriptor_set(&self, set: vk::DescriptorSet, resources: &[BindableResource]) {
    // infos have to outlive the writes that point into them
    let buffer_infos: Vec<[vk::DescriptorBufferInfo; 1]> = resources
      .iter()
      .map(|res| match *res {
        BindableResource::Buffer {
          buffer,
          offset,
          range,
          ..
        } => [vk::DescriptorBufferInfo {
          buffer,
          offset,
          range,
        }],
        _ => [vk::DescriptorBufferInfo::default()],
      })
      .collect();
    let image_infos: Vec<[vk::DescriptorImageInfo; 1]> = resources
      .iter()
      .map(|res| match *res {
        BindableResource::Texture {
          image_view,
          sampler,
          layout,
          ..
        } => [vk::DescriptorImageInfo {
          sampler,
          image_view,
          image_layout: layout,
        }],
        BindableResource::StorageImage { image_view, .. } => [vk::DescriptorImageInfo {
          sampler: vk::Sampler::null(),
          image_view,
          image_layout: vk::ImageLayout::GENERAL,
        }],
        BindableResource::InputAttachment { image_view, .. } => [vk::DescriptorImageInfo {
          sampler: vk::Sampler::null(),
          image_view,
          image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }],
        BindableResource::Buffer { .. } => [vk::DescriptorImageInfo::default()],
      })
      .collect();

    let writes: Vec<vk::WriteDescriptorSet> = resources
      .iter()
      .enumerate()
      .map(|(idx, res)| {
        let builder = vk::WriteDescriptorSet::builder()
          .dst_set(set)
          .dst_binding(res.binding())
          .dst_array_element(0)
          .descriptor_type(res.descriptor_type());
        match res {
          BindableResource::Buffer { .. } => builder.buffer_info(&buffer_infos[idx]).build(),
          _ => builder.image_info(&image_infos[idx]).build(),
        }
      })
      .collect();

    unsafe { self.device.update_descriptor_sets(&writes, &[]) }
  }

  ////////////////////////////////
  /// Pipelines
  ////////////////////////////////

  fn create_pipeline_layout(
    &self,
    set_layouts: &[vk::DescriptorSetLayout],
    push_constant_ranges: &[vk::PushConstantRange],
  ) -> VkResult<vk::PipelineLayout> {
    let create_info = vk::PipelineLayoutCreateInfo::builder()
      .set_layouts(set_layouts)
      .push_constant_ranges(push_constant_ranges)
      .build();
    unsafe { self.device.create_pipeline_layout(&create_info, None) }
  }

  fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
    unsafe { self.device.destroy_pipeline_layout(layout, None) }
  }

  fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> EngineResult<vk::Pipeline> {
    unsafe { create_graphics_pipeline(&self.device, desc) }
  }

  fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> EngineResult<vk::Pipeline> {
    unsafe { create_compute_pipeline(&self.device, desc) }
  }

  fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
    unsafe { self.device.destroy_pipeline(pipeline, None) }
  }

  ////////////////////////////////
  /// Command recording
  ////////////////////////////////

  fn cmd_begin_render_pass(&self, command_buffer: vk::CommandBuffer, begin: &RenderPassBegin) {
    let begin_info = vk::RenderPassBeginInfo::builder()
      .render_pass(begin.render_pass)
      .framebuffer(begin.framebuffer)
      .render_area(begin.render_area)
      .clear_values(&begin.clear_values)
      .build();
    unsafe {
      self.device.cmd_begin_render_pass(
        command_buffer,
        &begin_info,
        vk::SubpassContents::INLINE,
      )
    }
  }

  fn cmd_next_subpass(&self, command_buffer: vk::CommandBuffer) {
    unsafe {
      self
        .device
        .cmd_next_subpass(command_buffer, vk::SubpassContents::INLINE)
    }
  }

  fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
    unsafe { self.device.cmd_end_render_pass(command_buffer) }
  }

  fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
    unsafe { self.device.cmd_set_viewport(command_buffer, 0, &[viewport]) }
  }

  fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
    unsafe { self.device.cmd_set_scissor(command_buffer, 0, &[scissor]) }
  }

  fn cmd_bind_pipeline(
    &self,
    command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
  ) {
    unsafe {
      self
        .device
        .cmd_bind_pipeline(command_buffer, bind_point, pipeline)
    }
  }

  fn cmd_bind_descriptor_set(
    &self,
    command_buffer: vk::CommandBuffer,
    bind_point: vk::PipelineBindPoint,
    layout: vk::PipelineLayout,
    set_index: u32,
    set: vk::DescriptorSet,
  ) {
    unsafe {
      self.device.cmd_bind_descriptor_sets(
        command_buffer,
        bind_point,
        layout,
        set_index,
        &[set],
        &[],
      )
    }
  }

  fn cmd_push_constants(
    &self,
    command_buffer: vk::CommandBuffer,
    layout: vk::PipelineLayout,
    stages: vk::ShaderStageFlags,
    bytes: &[u8],
  ) {
    unsafe {
      self
        .device
        .cmd_push_constants(command_buffer, layout, stages, 0, bytes)
    }
  }

  fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
    unsafe {
      self
        .device
        .cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[0])
    }
  }

  fn cmd_bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
    unsafe {
      self
        .device
        .cmd_bind_index_buffer(command_buffer, buffer, 0, vk::IndexType::UINT32)
    }
  }

  fn cmd_draw(
    &self,
    command_buffer: vk::CommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
  ) {
    unsafe {
      self.device.cmd_draw(
        command_buffer,
        vertex_count,
        instance_count,
        first_vertex,
        first_instance,
      )
    }
  }

  fn cmd_draw_indexed(
    &self,
    command_buffer: vk::CommandBuffer,
    index_count: u32,
    instance_count: u32,
    first_index: u32,
  ) {
    unsafe {
      self
        .device
        .cmd_draw_indexed(command_buffer, index_count, instance_count, first_index, 0, 0)
    }
  }

  fn cmd_dispatch(&self, command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32) {
    unsafe { self.device.cmd_dispatch(command_buffer, x, y, z) }
  }
}

impl Drop for VkCtx {
  fn drop(&mut self) {
    info!("VkCtx::drop()");
    unsafe {
      // best effort, nothing to do with the error at this point
      let _ = self.device.device_wait_idle();

      // leftovers, should be empty if every owner released its resources
      for (buffer, mut slot) in self.buffer_allocations.borrow_mut().drain() {
        self.allocator.destroy_buffer(buffer, &mut slot.allocation);
      }
      for (image, mut allocation) in self.image_allocations.borrow_mut().drain() {
        self.allocator.destroy_image(image, &mut allocation);
      }

      self
        .device
        .free_command_buffers(self.command_pool, &[self.setup_cmd_buf]);
      self.device.destroy_command_pool(self.command_pool, None);
      ManuallyDrop::drop(&mut self.allocator);
      self.device.destroy_device(None);
      self.surface_loader.destroy_surface(self.surface_khr, None);

      if let Some((debug_utils_loader, debug_messenger)) = self.debug_utils.take() {
        debug_utils_loader.destroy_debug_utils_messenger(debug_messenger, None);
      }

      self.instance.destroy_instance(None);
    }
    info!("VkCtx::drop() finished");
  }
}
