use ash;
use ash::vk;

use super::{load_shader, Vertex};
use crate::error::{EngineError, EngineResult, VkResultExt};
use crate::vk_ctx::{ComputePipelineDesc, GpuDeviceRef, GraphicsPipelineDesc};

/// Everything that differs between our graphics pipelines. Expanded into the
/// full `vk::GraphicsPipelineCreateInfo` by `create_graphics_pipeline`.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
  pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
  pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
  pub topology: vk::PrimitiveTopology,
  pub cull_mode: vk::CullModeFlags,
  pub depth_test: bool,
  pub depth_write: bool,
  pub alpha_blending: bool,
  /// Index of subpass in the render pass this pipeline is used in
  pub subpass: u32,
}

impl Default for PipelineConfig {
  /// Opaque meshes with `Vertex` layout, depth tested, drawn in the main subpass
  fn default() -> Self {
    Self {
      vertex_bindings: Vertex::binding_descriptions(),
      vertex_attributes: Vertex::attribute_descriptions(),
      topology: vk::PrimitiveTopology::TRIANGLE_LIST,
      cull_mode: vk::CullModeFlags::NONE,
      depth_test: true,
      depth_write: true,
      alpha_blending: false,
      subpass: 0,
    }
  }
}

impl PipelineConfig {
  /// `src.a * src + (1 - src.a) * dst`
  pub fn enable_alpha_blending(mut self) -> Self {
    self.alpha_blending = true;
    self
  }

  /// Vertices are generated in the shader from `gl_VertexIndex`
  pub fn without_vertex_input(mut self) -> Self {
    self.vertex_bindings.clear();
    self.vertex_attributes.clear();
    self
  }

  pub fn without_depth(mut self) -> Self {
    self.depth_test = false;
    self.depth_write = false;
    self
  }

  pub fn in_subpass(mut self, subpass: u32) -> Self {
    self.subpass = subpass;
    self
  }
}

// This file contains presets for `vk::GraphicsPipelineCreateInfo`.
// Most common options, so it's actually manageable and <100LOC every time

/// PipelineInputAssembly
pub fn ps_input_assembly(
  topology: vk::PrimitiveTopology,
) -> vk::PipelineInputAssemblyStateCreateInfo {
  vk::PipelineInputAssemblyStateCreateInfo::builder()
    .topology(topology)
    .build()
}

/// Does not specify dimensions during pipeline create, requires PipelineDynamicStateCreateInfo with
/// - vk::DynamicState::VIEWPORT
/// - vk::DynamicState::SCISSOR
pub fn ps_viewport_single_dynamic() -> vk::PipelineViewportStateCreateInfo {
  vk::PipelineViewportStateCreateInfo {
    viewport_count: 1,
    scissor_count: 1,
    ..Default::default()
  }
}

pub fn ps_raster_polygons(
  cull_mode: vk::CullModeFlags,
) -> vk::PipelineRasterizationStateCreateInfo {
  vk::PipelineRasterizationStateCreateInfo::builder()
    .depth_clamp_enable(false)
    .polygon_mode(vk::PolygonMode::FILL)
    .cull_mode(cull_mode)
    .front_face(vk::FrontFace::CLOCKWISE)
    .line_width(1.0) // validation layers: has to be 1.0 if not dynamic
    .build()
}

/// - Depth: test LESS
/// - Stencil: test SKIP
pub fn ps_depth_less(test: bool, write: bool) -> vk::PipelineDepthStencilStateCreateInfo {
  vk::PipelineDepthStencilStateCreateInfo::builder()
    .depth_test_enable(test)
    .depth_write_enable(write)
    .depth_compare_op(vk::CompareOp::LESS)
    .depth_bounds_test_enable(false)
    .stencil_test_enable(false)
    .build()
}

pub fn ps_multisample_disabled() -> vk::PipelineMultisampleStateCreateInfo {
  vk::PipelineMultisampleStateCreateInfo::builder()
    .rasterization_samples(vk::SampleCountFlags::TYPE_1)
    .sample_shading_enable(false)
    .build()
}

pub fn ps_color_attachment(alpha_blending: bool) -> vk::PipelineColorBlendAttachmentState {
  if alpha_blending {
    vk::PipelineColorBlendAttachmentState::builder()
      .color_write_mask(vk::ColorComponentFlags::RGBA)
      .blend_enable(true)
      .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
      .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
      .color_blend_op(vk::BlendOp::ADD)
      .src_alpha_blend_factor(vk::BlendFactor::ONE)
      .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
      .alpha_blend_op(vk::BlendOp::ADD)
      .build()
  } else {
    vk::PipelineColorBlendAttachmentState::builder()
      .color_write_mask(vk::ColorComponentFlags::RGBA)
      .blend_enable(false)
      .src_color_blend_factor(vk::BlendFactor::ONE) // shader output
      .dst_color_blend_factor(vk::BlendFactor::ZERO) // existing value on destination attachment
      .src_alpha_blend_factor(vk::BlendFactor::ONE)
      .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
      .build()
  }
}

/// List of things that will be provided as separate command before draw (actuall 'runtime').
/// Used so that we do not have to specify everything during pipeline create
pub fn ps_dynamic_state(states: &[vk::DynamicState]) -> vk::PipelineDynamicStateCreateInfo {
  vk::PipelineDynamicStateCreateInfo::builder()
    .dynamic_states(states)
    .build()
}

fn first_pipeline(
  result: Result<Vec<vk::Pipeline>, (Vec<vk::Pipeline>, vk::Result)>,
  call: &'static str,
) -> EngineResult<vk::Pipeline> {
  match result {
    Ok(pipelines) => pipelines
      .first()
      .copied()
      .ok_or(EngineError::Vulkan {
        call,
        result: vk::Result::ERROR_UNKNOWN,
      }),
    Err((_, result)) => Err(EngineError::Vulkan { call, result }),
  }
}

pub unsafe fn create_graphics_pipeline(
  device: &ash::Device,
  desc: &GraphicsPipelineDesc,
) -> EngineResult<vk::Pipeline> {
  let cfg = &desc.config;
  let (module_vs, stage_vs) = load_shader(device, vk::ShaderStageFlags::VERTEX, &desc.vertex_shader)?;
  let (module_fs, stage_fs) =
    match load_shader(device, vk::ShaderStageFlags::FRAGMENT, &desc.fragment_shader) {
      Ok(r) => r,
      Err(e) => {
        device.destroy_shader_module(module_vs, None);
        return Err(e);
      }
    };

  let stages = [stage_vs, stage_fs];
  let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder()
    .vertex_binding_descriptions(&cfg.vertex_bindings)
    .vertex_attribute_descriptions(&cfg.vertex_attributes)
    .build();
  let input_assembly_state = ps_input_assembly(cfg.topology);
  let viewport_state = ps_viewport_single_dynamic();
  let rasterization_state = ps_raster_polygons(cfg.cull_mode);
  let multisample_state = ps_multisample_disabled();
  let depth_stencil_state = ps_depth_less(cfg.depth_test, cfg.depth_write);
  let color_attachments = [ps_color_attachment(cfg.alpha_blending)];
  let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
    .attachments(&color_attachments)
    .build();
  let dynamic_state = ps_dynamic_state(&[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);

  let create_info = vk::GraphicsPipelineCreateInfo::builder()
    .stages(&stages)
    .vertex_input_state(&vertex_input_state)
    .input_assembly_state(&input_assembly_state)
    .viewport_state(&viewport_state)
    .rasterization_state(&rasterization_state)
    .multisample_state(&multisample_state)
    .depth_stencil_state(&depth_stencil_state)
    .color_blend_state(&color_blend_state)
    .dynamic_state(&dynamic_state)
    .layout(desc.layout)
    .render_pass(desc.render_pass)
    .subpass(cfg.subpass)
    .build();

  let result =
    device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None);

  device.destroy_shader_module(module_vs, None);
  device.destroy_shader_module(module_fs, None);

  first_pipeline(result, "vkCreateGraphicsPipelines")
}

pub unsafe fn create_compute_pipeline(
  device: &ash::Device,
  desc: &ComputePipelineDesc,
) -> EngineResult<vk::Pipeline> {
  let (module_cs, stage_cs) =
    load_shader(device, vk::ShaderStageFlags::COMPUTE, &desc.compute_shader)?;

  let create_info = vk::ComputePipelineCreateInfo::builder()
    .stage(stage_cs)
    .layout(desc.layout)
    .build();
  let result = device.create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None);

  device.destroy_shader_module(module_cs, None);

  first_pipeline(result, "vkCreateComputePipelines")
}

/// Push constant block of type `T` starting at offset 0
pub fn push_constant_range<T>(stage_flags: vk::ShaderStageFlags) -> vk::PushConstantRange {
  vk::PushConstantRange {
    stage_flags,
    offset: 0,
    size: std::mem::size_of::<T>() as u32,
  }
}

pub struct PipelineLayout {
  device: GpuDeviceRef,
  pub layout: vk::PipelineLayout,
}

impl PipelineLayout {
  pub fn new(
    device: &GpuDeviceRef,
    set_layouts: &[vk::DescriptorSetLayout],
    push_constant_ranges: &[vk::PushConstantRange],
  ) -> EngineResult<Self> {
    let layout = device
      .create_pipeline_layout(set_layouts, push_constant_ranges)
      .context("vkCreatePipelineLayout")?;
    Ok(Self {
      device: device.clone(),
      layout,
    })
  }
}

impl Drop for PipelineLayout {
  fn drop(&mut self) {
    self.device.destroy_pipeline_layout(self.layout);
  }
}

/// Graphics or compute pipeline, destroyed on drop. Does not own its layout.
pub struct Pipeline {
  device: GpuDeviceRef,
  pub pipeline: vk::Pipeline,
  pub bind_point: vk::PipelineBindPoint,
}

impl Pipeline {
  pub fn graphics(device: &GpuDeviceRef, desc: &GraphicsPipelineDesc) -> EngineResult<Self> {
    let pipeline = device.create_graphics_pipeline(desc)?;
    Ok(Self {
      device: device.clone(),
      pipeline,
      bind_point: vk::PipelineBindPoint::GRAPHICS,
    })
  }

  pub fn compute(device: &GpuDeviceRef, desc: &ComputePipelineDesc) -> EngineResult<Self> {
    let pipeline = device.create_compute_pipeline(desc)?;
    Ok(Self {
      device: device.clone(),
      pipeline,
      bind_point: vk::PipelineBindPoint::COMPUTE,
    })
  }

  pub fn bind(&self, command_buffer: vk::CommandBuffer) {
    self
      .device
      .cmd_bind_pipeline(command_buffer, self.bind_point, self.pipeline);
  }
}

impl Drop for Pipeline {
  fn drop(&mut self) {
    self.device.destroy_pipeline(self.pipeline);
  }
}
