use ash::vk;
use log::info;

use super::RenderSystem;
use crate::config::ShaderPaths;
use crate::error::{EngineResult, VkResultExt};
use crate::renderer::FrameInfo;
use crate::utils::get_simple_type_name;
use crate::vk_ctx::{GpuDeviceRef, GraphicsPipelineDesc};
use crate::vk_utils::*;

const BINDING_INDEX_HDR_COLOR: u32 = 0;
const TONEMAP_SUBPASS: u32 = 1;
/// Single triangle covering the screen, generated from `gl_VertexIndex`
const FULLSCREEN_TRIANGLE_VERTEX_COUNT: u32 = 3;

/// Second subpass of the main render pass. Reads the main color attachment
/// as `subpassInput` and writes the swapchain image.
pub struct TonemapRenderSystem {
  device: GpuDeviceRef,
  pipeline: Pipeline,
  pipeline_layout: PipelineLayout,
  input_layout: DescriptorSetLayout,
}

impl TonemapRenderSystem {
  pub fn new(
    device: &GpuDeviceRef,
    render_pass: vk::RenderPass,
    shaders: &ShaderPaths,
  ) -> EngineResult<Self> {
    info!("Creating {}", get_simple_type_name::<Self>());

    let input_layout = DescriptorSetLayout::new(
      device,
      vec![create_input_attachment_binding(
        BINDING_INDEX_HDR_COLOR,
        vk::ShaderStageFlags::FRAGMENT,
      )],
    )
    .context("vkCreateDescriptorSetLayout")?;
    let pipeline_layout = PipelineLayout::new(device, &[input_layout.layout], &[])?;
    let config = PipelineConfig::default()
      .without_vertex_input()
      .without_depth()
      .in_subpass(TONEMAP_SUBPASS);
    let pipeline = Pipeline::graphics(
      device,
      &GraphicsPipelineDesc {
        vertex_shader: shaders.tonemap_vert.clone(),
        fragment_shader: shaders.tonemap_frag.clone(),
        config,
        layout: pipeline_layout.layout,
        render_pass,
      },
    )?;

    Ok(Self {
      device: device.clone(),
      pipeline,
      pipeline_layout,
      input_layout,
    })
  }
}

impl RenderSystem for TonemapRenderSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()> {
    let command_buffer = frame.command_buffer;

    // the acquired image decides which main color view to read
    let input_set = DescriptorWriter::new(&self.input_layout, frame.frame_pool)
      .write(BindableResource::InputAttachment {
        binding: BINDING_INDEX_HDR_COLOR,
        image_view: frame.main_color_view,
      })
      .build()
      .context("vkAllocateDescriptorSets")?;

    self.pipeline.bind(command_buffer);
    self.device.cmd_bind_descriptor_set(
      command_buffer,
      vk::PipelineBindPoint::GRAPHICS,
      self.pipeline_layout.layout,
      0,
      input_set,
    );
    self
      .device
      .cmd_draw(command_buffer, FULLSCREEN_TRIANGLE_VERTEX_COUNT, 1, 0, 0);

    Ok(())
  }
}
