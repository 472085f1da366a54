use ash::vk;
use log::info;

use super::{bind_global_set, draw_meshes, RenderSystem, MESH_STAGES};
use crate::config::ShaderPaths;
use crate::error::{EngineResult, VkResultExt};
use crate::renderer::FrameInfo;
use crate::scene::ObjectBufferData;
use crate::utils::get_simple_type_name;
use crate::vk_ctx::{GpuDeviceRef, GraphicsPipelineDesc};
use crate::vk_utils::*;

const BINDING_INDEX_OBJECT_UBO: u32 = 0;
const BINDING_INDEX_DIFFUSE: u32 = 1;

/// Blinn-Phong shading with a single diffuse texture. Cheaper alternative
/// to `PbrRenderSystem`, same set 0 and push constant contract.
pub struct BasicRenderSystem {
  device: GpuDeviceRef,
  pipeline: Pipeline,
  pipeline_layout: PipelineLayout,
  object_layout: DescriptorSetLayout,
}

impl BasicRenderSystem {
  pub fn new(
    device: &GpuDeviceRef,
    render_pass: vk::RenderPass,
    global_layout: &DescriptorSetLayout,
    shaders: &ShaderPaths,
  ) -> EngineResult<Self> {
    info!("Creating {}", get_simple_type_name::<Self>());

    let object_layout = DescriptorSetLayout::new(
      device,
      vec![
        create_ubo_binding(BINDING_INDEX_OBJECT_UBO, MESH_STAGES),
        create_texture_binding(BINDING_INDEX_DIFFUSE, vk::ShaderStageFlags::FRAGMENT),
      ],
    )
    .context("vkCreateDescriptorSetLayout")?;
    let pipeline_layout = PipelineLayout::new(
      device,
      &[global_layout.layout, object_layout.layout],
      &[push_constant_range::<ObjectBufferData>(MESH_STAGES)],
    )?;
    let pipeline = Pipeline::graphics(
      device,
      &GraphicsPipelineDesc {
        vertex_shader: shaders.basic_vert.clone(),
        fragment_shader: shaders.basic_frag.clone(),
        config: PipelineConfig::default(),
        layout: pipeline_layout.layout,
        render_pass,
      },
    )?;

    Ok(Self {
      device: device.clone(),
      pipeline,
      pipeline_layout,
      object_layout,
    })
  }
}

impl RenderSystem for BasicRenderSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()> {
    let layout = self.pipeline_layout.layout;
    self.pipeline.bind(frame.command_buffer);
    bind_global_set(&self.device, frame, layout);

    draw_meshes(&self.device, frame, layout, &self.object_layout, |writer, obj| {
      writer.write(obj.diffuse_map.descriptor(BINDING_INDEX_DIFFUSE))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render_systems::test_fixture::Fixture;
  use crate::vk_ctx::TestCall;

  #[test]
  fn draws_models_with_diffuse_only_set() {
    let mut fx = Fixture::new();
    let model = fx.quad_model();
    fx.objects.create_game_object().model = Some(model);
    fx.objects.create_game_object();
    let system = BasicRenderSystem::new(
      &fx.device,
      fx.render_pass,
      fx.globals.layout(),
      &fx.config.shaders,
    )
    .unwrap();
    fx.recording.clear_calls();

    system.render(&fx.frame_info(0)).unwrap();

    let calls = fx.recording.calls();
    let object_set = calls
      .iter()
      .find_map(|c| match c {
        TestCall::BindDescriptorSet { set_index: 1, set, .. } => Some(*set),
        _ => None,
      })
      .unwrap();
    let bindings: Vec<u32> = fx
      .recording
      .descriptor_writes(object_set)
      .iter()
      .map(|w| w.binding())
      .collect();
    assert_eq!(bindings, vec![0, 1]);
    assert_eq!(
      calls
        .iter()
        .filter(|c| matches!(c, TestCall::DrawIndexed { .. }))
        .count(),
      1
    );
  }

  #[test]
  fn pipeline_uses_basic_shaders() {
    let fx = Fixture::new();
    let _system = BasicRenderSystem::new(
      &fx.device,
      fx.render_pass,
      fx.globals.layout(),
      &fx.config.shaders,
    )
    .unwrap();

    assert!(fx.recording.calls().iter().any(|c| matches!(
      c,
      TestCall::CreateGraphicsPipeline { vertex_shader, subpass: 0, .. }
        if vertex_shader.ends_with("basic.vert.spv")
    )));
  }
}
