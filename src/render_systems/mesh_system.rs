use ash::vk;

use super::{BasicRenderSystem, PbrRenderSystem, RenderSystem};
use crate::config::{ShaderPaths, ShadingModel};
use crate::error::EngineResult;
use crate::renderer::FrameInfo;
use crate::vk_ctx::GpuDeviceRef;
use crate::vk_utils::DescriptorSetLayout;

/// Render system for game objects with a model, picked by `ShadingModel`
pub enum MeshRenderSystem {
  Pbr(PbrRenderSystem),
  Basic(BasicRenderSystem),
}

impl MeshRenderSystem {
  pub fn new(
    device: &GpuDeviceRef,
    render_pass: vk::RenderPass,
    global_layout: &DescriptorSetLayout,
    shaders: &ShaderPaths,
    shading_model: ShadingModel,
  ) -> EngineResult<Self> {
    let system = match shading_model {
      ShadingModel::Pbr => {
        MeshRenderSystem::Pbr(PbrRenderSystem::new(device, render_pass, global_layout, shaders)?)
      }
      ShadingModel::Basic => MeshRenderSystem::Basic(BasicRenderSystem::new(
        device,
        render_pass,
        global_layout,
        shaders,
      )?),
    };
    Ok(system)
  }

  /// Work that has to be recorded outside of the render pass.
  /// Only PBR has any: the environment map irradiance pass.
  pub fn compute(&self, frame: &FrameInfo) -> EngineResult<()> {
    match self {
      MeshRenderSystem::Pbr(system) => system.compute(frame),
      MeshRenderSystem::Basic(_) => Ok(()),
    }
  }
}

impl RenderSystem for MeshRenderSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()> {
    match self {
      MeshRenderSystem::Pbr(system) => system.render(frame),
      MeshRenderSystem::Basic(system) => system.render(frame),
    }
  }
}
