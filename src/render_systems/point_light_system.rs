use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use log::info;

use super::{bind_global_set, RenderSystem, MESH_STAGES};
use crate::config::ShaderPaths;
use crate::error::EngineResult;
use crate::renderer::{FrameInfo, GlobalUbo, PointLight, MAX_LIGHTS};
use crate::scene::{GameObject, GameObjectManager};
use crate::utils::get_simple_type_name;
use crate::vk_ctx::{GpuDeviceRef, GraphicsPipelineDesc};
use crate::vk_utils::*;

/// Billboard quad generated in the vertex shader from `gl_VertexIndex`
const BILLBOARD_VERTEX_COUNT: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct PointLightPushConstants {
  /// w is ignored
  pub position: Vec4,
  /// w is intensity
  pub color: Vec4,
  pub radius: f32,
  pub _padding: [f32; 3],
}

unsafe impl Zeroable for PointLightPushConstants {}
unsafe impl Pod for PointLightPushConstants {}

/// Point lights with their squared distance to `camera_position`, farthest
/// first. Equidistant lights are all kept, lower id first.
pub fn sort_lights_back_to_front(
  game_objects: &GameObjectManager,
  camera_position: Vec3,
) -> Vec<(f32, &GameObject)> {
  let mut lights: Vec<(f32, &GameObject)> = game_objects
    .iter()
    .filter(|obj| obj.point_light.is_some())
    .map(|obj| {
      let offset = camera_position - obj.transform.translation;
      (offset.dot(offset), obj)
    })
    .collect();

  lights.sort_by(|(dist_a, obj_a), (dist_b, obj_b)| {
    dist_b
      .total_cmp(dist_a)
      .then(obj_a.id().cmp(&obj_b.id()))
  });
  lights
}

/// Draws every point light as an alpha blended billboard, back to front.
/// Also fills the light array of `GlobalUbo`, see `update`.
pub struct PointLightSystem {
  device: GpuDeviceRef,
  pipeline: Pipeline,
  pipeline_layout: PipelineLayout,
}

impl PointLightSystem {
  pub fn new(
    device: &GpuDeviceRef,
    render_pass: vk::RenderPass,
    global_layout: &DescriptorSetLayout,
    shaders: &ShaderPaths,
  ) -> EngineResult<Self> {
    info!("Creating {}", get_simple_type_name::<Self>());

    let pipeline_layout = PipelineLayout::new(
      device,
      &[global_layout.layout],
      &[push_constant_range::<PointLightPushConstants>(MESH_STAGES)],
    )?;
    let config = PipelineConfig::default()
      .enable_alpha_blending()
      .without_vertex_input();
    let pipeline = Pipeline::graphics(
      device,
      &GraphicsPipelineDesc {
        vertex_shader: shaders.point_light_vert.clone(),
        fragment_shader: shaders.point_light_frag.clone(),
        config,
        layout: pipeline_layout.layout,
        render_pass,
      },
    )?;

    Ok(Self {
      device: device.clone(),
      pipeline,
      pipeline_layout,
    })
  }

  /// Copy every light into `ubo`, in id order. Runs in the update phase,
  /// before any render system records.
  ///
  /// More than `MAX_LIGHTS` lights is a bug in the scene setup.
  pub fn update(&self, frame: &FrameInfo, ubo: &mut GlobalUbo) {
    let mut light_index = 0;
    for obj in frame.game_objects.iter() {
      let light = match obj.point_light {
        Some(light) => light,
        None => continue,
      };
      assert!(
        light_index < MAX_LIGHTS,
        "Point light count exceeds MAX_LIGHTS ({})",
        MAX_LIGHTS
      );
      ubo.point_lights[light_index] = PointLight {
        position: obj.transform.translation.extend(1.0),
        color: obj.color.extend(light.light_intensity),
      };
      light_index += 1;
    }
    ubo.num_lights = light_index as i32;
  }
}

impl RenderSystem for PointLightSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()> {
    let command_buffer = frame.command_buffer;
    let layout = self.pipeline_layout.layout;
    let sorted = sort_lights_back_to_front(frame.game_objects, frame.camera.position());

    self.pipeline.bind(command_buffer);
    bind_global_set(&self.device, frame, layout);

    for (_, obj) in sorted {
      let intensity = obj.point_light.map_or(0.0, |l| l.light_intensity);
      let push = PointLightPushConstants {
        position: obj.transform.translation.extend(1.0),
        color: obj.color.extend(intensity),
        radius: obj.transform.scale.x,
        _padding: [0.0; 3],
      };
      self.device.cmd_push_constants(
        command_buffer,
        layout,
        MESH_STAGES,
        bytemuck::bytes_of(&push),
      );
      self
        .device
        .cmd_draw(command_buffer, BILLBOARD_VERTEX_COUNT, 1, 0, 0);
    }

    Ok(())
  }
}
