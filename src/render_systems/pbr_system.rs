use ash::vk;
use log::info;

use super::{bind_global_set, draw_meshes, RenderSystem, MESH_STAGES};
use crate::config::ShaderPaths;
use crate::error::{EngineResult, VkResultExt};
use crate::renderer::FrameInfo;
use crate::scene::ObjectBufferData;
use crate::utils::get_simple_type_name;
use crate::vk_ctx::{ComputePipelineDesc, GpuDeviceRef, GraphicsPipelineDesc};
use crate::vk_utils::*;

const BINDING_INDEX_OBJECT_UBO: u32 = 0;
const BINDING_INDEX_ALBEDO: u32 = 1;
const BINDING_INDEX_NORMAL: u32 = 2;
const BINDING_INDEX_ROUGHNESS: u32 = 3;
const BINDING_INDEX_METALLIC: u32 = 4;
const BINDING_INDEX_SPECULAR: u32 = 5;
const BINDING_INDEX_IRRADIANCE: u32 = 6;
const BINDING_INDEX_BRDF_LUT: u32 = 7;

const BINDING_INDEX_COMPUTE_INPUT: u32 = 0;
const BINDING_INDEX_COMPUTE_OUTPUT: u32 = 1;
const BINDING_INDEX_COMPUTE_OUTPUT_MIP: u32 = 2;

/// Workgroups of the irradiance map pass
pub const IRRADIANCE_DISPATCH: (u32, u32, u32) = (32, 32, 1);

/// Metallic-roughness PBR for every game object with a model.
///
/// Set 1 (per object, per frame):
/// - 0: object buffer slot
/// - 1..=4: albedo, normal, roughness, metallic
/// - 5..=7: specular, irradiance, BRDF LUT. Objects do not carry these yet,
///   so they are bound to the metallic map.
///
/// Also owns the compute pipeline that refreshes environment maps, see `compute`.
pub struct PbrRenderSystem {
  device: GpuDeviceRef,
  // pipelines before layouts, layouts before descriptor set layouts
  pipeline: Pipeline,
  compute_pipeline: Pipeline,
  pipeline_layout: PipelineLayout,
  compute_pipeline_layout: PipelineLayout,
  object_layout: DescriptorSetLayout,
  compute_layout: DescriptorSetLayout,
}

impl PbrRenderSystem {
  pub fn new(
    device: &GpuDeviceRef,
    render_pass: vk::RenderPass,
    global_layout: &DescriptorSetLayout,
    shaders: &ShaderPaths,
  ) -> EngineResult<Self> {
    info!("Creating {}", get_simple_type_name::<Self>());

    let object_layout = DescriptorSetLayout::new(device, Self::get_object_bindings())
      .context("vkCreateDescriptorSetLayout")?;
    let pipeline_layout = PipelineLayout::new(
      device,
      &[global_layout.layout, object_layout.layout],
      &[push_constant_range::<ObjectBufferData>(MESH_STAGES)],
    )?;
    let pipeline = Pipeline::graphics(
      device,
      &GraphicsPipelineDesc {
        vertex_shader: shaders.pbr_vert.clone(),
        fragment_shader: shaders.pbr_frag.clone(),
        config: PipelineConfig::default(),
        layout: pipeline_layout.layout,
        render_pass,
      },
    )?;

    let compute_layout = DescriptorSetLayout::new(device, Self::get_compute_bindings())
      .context("vkCreateDescriptorSetLayout")?;
    let compute_pipeline_layout = PipelineLayout::new(device, &[compute_layout.layout], &[])?;
    let compute_pipeline = Pipeline::compute(
      device,
      &ComputePipelineDesc {
        compute_shader: shaders.irradiance_comp.clone(),
        layout: compute_pipeline_layout.layout,
      },
    )?;

    Ok(Self {
      device: device.clone(),
      pipeline,
      compute_pipeline,
      pipeline_layout,
      compute_pipeline_layout,
      object_layout,
      compute_layout,
    })
  }

  fn get_object_bindings() -> Vec<vk::DescriptorSetLayoutBinding> {
    let fragment = vk::ShaderStageFlags::FRAGMENT;
    vec![
      create_ubo_binding(BINDING_INDEX_OBJECT_UBO, MESH_STAGES),
      create_texture_binding(BINDING_INDEX_ALBEDO, fragment),
      create_texture_binding(BINDING_INDEX_NORMAL, fragment),
      create_texture_binding(BINDING_INDEX_ROUGHNESS, fragment),
      create_texture_binding(BINDING_INDEX_METALLIC, fragment),
      create_texture_binding(BINDING_INDEX_SPECULAR, fragment),
      create_texture_binding(BINDING_INDEX_IRRADIANCE, fragment),
      create_texture_binding(BINDING_INDEX_BRDF_LUT, fragment),
    ]
  }

  fn get_compute_bindings() -> Vec<vk::DescriptorSetLayoutBinding> {
    let compute = vk::ShaderStageFlags::COMPUTE;
    vec![
      create_texture_binding(BINDING_INDEX_COMPUTE_INPUT, compute),
      create_storage_image_binding(BINDING_INDEX_COMPUTE_OUTPUT, compute),
      create_storage_image_binding(BINDING_INDEX_COMPUTE_OUTPUT_MIP, compute),
    ]
  }

  /// Irradiance pass, one dispatch per object with an environment map.
  /// Record before the render pass begins, dispatch is not allowed inside one.
  pub fn compute(&self, frame: &FrameInfo) -> EngineResult<()> {
    let command_buffer = frame.command_buffer;
    let (x, y, z) = IRRADIANCE_DISPATCH;
    let mut bound = false;

    for obj in frame.game_objects.iter() {
      let env_map = match &obj.env_map {
        Some(env_map) => env_map,
        None => continue,
      };
      if !bound {
        self.compute_pipeline.bind(command_buffer);
        bound = true;
      }

      let set = DescriptorWriter::new(&self.compute_layout, frame.frame_pool)
        .write(obj.diffuse_map.descriptor(BINDING_INDEX_COMPUTE_INPUT))
        .write(env_map.storage_descriptor(BINDING_INDEX_COMPUTE_OUTPUT))
        .write(env_map.storage_descriptor(BINDING_INDEX_COMPUTE_OUTPUT_MIP))
        .build()
        .context("vkAllocateDescriptorSets")?;
      self.device.cmd_bind_descriptor_set(
        command_buffer,
        vk::PipelineBindPoint::COMPUTE,
        self.compute_pipeline_layout.layout,
        0,
        set,
      );
      self.device.cmd_dispatch(command_buffer, x, y, z);
    }

    Ok(())
  }
}

impl RenderSystem for PbrRenderSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()> {
    let layout = self.pipeline_layout.layout;
    self.pipeline.bind(frame.command_buffer);
    bind_global_set(&self.device, frame, layout);

    draw_meshes(&self.device, frame, layout, &self.object_layout, |writer, obj| {
      writer
        .write(obj.diffuse_map.descriptor(BINDING_INDEX_ALBEDO))
        .write(obj.normal_map.descriptor(BINDING_INDEX_NORMAL))
        .write(obj.roughness_map.descriptor(BINDING_INDEX_ROUGHNESS))
        .write(obj.metallic_map.descriptor(BINDING_INDEX_METALLIC))
        .write(obj.metallic_map.descriptor(BINDING_INDEX_SPECULAR))
        .write(obj.metallic_map.descriptor(BINDING_INDEX_IRRADIANCE))
        .write(obj.metallic_map.descriptor(BINDING_INDEX_BRDF_LUT))
    })
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use super::*;
  use crate::assets::ImageData;
  use crate::render_systems::test_fixture::Fixture;
  use crate::vk_ctx::TestCall;
  use glam::vec3;

  fn create_system(fx: &Fixture) -> PbrRenderSystem {
    PbrRenderSystem::new(
      &fx.device,
      fx.render_pass,
      fx.globals.layout(),
      &fx.config.shaders,
    )
    .unwrap()
  }

  fn draws(fx: &Fixture) -> Vec<TestCall> {
    fx.recording
      .calls()
      .into_iter()
      .filter(|c| matches!(c, TestCall::Draw { .. } | TestCall::DrawIndexed { .. }))
      .collect()
  }

  #[test]
  fn objects_without_model_are_skipped() {
    let mut fx = Fixture::new();
    let model = fx.quad_model();
    fx.objects.create_game_object();
    fx.objects.create_game_object().model = Some(model.clone());
    fx.objects.make_point_light(10.0, 0.1, vec3(1.0, 1.0, 1.0));
    fx.objects.create_game_object().model = Some(model);
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.render(&fx.frame_info(0)).unwrap();

    assert_eq!(draws(&fx).len(), 2);
    assert_eq!(fx.pools.allocated_this_frame(0), 2);
    assert_eq!(fx.pools.allocated_this_frame(1), 0);
  }

  #[test]
  fn binds_global_set_then_object_sets() {
    let mut fx = Fixture::new();
    let model = fx.quad_model();
    fx.objects.create_game_object().model = Some(model);
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.render(&fx.frame_info(1)).unwrap();

    let set_binds: Vec<(u32, vk::DescriptorSet)> = fx
      .recording
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        TestCall::BindDescriptorSet { set_index, set, .. } => Some((set_index, set)),
        _ => None,
      })
      .collect();
    assert_eq!(set_binds.len(), 2);
    assert_eq!(set_binds[0], (0, fx.globals.set(1)));
    assert_eq!(set_binds[1].0, 1);
  }

  #[test]
  fn object_set_has_all_material_bindings() {
    let mut fx = Fixture::new();
    let model = fx.quad_model();
    fx.objects.create_game_object().model = Some(model);
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.render(&fx.frame_info(0)).unwrap();

    let object_set = fx
      .recording
      .calls()
      .into_iter()
      .find_map(|c| match c {
        TestCall::BindDescriptorSet { set_index: 1, set, .. } => Some(set),
        _ => None,
      })
      .unwrap();
    let writes = fx.recording.descriptor_writes(object_set);
    let bindings: Vec<u32> = writes.iter().map(|w| w.binding()).collect();
    assert_eq!(bindings, (0..=7).collect::<Vec<u32>>());

    let (buffer, offset, range) = fx.objects.buffer_info(0, 0);
    assert_eq!(
      writes[0],
      BindableResource::Buffer {
        binding: 0,
        buffer,
        offset,
        range,
      }
    );
    // specular/irradiance/BRDF LUT fall back to metallic
    let metallic_view = fx.objects.get(0).unwrap().metallic_map.image_view();
    for w in &writes[4..] {
      match w {
        BindableResource::Texture { image_view, .. } => assert_eq!(*image_view, metallic_view),
        other => panic!("unexpected write {:?}", other),
      }
    }
  }

  #[test]
  fn pushes_object_transform() {
    let mut fx = Fixture::new();
    let model = fx.quad_model();
    let obj = fx.objects.create_game_object();
    obj.model = Some(model);
    obj.transform.translation = vec3(4.0, 5.0, 6.0);
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.render(&fx.frame_info(0)).unwrap();

    let (_, push) = fx.recording.draws_with_push_constants().remove(0);
    let push: ObjectBufferData = bytemuck::pod_read_unaligned(&push.unwrap());
    assert_eq!(push.model_matrix.w_axis.truncate(), vec3(4.0, 5.0, 6.0));
  }

  #[test]
  fn compute_dispatches_only_for_env_mapped_objects() {
    let mut fx = Fixture::new();
    let env = ImageData {
      width: 2,
      height: 2,
      pixels: vec![0u8; 16],
    };
    let env_map = Rc::new(VkTexture::storage_from_image_data(&fx.device, "env", &env).unwrap());
    fx.objects.create_game_object();
    fx.objects.create_game_object().env_map = Some(env_map);
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.compute(&fx.frame_info(0)).unwrap();

    let calls = fx.recording.calls();
    let dispatches: Vec<&TestCall> = calls
      .iter()
      .filter(|c| matches!(c, TestCall::Dispatch { .. }))
      .collect();
    assert_eq!(dispatches, vec![&TestCall::Dispatch { x: 32, y: 32, z: 1 }]);
    assert!(calls.iter().any(|c| matches!(
      c,
      TestCall::BindPipeline {
        bind_point: vk::PipelineBindPoint::COMPUTE,
        ..
      }
    )));
  }

  #[test]
  fn compute_without_env_maps_records_nothing() {
    let mut fx = Fixture::new();
    fx.objects.create_game_object();
    let system = create_system(&fx);
    fx.recording.clear_calls();

    system.compute(&fx.frame_info(0)).unwrap();

    assert!(fx.recording.calls().is_empty());
  }

  #[test]
  fn dropping_system_releases_pipelines_and_layouts() {
    let fx = Fixture::new();
    let before = fx.recording.live_object_count();
    let system = create_system(&fx);
    assert!(fx.recording.live_object_count() > before);
    drop(system);
    assert_eq!(fx.recording.live_object_count(), before);
  }
}
