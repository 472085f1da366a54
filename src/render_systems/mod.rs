use ash::vk;

use crate::error::{EngineResult, VkResultExt};
use crate::renderer::FrameInfo;
use crate::scene::{GameObject, ObjectBufferData};
use crate::vk_ctx::GpuDeviceRef;
use crate::vk_utils::{BindableResource, DescriptorSetLayout, DescriptorWriter};

mod basic_system;
mod mesh_system;
mod pbr_system;
mod point_light_system;
mod tonemap_system;

pub use self::basic_system::*;
pub use self::mesh_system::*;
pub use self::pbr_system::*;
pub use self::point_light_system::*;
pub use self::tonemap_system::*;

/// Records the draw commands of one kind of renderable into the current
/// frame's command buffer. Must not modify the scene.
pub trait RenderSystem {
  fn render(&self, frame: &FrameInfo) -> EngineResult<()>;
}

const SET_INDEX_GLOBAL: u32 = 0;
const SET_INDEX_OBJECT: u32 = 1;

/// Stages that see per-object push constants and set 1
const MESH_STAGES: vk::ShaderStageFlags = vk::ShaderStageFlags::from_raw(
  vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw(),
);

fn bind_global_set(device: &GpuDeviceRef, frame: &FrameInfo, layout: vk::PipelineLayout) {
  device.cmd_bind_descriptor_set(
    frame.command_buffer,
    vk::PipelineBindPoint::GRAPHICS,
    layout,
    SET_INDEX_GLOBAL,
    frame.global_descriptor_set,
  );
}

/// Binding 0 of set 1: the object's slot in this frame's object buffer
fn object_buffer_descriptor(frame: &FrameInfo, obj: &GameObject) -> BindableResource {
  let (buffer, offset, range) = frame.game_objects.buffer_info(frame.frame_index, obj.id());
  BindableResource::Buffer {
    binding: 0,
    buffer,
    offset,
    range,
  }
}

/// Shared loop of the mesh systems. For every object with a model: allocate
/// set 1 from the frame's pool (filled by `write_object_set`), push the
/// transform and draw. Objects without a model are skipped.
///
/// Expects the pipeline and the global set to be bound already.
fn draw_meshes<'a>(
  device: &GpuDeviceRef,
  frame: &'a FrameInfo,
  pipeline_layout: vk::PipelineLayout,
  object_layout: &'a DescriptorSetLayout,
  write_object_set: impl Fn(DescriptorWriter<'a>, &GameObject) -> DescriptorWriter<'a>,
) -> EngineResult<()> {
  let command_buffer = frame.command_buffer;

  for obj in frame.game_objects.iter() {
    let model = match &obj.model {
      Some(model) => model,
      None => continue,
    };

    let writer = DescriptorWriter::new(object_layout, frame.frame_pool)
      .write(object_buffer_descriptor(frame, obj));
    let object_set = write_object_set(writer, obj)
      .build()
      .context("vkAllocateDescriptorSets")?;
    device.cmd_bind_descriptor_set(
      command_buffer,
      vk::PipelineBindPoint::GRAPHICS,
      pipeline_layout,
      SET_INDEX_OBJECT,
      object_set,
    );

    let push = ObjectBufferData::from_transform(&obj.transform);
    device.cmd_push_constants(
      command_buffer,
      pipeline_layout,
      MESH_STAGES,
      bytemuck::bytes_of(&push),
    );

    model.bind(command_buffer);
    model.draw(command_buffer);
  }

  Ok(())
}
