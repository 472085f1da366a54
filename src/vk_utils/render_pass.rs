use ash;
use ash::prelude::VkResult;
use ash::vk;

/// Attachment indices in the main render pass (and in each framebuffer).
pub const ATTACHMENT_MAIN_COLOR: u32 = 0;
pub const ATTACHMENT_MAIN_DEPTH: u32 = 1;
pub const ATTACHMENT_SWAPCHAIN_COLOR: u32 = 2;

pub const SUBPASS_MAIN: u32 = 0;
pub const SUBPASS_TONEMAP: u32 = 1;

/// Owned description of a single subpass. `vk::SubpassDescription` only holds
/// pointers, so we keep the references here until the render pass is created.
#[derive(Clone, Debug, Default)]
pub struct SubpassLayout {
  pub input_attachments: Vec<vk::AttachmentReference>,
  pub color_attachments: Vec<vk::AttachmentReference>,
  pub depth_attachment: Option<vk::AttachmentReference>,
}

#[derive(Clone, Debug, Default)]
pub struct RenderPassLayout {
  pub attachments: Vec<vk::AttachmentDescription>,
  pub subpasses: Vec<SubpassLayout>,
  pub dependencies: Vec<vk::SubpassDependency>,
}

pub fn create_color_attachment(
  image_format: vk::Format,
  load_op: vk::AttachmentLoadOp,
  store_op: vk::AttachmentStoreOp,
  final_layout: vk::ImageLayout,
) -> vk::AttachmentDescription {
  vk::AttachmentDescription::builder()
    .format(image_format)
    .samples(vk::SampleCountFlags::TYPE_1) // single sampled
    .load_op(load_op)
    .store_op(store_op)
    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
    .initial_layout(vk::ImageLayout::UNDEFINED)
    .final_layout(final_layout)
    .build()
}

pub fn create_depth_stencil_attachment(image_format: vk::Format) -> vk::AttachmentDescription {
  vk::AttachmentDescription::builder()
    .format(image_format)
    .samples(vk::SampleCountFlags::TYPE_1)
    .load_op(vk::AttachmentLoadOp::CLEAR)
    .store_op(vk::AttachmentStoreOp::DONT_CARE) // depth is not needed after the pass
    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
    .initial_layout(vk::ImageLayout::UNDEFINED)
    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
    .build()
}

fn attachment_ref(attachment: u32, layout: vk::ImageLayout) -> vk::AttachmentReference {
  vk::AttachmentReference { attachment, layout }
}

/// Two subpasses:
/// 1. main: writes `ATTACHMENT_MAIN_COLOR` + `ATTACHMENT_MAIN_DEPTH`
/// 2. tonemap: reads `ATTACHMENT_MAIN_COLOR` as input attachment, writes `ATTACHMENT_SWAPCHAIN_COLOR`
pub fn main_and_tonemap_layout(
  color_format: vk::Format,
  depth_format: vk::Format,
) -> RenderPassLayout {
  let attachments = vec![
    create_color_attachment(
      color_format,
      vk::AttachmentLoadOp::CLEAR,
      vk::AttachmentStoreOp::STORE,
      vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    ),
    create_depth_stencil_attachment(depth_format),
    create_color_attachment(
      color_format,
      vk::AttachmentLoadOp::DONT_CARE, // every pixel is overwritten by tonemapping
      vk::AttachmentStoreOp::STORE,
      vk::ImageLayout::PRESENT_SRC_KHR,
    ),
  ];

  let main_pass = SubpassLayout {
    input_attachments: vec![],
    color_attachments: vec![attachment_ref(
      ATTACHMENT_MAIN_COLOR,
      vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    )],
    depth_attachment: Some(attachment_ref(
      ATTACHMENT_MAIN_DEPTH,
      vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    )),
  };
  let tonemap_pass = SubpassLayout {
    input_attachments: vec![attachment_ref(
      ATTACHMENT_MAIN_COLOR,
      vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    )],
    color_attachments: vec![attachment_ref(
      ATTACHMENT_SWAPCHAIN_COLOR,
      vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    )],
    depth_attachment: None,
  };

  // attachment writes have to wait for the acquire semaphore (which waits on COLOR_ATTACHMENT_OUTPUT)
  let acquire_dependency = vk::SubpassDependency::builder()
    .src_subpass(vk::SUBPASS_EXTERNAL)
    .dst_subpass(SUBPASS_MAIN)
    .src_stage_mask(
      vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
    )
    .src_access_mask(vk::AccessFlags::empty())
    .dst_stage_mask(
      vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
    )
    .dst_access_mask(
      vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
    )
    .build();

  // main pass color writes -> tonemap fragment reads, per pixel
  let tonemap_dependency = vk::SubpassDependency::builder()
    .src_subpass(SUBPASS_MAIN)
    .dst_subpass(SUBPASS_TONEMAP)
    .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
    .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
    .dst_access_mask(vk::AccessFlags::SHADER_READ)
    .dependency_flags(vk::DependencyFlags::BY_REGION)
    .build();

  RenderPassLayout {
    attachments,
    subpasses: vec![main_pass, tonemap_pass],
    dependencies: vec![acquire_dependency, tonemap_dependency],
  }
}

pub unsafe fn create_render_pass_from_layout(
  device: &ash::Device,
  layout: &RenderPassLayout,
) -> VkResult<vk::RenderPass> {
  // `layout` outlives this fn, so the pointers inside `vk::SubpassDescription` stay valid
  let subpasses: Vec<vk::SubpassDescription> = layout
    .subpasses
    .iter()
    .map(|subpass| {
      let mut builder = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .input_attachments(&subpass.input_attachments)
        .color_attachments(&subpass.color_attachments);
      if let Some(depth) = subpass.depth_attachment.as_ref() {
        builder = builder.depth_stencil_attachment(depth);
      }
      builder.build()
    })
    .collect();

  let create_info = vk::RenderPassCreateInfo::builder()
    .attachments(&layout.attachments)
    .subpasses(&subpasses)
    .dependencies(&layout.dependencies)
    .build();
  device.create_render_pass(&create_info, None)
}
