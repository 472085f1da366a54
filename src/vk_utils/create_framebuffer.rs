use ash::prelude::VkResult;
use ash::vk;

/// Each attachment is a separate `vk::ImageView`, in render pass attachment order
pub unsafe fn create_framebuffer(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  image_views: &[vk::ImageView],
  size: &vk::Extent2D,
) -> VkResult<vk::Framebuffer> {
  let create_info = vk::FramebufferCreateInfo::builder()
    .render_pass(render_pass)
    .attachments(image_views)
    .width(size.width)
    .height(size.height)
    .layers(1)
    .build();
  device.create_framebuffer(&create_info, None)
}
