use ash::prelude::VkResult;
use ash::vk;

/// Every material texture uses the same sampler setup: linear, repeat, no mips.
/// `max_anisotropy` of `None` disables anisotropic filtering.
pub unsafe fn create_sampler(
  device: &ash::Device,
  max_anisotropy: Option<f32>,
) -> VkResult<vk::Sampler> {
  let create_info = vk::SamplerCreateInfo::builder()
    .mag_filter(vk::Filter::LINEAR)
    .min_filter(vk::Filter::LINEAR)
    .address_mode_u(vk::SamplerAddressMode::REPEAT)
    .address_mode_v(vk::SamplerAddressMode::REPEAT)
    .address_mode_w(vk::SamplerAddressMode::REPEAT)
    .anisotropy_enable(max_anisotropy.is_some())
    .max_anisotropy(max_anisotropy.unwrap_or(1.0))
    .compare_enable(false)
    .compare_op(vk::CompareOp::ALWAYS)
    .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
    .unnormalized_coordinates(false) // address with [0, 1) instead of [0, tex_width)
    // mipmaps:
    .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
    .mip_lod_bias(0f32)
    .min_lod(0f32)
    .max_lod(0f32)
    .build();

  device.create_sampler(&create_info, None)
}
