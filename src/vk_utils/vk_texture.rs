use ash::prelude::VkResult;
use ash::vk;
use log::trace;

use super::BindableResource;
use crate::assets::ImageData;
use crate::vk_ctx::{GpuDeviceRef, GpuImage, ImageDesc};

fn create_texture_name(name: &str, width: u32, height: u32) -> String {
  format!("VkTexture({}, {}x{})", name, width, height)
}

/// Sampled image + its sampler. Shared between game objects through `Rc`,
/// released when the last owner drops it.
pub struct VkTexture {
  device: GpuDeviceRef,
  // For debugging
  name: String,
  pub image: GpuImage,
  pub sampler: vk::Sampler,
  /// Layout the image is kept in between frames
  pub layout: vk::ImageLayout,
}

impl VkTexture {
  /// Albedo/diffuse textures
  pub const COLOR_TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;
  /// Textures that contain raw data e.g. normal, roughness, metallic.
  pub const RAW_DATA_TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

  fn upload(
    device: &GpuDeviceRef,
    name: &str,
    image_data: &ImageData,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
    layout: vk::ImageLayout,
  ) -> VkResult<Self> {
    let expected_bytes = (image_data.width * image_data.height * 4) as usize;
    assert_eq!(
      image_data.pixels.len(),
      expected_bytes,
      "Texture '{}' expects RGBA8 pixels",
      name
    );

    let image = device.create_image(&ImageDesc {
      extent: vk::Extent2D {
        width: image_data.width,
        height: image_data.height,
      },
      format,
      usage: usage | vk::ImageUsageFlags::TRANSFER_DST,
      aspect: vk::ImageAspectFlags::COLOR,
    })?;
    // from here on the texture owns the image, so failures below release it
    let mut texture = Self {
      device: device.clone(),
      name: create_texture_name(name, image_data.width, image_data.height),
      image,
      sampler: vk::Sampler::null(),
      layout,
    };
    device.upload_image(&texture.image, &image_data.pixels, layout)?;
    texture.sampler = device.create_sampler()?;
    trace!("Created {}", texture.name);

    Ok(texture)
  }

  /// - format: usually `COLOR_TEXTURE_FORMAT` for diffuse, `RAW_DATA_TEXTURE_FORMAT` otherwise
  pub fn from_image_data(
    device: &GpuDeviceRef,
    name: &str,
    image_data: &ImageData,
    format: vk::Format,
  ) -> VkResult<Self> {
    VkTexture::upload(
      device,
      name,
      image_data,
      format,
      vk::ImageUsageFlags::SAMPLED,
      vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    )
  }

  /// Image that compute passes read and write (`imageLoad/imageStore`),
  /// kept in `GENERAL` layout.
  pub fn storage_from_image_data(
    device: &GpuDeviceRef,
    name: &str,
    image_data: &ImageData,
  ) -> VkResult<Self> {
    VkTexture::upload(
      device,
      name,
      image_data,
      VkTexture::RAW_DATA_TEXTURE_FORMAT,
      vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::STORAGE,
      vk::ImageLayout::GENERAL,
    )
  }

  /// 1x1 white pixel. Stands in for every map a game object did not get.
  pub fn default_white(device: &GpuDeviceRef) -> VkResult<Self> {
    let white = ImageData {
      width: 1,
      height: 1,
      pixels: vec![255u8; 4],
    };
    VkTexture::from_image_data(device, "default_white", &white, VkTexture::RAW_DATA_TEXTURE_FORMAT)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn image_view(&self) -> vk::ImageView {
    self.image.view
  }

  /// Sampled in shader as `sampler2D`
  pub fn descriptor(&self, binding: u32) -> BindableResource {
    BindableResource::Texture {
      binding,
      image_view: self.image.view,
      sampler: self.sampler,
      layout: self.layout,
    }
  }

  /// Bound as `image2D` for compute
  pub fn storage_descriptor(&self, binding: u32) -> BindableResource {
    assert_eq!(
      self.layout,
      vk::ImageLayout::GENERAL,
      "{} is not a storage image",
      self.name
    );
    BindableResource::StorageImage {
      binding,
      image_view: self.image.view,
    }
  }
}

impl Drop for VkTexture {
  fn drop(&mut self) {
    if self.sampler != vk::Sampler::null() {
      self.device.destroy_sampler(self.sampler);
    }
    self.device.destroy_image(&self.image);
  }
}
