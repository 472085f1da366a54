use log::{info, trace};

use ash::vk;

use crate::vk_ctx::SurfaceSupport;

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
  vk::Format::D32_SFLOAT,
  vk::Format::D32_SFLOAT_S8_UINT,
  vk::Format::D24_UNORM_S8_UINT,
];

/// Used both for swapchain and the attachments that are rendered in the main pass.
pub const SWAPCHAIN_IMAGE_USAGE: vk::ImageUsageFlags = vk::ImageUsageFlags::from_raw(
  vk::ImageUsageFlags::COLOR_ATTACHMENT.as_raw() | vk::ImageUsageFlags::INPUT_ATTACHMENT.as_raw(),
);

pub fn size_to_rect_vk(size: &vk::Extent2D) -> vk::Rect2D {
  vk::Rect2D {
    offset: vk::Offset2D { x: 0, y: 0 },
    extent: *size,
  }
}

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkSurfaceFormatKHR.html
///
/// Prefer `B8G8R8A8_SRGB` + `SRGB_NONLINEAR`, otherwise whatever is listed first.
pub fn get_swapchain_format(
  surface_formats: &[vk::SurfaceFormatKHR],
) -> Option<vk::SurfaceFormatKHR> {
  let preferred = surface_formats.iter().find(|surface_fmt| {
    let fmt_ok = surface_fmt.format == vk::Format::B8G8R8A8_SRGB;
    let color_space_ok = surface_fmt.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR;
    fmt_ok && color_space_ok
  });

  preferred.or(surface_formats.first()).map(|x| x.to_owned())
}

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPresentModeKHR.html
///
/// Mailbox never blocks the GPU, but it's not supported everywhere.
/// FIFO is vsync-locked and guaranteed to exist.
pub fn get_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
  if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
    info!("Present mode: Mailbox");
    vk::PresentModeKHR::MAILBOX
  } else {
    info!("Present mode: V-Sync");
    vk::PresentModeKHR::FIFO
  }
}

/// Surface decides the extent unless it reports `u32::MAX`, then we clamp the window size.
pub fn get_swapchain_extent(
  capabilities: &vk::SurfaceCapabilitiesKHR,
  window_extent: vk::Extent2D,
) -> vk::Extent2D {
  if capabilities.current_extent.width != u32::MAX {
    return capabilities.current_extent;
  }

  let min = capabilities.min_image_extent;
  let max = capabilities.max_image_extent;
  vk::Extent2D {
    width: window_extent.width.clamp(min.width, max.width),
    height: window_extent.height.clamp(min.height, max.height),
  }
}

/// `min + 1`, so we do not have to wait on the driver. `max == 0` means no limit.
pub fn get_swapchain_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
  let image_count = capabilities.min_image_count + 1;
  if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
    capabilities.max_image_count
  } else {
    image_count
  }
}

/// Everything we decided about the swapchain before asking the device to create it
#[derive(Clone, Copy, Debug)]
pub struct SwapchainChoice {
  pub surface_format: vk::SurfaceFormatKHR,
  pub present_mode: vk::PresentModeKHR,
  pub extent: vk::Extent2D,
  pub image_count: u32,
  pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

pub fn choose_swapchain_settings(
  support: &SurfaceSupport,
  window_extent: vk::Extent2D,
) -> Option<SwapchainChoice> {
  let caps = &support.capabilities;
  trace!("Surface capabilities {:?}", caps);

  let surface_format = get_swapchain_format(&support.formats)?;
  Some(SwapchainChoice {
    surface_format,
    present_mode: get_present_mode(&support.present_modes),
    extent: get_swapchain_extent(caps, window_extent),
    image_count: get_swapchain_image_count(caps),
    pre_transform: caps.current_transform,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn caps(min: u32, max: u32, current: vk::Extent2D) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
      min_image_count: min,
      max_image_count: max,
      current_extent: current,
      min_image_extent: vk::Extent2D {
        width: 16,
        height: 16,
      },
      max_image_extent: vk::Extent2D {
        width: 1920,
        height: 1080,
      },
      ..Default::default()
    }
  }

  fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
      format,
      color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
  }

  #[test]
  fn prefers_srgb_bgra_format() {
    let formats = [
      surface_format(vk::Format::R8G8B8A8_UNORM),
      surface_format(vk::Format::B8G8R8A8_SRGB),
    ];
    let chosen = get_swapchain_format(&formats).unwrap();
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
  }

  #[test]
  fn falls_back_to_first_format() {
    let formats = [
      surface_format(vk::Format::R8G8B8A8_UNORM),
      surface_format(vk::Format::A2B10G10R10_UNORM_PACK32),
    ];
    let chosen = get_swapchain_format(&formats).unwrap();
    assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    assert!(get_swapchain_format(&[]).is_none());
  }

  #[test]
  fn present_mode_mailbox_else_fifo() {
    let with_mailbox = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
    assert_eq!(get_present_mode(&with_mailbox), vk::PresentModeKHR::MAILBOX);
    let without = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
    assert_eq!(get_present_mode(&without), vk::PresentModeKHR::FIFO);
  }

  #[test]
  fn extent_uses_surface_extent_when_defined() {
    let current = vk::Extent2D {
      width: 800,
      height: 600,
    };
    let window = vk::Extent2D {
      width: 1,
      height: 1,
    };
    assert_eq!(get_swapchain_extent(&caps(2, 3, current), window), current);
  }

  #[test]
  fn extent_clamps_window_when_surface_undefined() {
    let undefined = vk::Extent2D {
      width: u32::MAX,
      height: u32::MAX,
    };
    let window = vk::Extent2D {
      width: 4000,
      height: 8,
    };
    let extent = get_swapchain_extent(&caps(2, 3, undefined), window);
    assert_eq!(extent.width, 1920);
    assert_eq!(extent.height, 16);
  }

  #[test]
  fn image_count_is_min_plus_one_clamped() {
    let any = vk::Extent2D::default();
    assert_eq!(get_swapchain_image_count(&caps(2, 0, any)), 3);
    assert_eq!(get_swapchain_image_count(&caps(2, 8, any)), 3);
    assert_eq!(get_swapchain_image_count(&caps(3, 3, any)), 3);
  }
}
