use log::{info, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::os::raw::c_char;

use ash;
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain};
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle};

use super::VkCtx;
use crate::error::{EngineError, EngineResult, VkResultExt};
use crate::vk_utils::debug::setup_debug_reporting;

fn from_c_str<'a>(s: &[c_char]) -> &'a CStr {
  unsafe { CStr::from_ptr(s.as_ptr()) }
}

fn get_app_version() -> u32 {
  let to_u32 = |s: &str| s.parse::<u32>().unwrap_or(0);
  vk::make_api_version(
    0,
    to_u32(env!("CARGO_PKG_VERSION_MAJOR")),
    to_u32(env!("CARGO_PKG_VERSION_MINOR")),
    to_u32(env!("CARGO_PKG_VERSION_PATCH")),
  )
}

fn get_layer_names(graphics_debugging: bool) -> Vec<&'static CStr> {
  let mut layer_names = Vec::new();
  if graphics_debugging {
    layer_names.push(unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") });
  }
  layer_names
}

fn get_extension_names(
  display_handle: RawDisplayHandle,
  graphics_debugging: bool,
) -> EngineResult<Vec<*const c_char>> {
  // platform surface extensions (Win32/Xlib/Wayland/Metal...)
  let mut names = ash_window::enumerate_required_extensions(display_handle)
    .context("vkEnumerateInstanceExtensionProperties")?
    .to_vec();
  if graphics_debugging {
    names.push(DebugUtils::name().as_ptr());
  }
  Ok(names)
}

pub fn create_instance(
  entry: &ash::Entry,
  display_handle: RawDisplayHandle,
  graphics_debugging: bool,
) -> EngineResult<ash::Instance> {
  let app_name = CString::new(env!("CARGO_PKG_NAME")).unwrap_or_default();

  let app_info = vk::ApplicationInfo::builder()
    .application_name(&app_name)
    .application_version(get_app_version())
    .engine_name(&app_name)
    .api_version(vk::make_api_version(0, 1, 2, 0))
    .build();

  let layers_names_raw: Vec<*const c_char> = get_layer_names(graphics_debugging)
    .iter()
    .map(|raw_name| raw_name.as_ptr())
    .collect();
  let extension_names_raw = get_extension_names(display_handle, graphics_debugging)?;

  let create_info = vk::InstanceCreateInfo::builder()
    .application_info(&app_info)
    .enabled_layer_names(&layers_names_raw)
    .enabled_extension_names(&extension_names_raw)
    .build();

  let instance = unsafe { entry.create_instance(&create_info, None) }.context("vkCreateInstance")?;
  trace!("Ash instance created");
  Ok(instance)
}

fn find_queue_family(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> Option<u32> {
  let q_props = unsafe { instance.get_physical_device_queue_family_properties(phys_device) };

  q_props.iter().enumerate().find_map(|(index, q)| {
    let index = index as u32;
    // compute is needed for the irradiance pass
    let is_gfx = q.queue_flags.contains(vk::QueueFlags::GRAPHICS)
      && q.queue_flags.contains(vk::QueueFlags::COMPUTE);
    let is_present_support = unsafe {
      surface_loader
        .get_physical_device_surface_support(phys_device, index, surface_khr)
        .unwrap_or(false)
    };

    if is_gfx && is_present_support {
      Some(index)
    } else {
      None
    }
  })
}

/// Picks physical device e.g. "GeForce GTX 1050 Ti" and graphic queue family index.
/// Same queue will also be used to present result. Discrete GPUs are preferred.
pub fn pick_physical_device_and_queue_family_idx(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
) -> EngineResult<(vk::PhysicalDevice, u32)> {
  let phys_devices =
    unsafe { instance.enumerate_physical_devices() }.context("vkEnumeratePhysicalDevices")?;
  trace!("Found {} physical devices", phys_devices.len());

  // list of devices that satisfy our conditions
  let mut candidates: Vec<(vk::PhysicalDevice, u32, bool)> = phys_devices
    .iter()
    .filter_map(|&phys_device| {
      let props = unsafe { instance.get_physical_device_properties(phys_device) };
      let features = unsafe { instance.get_physical_device_features(phys_device) };
      if features.sampler_anisotropy == vk::FALSE {
        return None;
      }
      let is_discrete = props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
      find_queue_family(instance, surface_loader, surface_khr, phys_device)
        .map(|idx| (phys_device, idx, is_discrete))
    })
    .collect();
  // discrete first, keep enumeration order otherwise
  candidates.sort_by_key(|(_, _, is_discrete)| !is_discrete);

  match candidates.first() {
    None => Err(EngineError::NoSuitableDevice),
    Some(&(p_device, idx, _)) => {
      let props = unsafe { instance.get_physical_device_properties(p_device) };
      let device_name = from_c_str(&props.device_name);
      info!("Using physical device: {:?}", device_name);
      Ok((p_device, idx))
    }
  }
}

/// Pick logical device
pub fn pick_device_and_queue(
  instance: &ash::Instance,
  phys_device: vk::PhysicalDevice,
  queue_family_index: u32,
) -> EngineResult<(ash::Device, vk::Queue)> {
  trace!("Will pick logical device");
  let queue_prio = [1.0f32]; // only one queue
  let queue_create_infos = [vk::DeviceQueueCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .queue_priorities(&queue_prio)
    .build()];

  let device_extension_names_raw = [Swapchain::name().as_ptr()];
  let features = vk::PhysicalDeviceFeatures {
    sampler_anisotropy: vk::TRUE,
    ..Default::default()
  };

  let device_create_info = vk::DeviceCreateInfo::builder()
    .queue_create_infos(&queue_create_infos)
    .enabled_extension_names(&device_extension_names_raw)
    .enabled_features(&features)
    .build();

  let device: ash::Device = unsafe { instance.create_device(phys_device, &device_create_info, None) }
    .context("vkCreateDevice")?;
  trace!("Logical device selected");

  let queue = unsafe { device.get_device_queue(queue_family_index, 0) }; // only one queue created above
  trace!("Queue on logical device selected");

  Ok((device, queue))
}

pub fn create_command_pool(device: &ash::Device, queue_family_index: u32) -> EngineResult<vk::CommandPool> {
  let pool_create_info = vk::CommandPoolCreateInfo::builder()
    // each frame re-records its command buffer
    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
    .queue_family_index(queue_family_index)
    .build();
  unsafe { device.create_command_pool(&pool_create_info, None) }.context("vkCreateCommandPool")
}

/// Bootstrap everything below the swapchain: instance, surface, device,
/// queue, command pool and memory allocator.
// https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L332
pub fn vk_ctx_initialize(
  window: &(impl HasRawWindowHandle + HasRawDisplayHandle),
  graphics_debugging: bool,
) -> EngineResult<VkCtx> {
  let entry = unsafe { ash::Entry::load()? };
  let display_handle = window.raw_display_handle();
  let instance = create_instance(&entry, display_handle, graphics_debugging)?;
  let debug_utils = if graphics_debugging {
    Some(setup_debug_reporting(&entry, &instance).context("vkCreateDebugUtilsMessengerEXT")?)
  } else {
    None
  };

  // surface data
  let surface_loader = Surface::new(&entry, &instance);
  let surface_khr = unsafe {
    ash_window::create_surface(
      &entry,
      &instance,
      display_handle,
      window.raw_window_handle(),
      None,
    )
  }
  .context("vkCreateSurfaceKHR")?;

  // devices
  let (phys_device, queue_family_index) =
    pick_physical_device_and_queue_family_idx(&instance, &surface_loader, surface_khr)?;
  let (device, queue) = pick_device_and_queue(&instance, phys_device, queue_family_index)?;
  let properties = unsafe { instance.get_physical_device_properties(phys_device) };
  let swapchain_loader = Swapchain::new(&instance, &device);

  // command buffers
  let command_pool = create_command_pool(&device, queue_family_index)?;
  let setup_cmd_buf_info = vk::CommandBufferAllocateInfo::builder()
    .command_buffer_count(1)
    .command_pool(command_pool)
    .level(vk::CommandBufferLevel::PRIMARY)
    .build();
  let setup_cmd_buf = unsafe { device.allocate_command_buffers(&setup_cmd_buf_info) }
    .context("vkAllocateCommandBuffers")?
    .first()
    .copied()
    .ok_or(EngineError::Vulkan {
      call: "vkAllocateCommandBuffers",
      result: vk::Result::ERROR_UNKNOWN,
    })?;

  // gpu memory allocator
  let allocator_create_info = vma::AllocatorCreateInfo::new(&instance, &device, phys_device);
  #[allow(unused_unsafe)]
  let allocator = unsafe { vma::Allocator::new(allocator_create_info) }.context("vmaCreateAllocator")?;

  Ok(VkCtx {
    entry,
    instance,
    device,
    phys_device,
    queue_family_index,
    queue,
    command_pool,
    setup_cmd_buf,
    allocator: ManuallyDrop::new(allocator),
    limits: properties.limits,
    surface_loader,
    surface_khr,
    swapchain_loader,
    debug_utils,
    buffer_allocations: RefCell::new(HashMap::new()),
    image_allocations: RefCell::new(HashMap::new()),
  })
}
