use std::marker::{Send, Sync};

// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/choosing_memory_type.html

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VkMemoryPreference {
  /// Usage: depth/color attachments, sampled textures.
  GpuOnly,
  /// CPU-mapped memory that is read on GPU.
  /// Will be persistently mapped.
  ///
  /// Usage: uniform buffers, per-object buffers, small meshes.
  GpuMappable,
  /// Temporary allocation used when copying CPU data to GPU-only memory.
  /// No guarantee if it's CPU or GPU. Nor should you care.
  ///
  /// Will be persistently mapped.
  ScratchTransfer,
}

pub fn determine_gpu_allocation_info(
  memory_pref: &VkMemoryPreference,
) -> vma::AllocationCreateInfo {
  match memory_pref {
    VkMemoryPreference::GpuOnly => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      ..Default::default()
    },
    VkMemoryPreference::GpuMappable => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE
        | vma::AllocationCreateFlags::MAPPED,
      ..Default::default()
    },
    VkMemoryPreference::ScratchTransfer => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::Auto,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE
        | vma::AllocationCreateFlags::MAPPED,
      ..Default::default()
    },
  }
}

pub fn get_persistently_mapped_pointer(
  allocator: &vma::Allocator,
  allocation: &vma::Allocation,
) -> Option<MemoryMapPointer> {
  let alloc_info = allocator.get_allocation_info(allocation);
  let ptr = alloc_info.mapped_data;
  if ptr.is_null() {
    None
  } else {
    Some(MemoryMapPointer(ptr))
  }
}

/// Wrapper over a raw pointer to make it moveable and accessible from other threads
#[derive(Clone, Copy, Debug)]
pub struct MemoryMapPointer(pub *mut ::std::os::raw::c_void);
unsafe impl Send for MemoryMapPointer {}
unsafe impl Sync for MemoryMapPointer {}

impl MemoryMapPointer {
  /// Copy `bytes` at `offset`. Caller guarantees the mapped range is large enough.
  pub unsafe fn write(&self, offset: usize, bytes: &[u8]) {
    let dst = (self.0 as *mut u8).add(offset);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
  }
}
